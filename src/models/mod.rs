pub mod assignment;
pub mod center;
pub mod event;
pub mod location;
pub mod order;
pub mod page;
pub mod user;
pub mod vehicle;
