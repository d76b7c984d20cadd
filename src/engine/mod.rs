pub mod assignment;
pub mod directory;
pub mod lifecycle;
pub mod queue;
pub mod sync;
