//! Third-party collaborators the dispatch engine talks to.

pub mod notify;
pub mod payment;
