//! Wire and view models

pub mod event;
pub mod job;
pub mod node;
