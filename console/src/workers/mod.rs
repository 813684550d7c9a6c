//! Background workers for daemon mode

pub mod poller;
pub mod watcher;
