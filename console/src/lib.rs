//! Quarry Console Library
//!
//! Core modules for the Quarry storage platform console agent.

pub mod app;
pub mod errors;
pub mod events;
pub mod filesys;
pub mod flows;
pub mod http;
pub mod logs;
pub mod models;
pub mod nav;
pub mod notify;
pub mod session;
pub mod state;
pub mod storage;
pub mod utils;
pub mod workers;
