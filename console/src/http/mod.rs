//! HTTP clients for the cluster and Salt APIs

pub mod client;
pub mod nodes;
pub mod salt;
