//! Node lifecycle flows

pub mod nodes;
