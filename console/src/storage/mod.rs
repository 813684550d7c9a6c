//! Local durable storage

pub mod layout;
pub mod ledger;
pub mod settings;
