//! Salt event stream subscription

pub mod stream;
