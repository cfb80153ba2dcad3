//! Test helpers for settings-sync.

#![allow(dead_code, unused_imports)]

pub mod fixtures;
pub mod transport;

pub use fixtures::*;
pub use transport::MockTransport;
