//! Destination Console Integration
//!
//! Adapter trait and HTTP client for the console the fleet migrates to.

pub mod adapter;
pub mod client;
