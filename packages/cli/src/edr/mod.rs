//! EDR Platform Integration
//!
//! Adapter trait, wire payloads and the HTTP client for the incumbent
//! EDR platform's device and live-response APIs.

pub mod adapter;
pub mod client;
pub mod protocol;
