//! Destination Console Adapter Trait
//!
//! Lookup surface of the destination console, used to confirm that a host
//! checked in after installation before the old sensor is removed.

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ConsoleAdapter: Send + Sync {
    /// Whether any computer matching `hostname` is registered.
    async fn host_registered(&self, hostname: &str) -> Result<bool>;
}
