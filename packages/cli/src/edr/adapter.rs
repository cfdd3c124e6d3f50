//! EDR Adapter Trait
//!
//! The surface of the incumbent EDR platform the migration relies on.
//! `Ok(None)` means the platform answered but did not grant the resource
//! (denied session, rejected upload); transport failures surface as errors.

use anyhow::Result;
use async_trait::async_trait;

use crate::edr::protocol::CommandRequest;

#[async_trait]
pub trait EdrAdapter: Send + Sync {
    /// Resolve the display name of a device.
    async fn device_name(&self, device_id: u64) -> Result<Option<String>>;

    /// Open a live-response session to a device.
    async fn start_session(&self, device_id: u64) -> Result<Option<String>>;

    /// Upload file contents into an open session.
    async fn upload_file(&self, session_id: &str, data: Vec<u8>) -> Result<Option<String>>;

    /// Issue a live-response command, returning its command id.
    async fn issue_command(
        &self,
        session_id: &str,
        request: CommandRequest,
    ) -> Result<Option<u64>>;

    /// Whether a previously issued command has completed.
    async fn command_complete(&self, session_id: &str, command_id: u64) -> Result<bool>;

    /// Batch-uninstall the platform's own sensor from the given devices.
    async fn uninstall_sensors(&self, device_ids: &[u64]) -> Result<()>;
}
