//! Deployment Status Ladder
//!
//! The fixed status vocabulary recorded in the progress log. Each label
//! names the furthest step a device reached; a device only ever moves
//! forward through the ladder within one run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-device deployment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStatus {
    /// Live-response session granted.
    SessionStarted,
    /// Platform refused or failed to open a session.
    SessionAttemptFailed,
    /// Installer accepted into the session.
    FileUploadAttempted,
    /// Installer upload rejected.
    FileUploadFailed,
    /// Placement command observed complete on the device.
    PutFileAttempted,
    /// Placement command failed or never completed within the poll budget.
    PutFileFailed,
    /// Installer process launched; the install itself is fire-and-forget.
    InstallProcessStarted,
    /// Launch command rejected.
    InstallProcessFailed,
}

impl DeployStatus {
    /// The exact label written to the progress log.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployStatus::SessionStarted => "session_started",
            DeployStatus::SessionAttemptFailed => "session_attempt_failed",
            DeployStatus::FileUploadAttempted => "file_upload_attempted",
            DeployStatus::FileUploadFailed => "file_upload_failed",
            DeployStatus::PutFileAttempted => "put_file_attempted",
            DeployStatus::PutFileFailed => "put_file_failed",
            DeployStatus::InstallProcessStarted => "install_process_started",
            DeployStatus::InstallProcessFailed => "install_process_failed",
        }
    }

    /// Whether this status halted the device's workflow.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            DeployStatus::SessionAttemptFailed
                | DeployStatus::FileUploadFailed
                | DeployStatus::PutFileFailed
                | DeployStatus::InstallProcessFailed
        )
    }
}

impl std::fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a progress log carries an unknown status label.
#[derive(Debug, Error)]
#[error("unknown deployment status: {0}")]
pub struct ParseStatusError(String);

impl std::str::FromStr for DeployStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session_started" => Ok(DeployStatus::SessionStarted),
            "session_attempt_failed" => Ok(DeployStatus::SessionAttemptFailed),
            "file_upload_attempted" => Ok(DeployStatus::FileUploadAttempted),
            "file_upload_failed" => Ok(DeployStatus::FileUploadFailed),
            "put_file_attempted" => Ok(DeployStatus::PutFileAttempted),
            "put_file_failed" => Ok(DeployStatus::PutFileFailed),
            "install_process_started" => Ok(DeployStatus::InstallProcessStarted),
            "install_process_failed" => Ok(DeployStatus::InstallProcessFailed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}
