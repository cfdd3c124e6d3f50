//! Live-Response Wire Payloads
//!
//! Request and response bodies exchanged with the EDR platform's device
//! and live-response endpoints.

use serde::{Deserialize, Serialize};

/// Body for opening a live-response session.
#[derive(Debug, Clone, Serialize)]
pub struct StartSessionRequest {
    pub device_id: u64,
}

/// Session creation response; `id` is absent when no session was granted.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub id: Option<String>,
}

/// Device record; only the display name is consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceResponse {
    pub name: Option<String>,
}

/// Response to uploading a file into a session.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub id: Option<String>,
}

/// Live-response command request, dispatched on the platform's `name` tag.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "name")]
pub enum CommandRequest {
    /// Copy a previously uploaded file onto the device filesystem.
    #[serde(rename = "put file")]
    PutFile { path: String, file_id: String },

    /// Launch a process on the device, output redirected to a remote file.
    #[serde(rename = "create process")]
    CreateProcess { path: String, output_file: String },
}

/// Response to issuing or polling a command.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandResponse {
    pub id: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Status value the platform reports for a finished command.
pub const COMMAND_COMPLETE: &str = "COMPLETE";

/// Device action request for sensor management.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceActionRequest {
    pub action_type: String,
    pub device_id: Vec<u64>,
}

impl DeviceActionRequest {
    /// Batch sensor uninstall action.
    pub fn uninstall(device_ids: &[u64]) -> Self {
        Self {
            action_type: "UNINSTALL_SENSOR".to_string(),
            device_id: device_ids.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_file_wire_format() {
        let request = CommandRequest::PutFile {
            path: "c:\\temp\\agent_install.ps1".to_string(),
            file_id: "file-123".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "name": "put file",
                "path": "c:\\temp\\agent_install.ps1",
                "file_id": "file-123",
            })
        );
    }

    #[test]
    fn test_create_process_wire_format() {
        let request = CommandRequest::CreateProcess {
            path: "powershell.exe -File c:\\temp\\agent_install.ps1".to_string(),
            output_file: "c:\\temp\\install.log".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "name": "create process",
                "path": "powershell.exe -File c:\\temp\\agent_install.ps1",
                "output_file": "c:\\temp\\install.log",
            })
        );
    }

    #[test]
    fn test_uninstall_action_wire_format() {
        let request = DeviceActionRequest::uninstall(&[101, 102]);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "action_type": "UNINSTALL_SENSOR",
                "device_id": [101, 102],
            })
        );
    }
}
