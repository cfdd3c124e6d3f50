//! Install Workflow
//!
//! Drives the five-step install sequence for one device and reports the
//! furthest status reached. The batch driver runs the sequence across a
//! fleet in two phases so the platform's upload propagation delay is paid
//! once instead of once per device.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Tuning;
use crate::edr::adapter::EdrAdapter;
use crate::edr::protocol::CommandRequest;
use crate::workflow::status::DeployStatus;

/// Result of one device's run through the workflow.
#[derive(Debug, Clone)]
pub struct DeviceOutcome {
    pub device_id: u64,
    pub device_name: Option<String>,
    pub status: DeployStatus,
    pub session_id: Option<String>,
    pub file_id: Option<String>,
}

/// Per-device install workflow over an [`EdrAdapter`].
pub struct DeviceWorkflow<'a, E: EdrAdapter> {
    api: &'a E,
    tuning: &'a Tuning,
}

impl<'a, E: EdrAdapter> DeviceWorkflow<'a, E> {
    pub fn new(api: &'a E, tuning: &'a Tuning) -> Self {
        Self { api, tuning }
    }

    /// Phase one: resolve the device name, open a live-response session
    /// and upload the rendered installer. Halts the device at the first
    /// failed step.
    pub async fn acquire_and_upload(&self, device_id: u64, installer: &[u8]) -> DeviceOutcome {
        // Step 1: resolve the display name; lookup failure leaves it blank.
        let device_name = match self.api.device_name(device_id).await {
            Ok(name) => name,
            Err(e) => {
                warn!(device_id, error = %e, "Device lookup failed");
                None
            }
        };

        let mut outcome = DeviceOutcome {
            device_id,
            device_name,
            status: DeployStatus::SessionAttemptFailed,
            session_id: None,
            file_id: None,
        };

        // Step 2: acquire a live-response session.
        let session_id = match self.api.start_session(device_id).await {
            Ok(id) => id,
            Err(e) => {
                warn!(device_id, error = %e, "Session request failed");
                None
            }
        };
        let Some(session_id) = session_id else {
            info!(device_id, status = %outcome.status, "Halting device");
            return outcome;
        };
        outcome.status = DeployStatus::SessionStarted;
        outcome.session_id = Some(session_id.clone());
        debug!(device_id, session_id = %session_id, "Session started");

        // Step 3: upload the installer into the session.
        let file_id = match self.api.upload_file(&session_id, installer.to_vec()).await {
            Ok(id) => id,
            Err(e) => {
                warn!(device_id, error = %e, "Installer upload failed");
                None
            }
        };
        match file_id {
            Some(id) => {
                debug!(device_id, file_id = %id, "Installer uploaded");
                outcome.status = DeployStatus::FileUploadAttempted;
                outcome.file_id = Some(id);
            }
            None => {
                outcome.status = DeployStatus::FileUploadFailed;
                info!(device_id, status = %outcome.status, "Halting device");
            }
        }

        outcome
    }

    /// Phase two: place the uploaded installer at its target path and
    /// launch it. Only devices whose upload went through are eligible;
    /// anything else passes through untouched.
    pub async fn place_and_execute(&self, outcome: &mut DeviceOutcome) {
        if outcome.status != DeployStatus::FileUploadAttempted {
            return;
        }
        let (Some(session_id), Some(file_id)) =
            (outcome.session_id.clone(), outcome.file_id.clone())
        else {
            return;
        };

        // Step 4: copy the file onto the device, then poll the command
        // until it reports complete or the budget runs out.
        let request = CommandRequest::PutFile {
            path: self.tuning.remote_script_path.clone(),
            file_id,
        };
        let command_id = match self.api.issue_command(&session_id, request).await {
            Ok(id) => id,
            Err(e) => {
                warn!(device_id = outcome.device_id, error = %e, "Placement command failed");
                None
            }
        };
        let placed = match command_id {
            Some(command_id) => {
                self.tuning
                    .poll_policy()
                    .run(|| self.api.command_complete(&session_id, command_id))
                    .await
            }
            None => false,
        };
        if !placed {
            outcome.status = DeployStatus::PutFileFailed;
            info!(device_id = outcome.device_id, status = %outcome.status, "Halting device");
            return;
        }
        outcome.status = DeployStatus::PutFileAttempted;
        debug!(device_id = outcome.device_id, "Installer placed");

        // Step 5: launch the installer. The install itself is
        // fire-and-forget; only the launch is verified.
        let request = CommandRequest::CreateProcess {
            path: self.tuning.exec_command(),
            output_file: self.tuning.remote_output_log.clone(),
        };
        let process_id = match self.api.issue_command(&session_id, request).await {
            Ok(id) => id,
            Err(e) => {
                warn!(device_id = outcome.device_id, error = %e, "Launch command failed");
                None
            }
        };
        outcome.status = if process_id.is_some() {
            DeployStatus::InstallProcessStarted
        } else {
            DeployStatus::InstallProcessFailed
        };
        info!(device_id = outcome.device_id, status = %outcome.status, "Device workflow finished");
    }
}

/// Run the install workflow across a fleet.
///
/// Phase one opens sessions and uploads the installer for every device,
/// then a single propagation pause lets the platform finish distributing
/// the uploads before phase two places and launches them. Outcomes come
/// back in input order, one per device, each carrying its terminal status.
pub async fn run_batch<E: EdrAdapter>(
    api: &E,
    device_ids: &[u64],
    installer: &[u8],
    tuning: &Tuning,
) -> Vec<DeviceOutcome> {
    let workflow = DeviceWorkflow::new(api, tuning);

    let mut outcomes = Vec::with_capacity(device_ids.len());
    for &device_id in device_ids {
        info!(device_id, "Starting device workflow");
        outcomes.push(workflow.acquire_and_upload(device_id, installer).await);
    }

    let uploads = outcomes
        .iter()
        .filter(|o| o.status == DeployStatus::FileUploadAttempted)
        .count();
    if uploads > 0 {
        info!(
            uploads,
            delay_secs = tuning.propagation_delay_secs,
            "Uploads submitted, waiting for propagation"
        );
        tokio::time::sleep(Duration::from_secs(tuning.propagation_delay_secs)).await;
    }

    for outcome in &mut outcomes {
        workflow.place_and_execute(outcome).await;
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Scripted platform double; records every call in order.
    #[derive(Default)]
    struct MockEdr {
        deny_session: Vec<u64>,
        deny_upload: bool,
        deny_put: bool,
        deny_process: bool,
        /// Status checks answered "not yet" before reporting complete.
        pending_checks: u32,
        status_checks: AtomicU32,
        calls: Mutex<Vec<String>>,
    }

    impl MockEdr {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EdrAdapter for MockEdr {
        async fn device_name(&self, device_id: u64) -> Result<Option<String>> {
            self.record(format!("name:{device_id}"));
            Ok(Some(format!("CORP\\host{device_id}")))
        }

        async fn start_session(&self, device_id: u64) -> Result<Option<String>> {
            self.record(format!("session:{device_id}"));
            if self.deny_session.contains(&device_id) {
                return Ok(None);
            }
            Ok(Some(format!("1:{device_id}")))
        }

        async fn upload_file(&self, session_id: &str, _data: Vec<u8>) -> Result<Option<String>> {
            self.record(format!("upload:{session_id}"));
            if self.deny_upload {
                return Ok(None);
            }
            Ok(Some("file-1".to_string()))
        }

        async fn issue_command(
            &self,
            session_id: &str,
            request: CommandRequest,
        ) -> Result<Option<u64>> {
            match request {
                CommandRequest::PutFile { .. } => {
                    self.record(format!("put:{session_id}"));
                    if self.deny_put {
                        return Ok(None);
                    }
                    Ok(Some(1))
                }
                CommandRequest::CreateProcess { .. } => {
                    self.record(format!("exec:{session_id}"));
                    if self.deny_process {
                        return Ok(None);
                    }
                    Ok(Some(2))
                }
            }
        }

        async fn command_complete(&self, _session_id: &str, _command_id: u64) -> Result<bool> {
            let seen = self.status_checks.fetch_add(1, Ordering::SeqCst);
            Ok(seen >= self.pending_checks)
        }

        async fn uninstall_sensors(&self, device_ids: &[u64]) -> Result<()> {
            self.record(format!("uninstall:{device_ids:?}"));
            Ok(())
        }
    }

    fn fast_tuning() -> Tuning {
        Tuning {
            poll_interval_secs: 0,
            propagation_delay_secs: 0,
            ..Tuning::default()
        }
    }

    #[tokio::test]
    async fn test_session_failure_short_circuits() {
        let api = MockEdr {
            deny_session: vec![7],
            ..MockEdr::default()
        };

        let outcomes = run_batch(&api, &[7], b"installer", &fast_tuning()).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, DeployStatus::SessionAttemptFailed);
        // No upload, placement or execution once the session is refused.
        assert_eq!(api.calls(), vec!["name:7", "session:7"]);
    }

    #[tokio::test]
    async fn test_full_pass_reaches_install_started() {
        let api = MockEdr::default();

        let outcomes = run_batch(&api, &[101], b"installer", &fast_tuning()).await;

        assert_eq!(outcomes[0].status, DeployStatus::InstallProcessStarted);
        assert_eq!(outcomes[0].device_name.as_deref(), Some("CORP\\host101"));
        assert_eq!(
            api.calls(),
            vec![
                "name:101",
                "session:101",
                "upload:1:101",
                "put:1:101",
                "exec:1:101"
            ]
        );
    }

    #[tokio::test]
    async fn test_upload_failure_freezes_status() {
        let api = MockEdr {
            deny_upload: true,
            ..MockEdr::default()
        };

        let outcomes = run_batch(&api, &[101], b"installer", &fast_tuning()).await;

        assert_eq!(outcomes[0].status, DeployStatus::FileUploadFailed);
        assert!(!api.calls().iter().any(|c| c.starts_with("put:")));
        assert!(!api.calls().iter().any(|c| c.starts_with("exec:")));
    }

    #[tokio::test]
    async fn test_placement_poll_exhausts_budget() {
        let api = MockEdr {
            pending_checks: u32::MAX,
            ..MockEdr::default()
        };

        let outcomes = run_batch(&api, &[101], b"installer", &fast_tuning()).await;

        assert_eq!(outcomes[0].status, DeployStatus::PutFileFailed);
        assert_eq!(api.status_checks.load(Ordering::SeqCst), 5);
        assert!(!api.calls().iter().any(|c| c.starts_with("exec:")));
    }

    #[tokio::test]
    async fn test_placement_poll_stops_on_first_complete() {
        let api = MockEdr {
            pending_checks: 2,
            ..MockEdr::default()
        };

        let outcomes = run_batch(&api, &[101], b"installer", &fast_tuning()).await;

        assert_eq!(outcomes[0].status, DeployStatus::InstallProcessStarted);
        assert_eq!(api.status_checks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_launch_failure_is_terminal() {
        let api = MockEdr {
            deny_process: true,
            ..MockEdr::default()
        };

        let outcomes = run_batch(&api, &[101], b"installer", &fast_tuning()).await;

        assert_eq!(outcomes[0].status, DeployStatus::InstallProcessFailed);
    }

    #[tokio::test]
    async fn test_outcomes_preserve_device_order() {
        let api = MockEdr {
            deny_session: vec![102],
            ..MockEdr::default()
        };

        let outcomes = run_batch(&api, &[101, 102], b"installer", &fast_tuning()).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].device_id, 101);
        assert_eq!(outcomes[0].status, DeployStatus::InstallProcessStarted);
        assert_eq!(outcomes[1].device_id, 102);
        assert_eq!(outcomes[1].status, DeployStatus::SessionAttemptFailed);
    }

    #[tokio::test]
    async fn test_transport_error_maps_to_step_failure() {
        struct FlakyEdr(MockEdr);

        #[async_trait]
        impl EdrAdapter for FlakyEdr {
            async fn device_name(&self, device_id: u64) -> Result<Option<String>> {
                self.0.device_name(device_id).await
            }
            async fn start_session(&self, _device_id: u64) -> Result<Option<String>> {
                anyhow::bail!("connection refused")
            }
            async fn upload_file(
                &self,
                session_id: &str,
                data: Vec<u8>,
            ) -> Result<Option<String>> {
                self.0.upload_file(session_id, data).await
            }
            async fn issue_command(
                &self,
                session_id: &str,
                request: CommandRequest,
            ) -> Result<Option<u64>> {
                self.0.issue_command(session_id, request).await
            }
            async fn command_complete(&self, session_id: &str, command_id: u64) -> Result<bool> {
                self.0.command_complete(session_id, command_id).await
            }
            async fn uninstall_sensors(&self, device_ids: &[u64]) -> Result<()> {
                self.0.uninstall_sensors(device_ids).await
            }
        }

        let api = FlakyEdr(MockEdr::default());
        let outcomes = run_batch(&api, &[101], b"installer", &fast_tuning()).await;

        // The batch survives; the device is marked failed at the session step.
        assert_eq!(outcomes[0].status, DeployStatus::SessionAttemptFailed);
    }
}
