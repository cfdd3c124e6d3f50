//! Deployment Tuning
//!
//! Remote paths and timing constants used by the install workflow,
//! overridable from a TOML file.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::workflow::poll::PollPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    /// Where the installer script lands on each device.
    #[serde(default = "default_remote_script_path")]
    pub remote_script_path: String,

    /// Remote file capturing installer output.
    #[serde(default = "default_remote_output_log")]
    pub remote_output_log: String,

    /// Interpreter invocation the script path is appended to.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Placement-command poll attempts.
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,

    /// Seconds between placement-command polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Pause between the upload phase and the placement phase, letting the
    /// platform finish distributing uploads across its backend.
    #[serde(default = "default_propagation_delay_secs")]
    pub propagation_delay_secs: u64,
}

// Default value functions
fn default_remote_script_path() -> String {
    "c:\\temp\\agent_install.ps1".to_string()
}

fn default_remote_output_log() -> String {
    "c:\\temp\\install.log".to_string()
}

fn default_interpreter() -> String {
    "c:\\Windows\\System32\\WindowsPowerShell\\v1.0\\powershell.exe -ExecutionPolicy Bypass -File"
        .to_string()
}

fn default_poll_max_attempts() -> u32 {
    5
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_propagation_delay_secs() -> u64 {
    60
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            remote_script_path: default_remote_script_path(),
            remote_output_log: default_remote_output_log(),
            interpreter: default_interpreter(),
            poll_max_attempts: default_poll_max_attempts(),
            poll_interval_secs: default_poll_interval_secs(),
            propagation_delay_secs: default_propagation_delay_secs(),
        }
    }
}

impl Tuning {
    /// Load tuning from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tuning file: {}", path.display()))?;

        let tuning: Tuning = toml::from_str(&content)
            .with_context(|| format!("Failed to parse tuning file: {}", path.display()))?;

        Ok(tuning)
    }

    /// Poll policy applied to placement commands.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            max_attempts: self.poll_max_attempts,
            interval: Duration::from_secs(self.poll_interval_secs),
        }
    }

    /// Full command line launching the installer on a device.
    pub fn exec_command(&self) -> String {
        format!("{} {}", self.interpreter, self.remote_script_path)
    }
}
