//! Progress Log
//!
//! Append-only CSV record of per-device outcomes, consumed later by the
//! uninstall reconciler. The reader maps columns by header name, so logs
//! from older runs with a different column order still parse.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::workflow::install::DeviceOutcome;
use crate::workflow::status::DeployStatus;

/// One row of the deployment progress log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Display name as the platform reports it, possibly domain-qualified.
    /// Blank when the lookup failed.
    #[serde(alias = "name")]
    pub device_name: Option<String>,
    pub device_id: u64,
    pub status: DeployStatus,
    pub timestamp: String,
}

impl ProgressRecord {
    /// Record a device outcome stamped with the current local time.
    pub fn from_outcome(outcome: &DeviceOutcome) -> Self {
        Self {
            device_name: outcome.device_name.clone(),
            device_id: outcome.device_id,
            status: outcome.status,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Append records to `path`, writing the header only when the file is new.
pub fn append_records(path: &Path, records: &[ProgressRecord]) -> Result<()> {
    let write_header = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open progress log {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Load every record from a progress log. Any malformed row fails the
/// whole load.
pub fn read_records(path: &Path) -> Result<Vec<ProgressRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open progress log {}", path.display()))?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: ProgressRecord =
            row.with_context(|| format!("Malformed progress log {}", path.display()))?;
        records.push(record);
    }

    Ok(records)
}
