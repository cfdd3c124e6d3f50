//! Uninstall Reconciliation
//!
//! Walks a progress log from a prior install run, confirms each migrated
//! host against the destination console, and batch-issues the sensor
//! uninstall for the confirmed devices.

use anyhow::Result;
use tracing::{info, warn};

use crate::console::adapter::ConsoleAdapter;
use crate::edr::adapter::EdrAdapter;
use crate::progress::ProgressRecord;
use crate::workflow::status::DeployStatus;

/// Outcome of a reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Devices confirmed in the destination console and sent for uninstall.
    pub confirmed: Vec<ConfirmedDevice>,
    /// Hostnames that were eligible but not found, or whose lookup failed.
    pub unconfirmed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ConfirmedDevice {
    pub device_id: u64,
    pub hostname: String,
}

/// Strip a domain qualifier, keeping the portion after the last `\`.
pub fn short_hostname(device_name: &str) -> &str {
    match device_name.rsplit_once('\\') {
        Some((_, host)) => host,
        None => device_name,
    }
}

pub struct UninstallReconciler<'a, E, C> {
    edr: &'a E,
    console: &'a C,
}

impl<'a, E: EdrAdapter, C: ConsoleAdapter> UninstallReconciler<'a, E, C> {
    pub fn new(edr: &'a E, console: &'a C) -> Self {
        Self { edr, console }
    }

    /// Check every migrated record against the console and uninstall the
    /// incumbent sensor on the confirmed devices in one batch action.
    ///
    /// A failed or empty console lookup leaves the device unconfirmed;
    /// lookups are never retried.
    pub async fn run(&self, records: &[ProgressRecord]) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for record in records {
            if record.status != DeployStatus::InstallProcessStarted {
                continue;
            }
            let Some(device_name) = record.device_name.as_deref() else {
                warn!(
                    device_id = record.device_id,
                    "Migrated record has no device name, skipping"
                );
                continue;
            };
            let host = short_hostname(device_name);

            match self.console.host_registered(host).await {
                Ok(true) => {
                    info!(host, device_id = record.device_id, "Host confirmed in destination console");
                    report.confirmed.push(ConfirmedDevice {
                        device_id: record.device_id,
                        hostname: host.to_string(),
                    });
                }
                Ok(false) => {
                    info!(host, "Host not found in destination console");
                    report.unconfirmed.push(host.to_string());
                }
                Err(e) => {
                    warn!(host, error = %e, "Console lookup failed, treating as unconfirmed");
                    report.unconfirmed.push(host.to_string());
                }
            }
        }

        if !report.confirmed.is_empty() {
            let device_ids: Vec<u64> = report.confirmed.iter().map(|d| d.device_id).collect();
            self.edr.uninstall_sensors(&device_ids).await?;
            info!(count = device_ids.len(), "Sensor uninstall issued");
        }

        Ok(report)
    }
}
