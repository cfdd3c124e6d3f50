//! Deploy Command
//!
//! Batch install driver: resolves the device list, renders the installer
//! once, runs the two-phase workflow and appends one progress row per
//! device.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::DeployArgs;
use crate::config::Tuning;
use crate::edr::client::EdrClient;
use crate::progress::{self, ProgressRecord};
use crate::template;
use crate::workflow::{self, DeployStatus};

/// Run the batch install driver.
pub async fn run(args: DeployArgs) -> Result<()> {
    let device_ids = match (&args.device_ids, &args.device_ids_csv) {
        (Some(ids), _) => ids.clone(),
        (None, Some(path)) => device_ids_from_csv(path)?,
        (None, None) => anyhow::bail!("Either --device-ids or --device-ids-csv is required"),
    };
    if device_ids.is_empty() {
        println!("{}", "No devices to migrate.".dimmed());
        return Ok(());
    }

    let tuning = match &args.config {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };

    let template_text = std::fs::read_to_string(&args.template).with_context(|| {
        format!(
            "Failed to read installer template {}",
            args.template.display()
        )
    })?;
    let installer = template::render_installer(&template_text, &args.policy_id)?;

    let api = EdrClient::new(&args.edr_url, &args.edr_org_key, &args.edr_api_key)?;

    println!(
        "{} Migrating {} device(s)...",
        "→".blue().bold(),
        device_ids.len()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Running device workflows...");

    let outcomes = workflow::run_batch(&api, &device_ids, &installer, &tuning).await;

    spinner.finish_and_clear();

    let out_path = args.out.clone().unwrap_or_else(default_log_path);
    let records: Vec<ProgressRecord> = outcomes.iter().map(ProgressRecord::from_outcome).collect();
    progress::append_records(&out_path, &records)?;

    println!("{}", "Devices".bold());
    println!("{}", "─".repeat(60));
    let mut migrated = 0;
    for outcome in &outcomes {
        let label = outcome.status.as_str();
        let status_col = if outcome.status.is_failure() {
            label.red()
        } else {
            label.green()
        };
        let name = outcome.device_name.as_deref().unwrap_or("-");
        println!("  {:<25} {:<12} {}", name, outcome.device_id, status_col);
        if outcome.status == DeployStatus::InstallProcessStarted {
            migrated += 1;
        }
    }
    println!();
    println!(
        "{} {}/{} device(s) migrated",
        "✓".green().bold(),
        migrated,
        outcomes.len()
    );
    println!("  Progress log: {}", out_path.display());

    Ok(())
}

/// Read device ids from the `deviceId` column of a CSV file.
fn device_ids_from_csv(path: &Path) -> Result<Vec<u64>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open device list {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let column = headers
        .iter()
        .position(|h| h == "deviceId")
        .with_context(|| format!("{} has no deviceId column", path.display()))?;

    let mut ids = Vec::new();
    for row in reader.records() {
        let row = row?;
        let field = row.get(column).unwrap_or("").trim();
        if field.is_empty() {
            continue;
        }
        let id = field
            .parse::<u64>()
            .with_context(|| format!("Invalid device id '{}' in {}", field, path.display()))?;
        ids.push(id);
    }

    Ok(ids)
}

fn default_log_path() -> PathBuf {
    PathBuf::from(format!(
        "agent_deployment-{}.csv",
        Local::now().format("%Y-%m-%dT%H-%M-%S")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_ids_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.csv");
        std::fs::write(&path, "hostname,deviceId\nhost01,101\nhost02,102\n").unwrap();

        assert_eq!(device_ids_from_csv(&path).unwrap(), vec![101, 102]);
    }

    #[test]
    fn test_missing_device_id_column_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.csv");
        std::fs::write(&path, "hostname,id\nhost01,101\n").unwrap();

        assert!(device_ids_from_csv(&path).is_err());
    }

    #[test]
    fn test_non_numeric_device_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.csv");
        std::fs::write(&path, "deviceId\nhost01\n").unwrap();

        assert!(device_ids_from_csv(&path).is_err());
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.csv");
        std::fs::write(&path, "deviceId\n101\n\n102\n").unwrap();

        assert_eq!(device_ids_from_csv(&path).unwrap(), vec![101, 102]);
    }
}
