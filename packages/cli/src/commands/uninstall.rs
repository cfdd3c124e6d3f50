//! Uninstall Command
//!
//! Reconciliation driver: loads a deploy run's progress log, confirms
//! migrated hosts against the destination console and issues the batch
//! sensor uninstall.

use anyhow::Result;
use colored::Colorize;

use crate::cli::UninstallArgs;
use crate::console::client::ConsoleClient;
use crate::edr::client::EdrClient;
use crate::progress;
use crate::reconcile::UninstallReconciler;
use crate::workflow::DeployStatus;

/// Run the reconciliation driver.
pub async fn run(args: UninstallArgs) -> Result<()> {
    let records = progress::read_records(&args.deployment_csv)?;
    let eligible = records
        .iter()
        .filter(|r| r.status == DeployStatus::InstallProcessStarted)
        .count();

    let edr = EdrClient::new(&args.edr_url, &args.edr_org_key, &args.edr_api_key)?;
    let console = ConsoleClient::new(&args.console_url, &args.console_api_key)?;

    println!(
        "{} Checking {} migrated device(s)...",
        "→".blue().bold(),
        eligible
    );

    let report = UninstallReconciler::new(&edr, &console)
        .run(&records)
        .await?;

    if report.confirmed.is_empty() {
        println!(
            "{}",
            "No migrated hosts found in the destination console.".yellow()
        );
        return Ok(());
    }

    println!("{}", "Confirmed".bold());
    println!("{}", "─".repeat(50));
    for device in &report.confirmed {
        println!("  {:<25} {}", device.hostname, device.device_id);
    }
    println!();
    println!(
        "{} Uninstall issued for {} sensor(s)",
        "✓".green().bold(),
        report.confirmed.len()
    );
    if !report.unconfirmed.is_empty() {
        println!(
            "{} {} host(s) not registered yet",
            "!".yellow().bold(),
            report.unconfirmed.len()
        );
    }

    Ok(())
}
