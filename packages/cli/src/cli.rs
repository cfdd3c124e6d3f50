//! Command-Line Interface
//!
//! Argument definitions for the fleetshift binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "fleetshift", about = "Migrate endpoint security agents across a fleet")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Push the replacement agent installer to a batch of devices
    Deploy(DeployArgs),

    /// Confirm migrated hosts and uninstall the incumbent sensor
    Uninstall(UninstallArgs),
}

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// EDR platform base URL
    #[arg(long, env = "FLEETSHIFT_EDR_URL")]
    pub edr_url: String,

    /// EDR platform API token
    #[arg(long, env = "FLEETSHIFT_EDR_API_KEY", hide_env_values = true)]
    pub edr_api_key: String,

    /// EDR platform organization key
    #[arg(long, env = "FLEETSHIFT_EDR_ORG_KEY")]
    pub edr_org_key: String,

    /// Policy id assigned to the replacement agents
    #[arg(long)]
    pub policy_id: String,

    /// Device ids to migrate, space separated
    #[arg(
        long,
        num_args = 1..,
        value_name = "ID",
        conflicts_with = "device_ids_csv",
        required_unless_present = "device_ids_csv"
    )]
    pub device_ids: Option<Vec<u64>>,

    /// CSV file with a `deviceId` column listing the devices to migrate
    #[arg(long, value_name = "PATH")]
    pub device_ids_csv: Option<PathBuf>,

    /// Installer template rendered with the policy id
    #[arg(long, default_value = "agent_install.ps1", value_name = "PATH")]
    pub template: PathBuf,

    /// Progress log destination (default: timestamped CSV in the working directory)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Optional tuning file (remote paths, poll budget, propagation delay)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct UninstallArgs {
    /// EDR platform base URL
    #[arg(long, env = "FLEETSHIFT_EDR_URL")]
    pub edr_url: String,

    /// EDR platform API token
    #[arg(long, env = "FLEETSHIFT_EDR_API_KEY", hide_env_values = true)]
    pub edr_api_key: String,

    /// EDR platform organization key
    #[arg(long, env = "FLEETSHIFT_EDR_ORG_KEY")]
    pub edr_org_key: String,

    /// Destination console base URL
    #[arg(long, env = "FLEETSHIFT_CONSOLE_URL")]
    pub console_url: String,

    /// Destination console API key
    #[arg(long, env = "FLEETSHIFT_CONSOLE_API_KEY", hide_env_values = true)]
    pub console_api_key: String,

    /// Progress log produced by a deploy run
    #[arg(long, value_name = "PATH")]
    pub deployment_csv: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deploy_base() -> Vec<&'static str> {
        vec![
            "fleetshift",
            "deploy",
            "--edr-url",
            "https://edr.example",
            "--edr-api-key",
            "token",
            "--edr-org-key",
            "ORG",
            "--policy-id",
            "42",
        ]
    }

    #[test]
    fn test_device_id_list_parses() {
        let mut args = deploy_base();
        args.extend(["--device-ids", "101", "102"]);

        let cli = Cli::try_parse_from(args).unwrap();
        let Commands::Deploy(deploy) = cli.command else {
            panic!("expected deploy subcommand");
        };
        assert_eq!(deploy.device_ids, Some(vec![101, 102]));
    }

    #[test]
    fn test_device_csv_parses() {
        let mut args = deploy_base();
        args.extend(["--device-ids-csv", "devices.csv"]);

        let cli = Cli::try_parse_from(args).unwrap();
        let Commands::Deploy(deploy) = cli.command else {
            panic!("expected deploy subcommand");
        };
        assert_eq!(deploy.device_ids, None);
        assert!(deploy.device_ids_csv.is_some());
    }

    #[test]
    fn test_both_device_sources_rejected() {
        let mut args = deploy_base();
        args.extend(["--device-ids", "101", "--device-ids-csv", "devices.csv"]);

        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_missing_device_source_rejected() {
        assert!(Cli::try_parse_from(deploy_base()).is_err());
    }
}
