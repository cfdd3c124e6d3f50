//! Fleetshift Library
//!
//! Core functionality for migrating endpoint security agents across a
//! fleet: the live-response install workflow, the progress log,
//! destination-console validation and the uninstall reconciler.

pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod edr;
pub mod progress;
pub mod reconcile;
pub mod template;
pub mod workflow;

// Re-exports for convenience
pub use config::Tuning;
pub use console::adapter::ConsoleAdapter;
pub use console::client::ConsoleClient;
pub use edr::adapter::EdrAdapter;
pub use edr::client::EdrClient;
pub use progress::ProgressRecord;
pub use reconcile::{ReconcileReport, UninstallReconciler};
pub use workflow::install::{run_batch, DeviceOutcome};
pub use workflow::status::DeployStatus;
