//! Device Migration Workflow
//!
//! The per-device install state machine, its status vocabulary and the
//! bounded poll applied to placement commands.

pub mod install;
pub mod poll;
pub mod status;

pub use install::{run_batch, DeviceOutcome, DeviceWorkflow};
pub use poll::PollPolicy;
pub use status::DeployStatus;
