//! Device metadata collection and version reconciliation for PAN-OS fleets.
//!
//! The pipeline, per appliance address:
//!
//! 1. **Key provisioning** -- [`Fleet`] trades the run's [`Credentials`] for
//!    an API key via `panfleet-api`.
//! 2. **Collection** -- [`collect()`] runs every configured operational
//!    command and keeps each non-empty `response.result` as a [`Fragment`].
//! 3. **Assembly** -- [`assemble()`] folds the fragments into one
//!    [`Device`] with its [`License`] entries.
//!
//! Across the fleet, [`Fleet::run`] accumulates the assembled devices;
//! [`reconcile()`] then annotates each with its preferred release from a
//! [`PreferredVersionTable`], and [`report`] flattens the result into CSV.
//!
//! Per-device failures never abort a run. They are reported through the
//! injected [`RunLog`] and the device is left out of the output.

pub mod assemble;
pub mod collect;
pub mod config;
pub mod error;
pub mod fleet;
pub mod log;
pub mod model;
pub mod preferred;
pub mod reconcile;
pub mod report;

// ── Primary re-exports ──────────────────────────────────────────────
pub use assemble::assemble;
pub use collect::{Fragment, collect};
pub use config::Credentials;
pub use error::{AssemblyError, CoreError};
pub use fleet::{DeviceOutcome, Fleet};
pub use log::{LogLevel, LogLine, MemoryLog, RunLog, TracingLog};
pub use model::{Device, License, ModelFamily, PreferredVersion, SystemInfo};
pub use preferred::PreferredVersionTable;
pub use reconcile::{Reconciliation, lookup, reconcile, truncated_version};
