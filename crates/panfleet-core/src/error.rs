// ── Core error types ──
//
// Per-device transport and protocol failures are not errors here: the
// collector and orchestrator collapse them to "no data" and log them.
// What remains is what must stop a run or a caller.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("Missing credentials: {field} is not set")]
    MissingCredentials { field: &'static str },

    // ── Data errors ──────────────────────────────────────────────────
    /// Upstream data no longer matches the expected layout.
    #[error("Data integrity error for {address}: {source}")]
    DataIntegrity {
        address: String,
        #[source]
        source: AssemblyError,
    },

    #[error("Invalid preferred-version table: {message}")]
    PreferredTable { message: String },

    #[error("Report error: {message}")]
    Report { message: String },

    // ── Wrapped errors ───────────────────────────────────────────────
    #[error(transparent)]
    Api(#[from] panfleet_api::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for CoreError {
    fn from(err: csv::Error) -> Self {
        Self::Report {
            message: err.to_string(),
        }
    }
}

/// A license entry that cannot be turned into a [`License`](crate::License).
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("license '{feature}' has no issue date")]
    MissingIssueDate { feature: String },

    #[error("license '{feature}' has issue date {value:?}, expected e.g. \"March 3, 2024\": {source}")]
    InvalidIssueDate {
        feature: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
