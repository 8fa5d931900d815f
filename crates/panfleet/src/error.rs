//! CLI error types with miette diagnostics.
//!
//! Maps `ConfigError` and `CoreError` variants into user-facing errors
//! with actionable help text.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use panfleet_config::ConfigError;
use panfleet_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CREDENTIALS: i32 = 3;
    pub const NO_INPUT: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Credentials ──────────────────────────────────────────────────
    #[error("Appliance {field} is not set")]
    #[diagnostic(
        code(panfleet::missing_credentials),
        help(
            "Set USER_IP and PASSWORD_IP in the environment or in a .env file\n\
             in the working directory."
        )
    )]
    MissingCredentials { field: &'static str },

    // ── Inputs ───────────────────────────────────────────────────────
    #[error("{what} not found: {}", path.display())]
    #[diagnostic(code(panfleet::no_input))]
    NoInput { what: &'static str, path: PathBuf },

    #[error("{} has no '{column}' column", path.display())]
    #[diagnostic(
        code(panfleet::missing_column),
        help("The address file needs a header row with an 'ip' column.")
    )]
    MissingColumn { column: &'static str, path: PathBuf },

    #[error("Invalid preferred-version table: {message}")]
    #[diagnostic(
        code(panfleet::preferred_table),
        help(
            "Expected a JSON list of single-key objects:\n\
             [{{\"PAN-OS for Firewalls\": {{\"10.2\": [\"10.2.9\", ...]}}}}]"
        )
    )]
    PreferredTable { message: String },

    // ── Run ──────────────────────────────────────────────────────────
    #[error("Unexpected data from {address}: {message}")]
    #[diagnostic(
        code(panfleet::data_integrity),
        help(
            "The appliance returned a license entry in a layout this version\n\
             does not understand. No report was written."
        )
    )]
    DataIntegrity { address: String, message: String },

    #[error("Could not write report: {message}")]
    #[diagnostic(code(panfleet::report))]
    Report { message: String },

    #[error(transparent)]
    #[diagnostic(code(panfleet::api))]
    Api(#[from] panfleet_api::Error),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(panfleet::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Could not load settings: {message}")]
    #[diagnostic(code(panfleet::config))]
    Config { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not render output: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingCredentials { .. } => exit_code::CREDENTIALS,
            Self::NoInput { .. } => exit_code::NO_INPUT,
            Self::Validation { .. } | Self::MissingColumn { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingCredentials { field } => Self::MissingCredentials {
                field: match field {
                    "username" => "USER_IP",
                    "password" => "PASSWORD_IP",
                    other => other,
                },
            },
            CoreError::DataIntegrity { address, source } => Self::DataIntegrity {
                address,
                message: source.to_string(),
            },
            CoreError::PreferredTable { message } => Self::PreferredTable { message },
            CoreError::Report { message } => Self::Report { message },
            CoreError::Api(e) => Self::Api(e),
            CoreError::Io(e) => Self::Io(e),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Core(e) => e.into(),
            ConfigError::MissingColumn { column, path } => Self::MissingColumn { column, path },
            ConfigError::NoMatchingFile { dir, extension } => Self::NoInput {
                what: if extension == "json" {
                    "Preferred-version table"
                } else {
                    "Input file"
                },
                path: dir,
            },
            ConfigError::Validation { field, reason } => Self::Validation {
                field: field.into(),
                reason,
            },
            ConfigError::Io(e) => Self::Io(e),
            other @ (ConfigError::Figment(_) | ConfigError::Csv(_)) => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_fields_use_variable_names() {
        let err: CliError = CoreError::MissingCredentials { field: "password" }.into();
        assert_eq!(err.to_string(), "Appliance PASSWORD_IP is not set");
        assert_eq!(err.exit_code(), exit_code::CREDENTIALS);
    }

    #[test]
    fn missing_table_directory_is_no_input() {
        let err: CliError = ConfigError::NoMatchingFile {
            dir: "scrapes".into(),
            extension: "json".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::NO_INPUT);
    }
}
