//! Command handlers.

pub mod collect;
pub mod reconcile;

use std::path::{Path, PathBuf};

use panfleet_config::{Settings, load_dotenv, resolve_preferred_table};
use panfleet_core::PreferredVersionTable;
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Settings from `.env`, the config file, and the environment, with
/// command-line overrides applied last.
pub fn load_settings(global: &GlobalOpts) -> Result<Settings, CliError> {
    if let Some(path) = load_dotenv() {
        debug!(path = %path.display(), "loaded .env");
    }
    let mut settings = Settings::load(global.config.as_deref())?;
    if global.insecure {
        settings.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        if timeout == 0 {
            return Err(CliError::Validation {
                field: "--timeout".into(),
                reason: "must be at least one second".into(),
            });
        }
        settings.timeout = timeout;
    }
    if let Some(ref dir) = global.log_dir {
        settings.log_dir.clone_from(dir);
    }
    Ok(settings)
}

/// Load the preferred-version table from a file or the newest JSON in a directory.
pub fn load_table(path: &Path) -> Result<(PathBuf, PreferredVersionTable), CliError> {
    if !path.exists() {
        return Err(CliError::NoInput {
            what: "Preferred-version table",
            path: path.to_path_buf(),
        });
    }
    let resolved = resolve_preferred_table(path)?;
    debug!(path = %resolved.display(), "preferred-version table");
    let table = PreferredVersionTable::load(&resolved)?;
    Ok((resolved, table))
}
