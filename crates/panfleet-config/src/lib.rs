//! Run settings for panfleet.
//!
//! Settings are layered from built-in defaults, a TOML file, and the
//! environment, then translated into the types `panfleet-core` runs on:
//! [`Credentials`], endpoint commands, and a [`TransportConfig`]. Input
//! discovery (the address CSV and the newest scraper output) lives here
//! too, since both are pure filesystem concerns.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use panfleet_api::{TlsMode, TransportConfig};
use panfleet_core::{CoreError, Credentials};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{path}: no '{column}' column")]
    MissingColumn { column: &'static str, path: PathBuf },

    #[error("no .{extension} file in {dir}")]
    NoMatchingFile { dir: PathBuf, extension: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Operational commands queried on every appliance when `URIS` is unset.
pub const DEFAULT_ENDPOINTS: &str =
    "<show><system><info></info></system></show>|<request><license><info></info></license></request>";

/// Separator between commands in `URIS`.
pub const ENDPOINT_SEPARATOR: char = '|';

/// Keys read verbatim from the environment. Figment's env parser would
/// turn `123456` or `[abc]` into numbers and arrays.
const STRING_KEYS: [&str; 3] = ["user_ip", "password_ip", "uris"];

#[derive(Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Appliance username (`USER_IP`).
    pub user_ip: Option<String>,

    /// Appliance password (`PASSWORD_IP`).
    pub password_ip: Option<String>,

    /// `|`-separated operational commands (`URIS`).
    pub uris: String,

    /// Per-request timeout in seconds.
    pub timeout: u64,

    /// Skip certificate verification even when `ca_cert` is set.
    pub insecure: bool,

    /// PEM file with the CA that signed the appliances' certificates.
    pub ca_cert: Option<PathBuf>,

    /// Appliances polled at once.
    pub concurrency: usize,

    /// Preferred-version JSON, or a directory of dated scraper outputs.
    pub preferred_table: Option<PathBuf>,

    /// Report destination.
    pub output: Option<PathBuf>,

    /// Directory for `process.log` and `error.log`.
    pub log_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_ip: None,
            password_ip: None,
            uris: DEFAULT_ENDPOINTS.into(),
            timeout: 10,
            insecure: false,
            ca_cert: None,
            concurrency: 1,
            preferred_table: None,
            output: None,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("user_ip", &self.user_ip)
            .field("password_ip", &self.password_ip.as_ref().map(|_| "***"))
            .field("uris", &self.uris)
            .field("timeout", &self.timeout)
            .field("insecure", &self.insecure)
            .field("ca_cert", &self.ca_cert)
            .field("concurrency", &self.concurrency)
            .field("preferred_table", &self.preferred_table)
            .field("output", &self.output)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl Settings {
    /// Defaults → TOML file → `PANFLEET_*` → `USER_IP` / `PASSWORD_IP` / `URIS`.
    ///
    /// `path` overrides the platform config location. A missing file is
    /// not an error.
    pub fn figment(path: Option<&Path>) -> Figment {
        let path = path.map_or_else(config_path, Path::to_path_buf);
        debug!(path = %path.display(), "config file");

        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("PANFLEET_").ignore(&STRING_KEYS));
        let figment = merge_string_env(figment, "PANFLEET_");
        merge_string_env(figment, "")
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings: Self = Self::figment(path).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout",
                reason: "must be at least one second".into(),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Validation {
                field: "concurrency",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// The commands in `uris`, trimmed, empties dropped.
    pub fn endpoints(&self) -> Vec<String> {
        self.uris
            .split(ENDPOINT_SEPARATOR)
            .map(str::trim)
            .filter(|cmd| !cmd.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let password = self.password_ip.clone().map(SecretString::from);
        Ok(Credentials::new(self.user_ip.clone(), password)?)
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca) = self.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::DangerAcceptInvalid
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.timeout),
            ..TransportConfig::default()
        }
    }
}

/// Merge each of [`STRING_KEYS`] set as `{prefix}{KEY}` without letting
/// figment reinterpret the value.
fn merge_string_env(figment: Figment, prefix: &str) -> Figment {
    STRING_KEYS.iter().fold(figment, |figment, &key| {
        match std::env::var(format!("{prefix}{}", key.to_ascii_uppercase())) {
            Ok(value) => figment.merge(Serialized::default(key, value)),
            Err(_) => figment,
        }
    })
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "panfleet", "panfleet").map_or_else(
        || PathBuf::from("panfleet.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Load a `.env` file from the working directory (or a parent) into the
/// process environment. Variables already set are left alone.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

// ── Inputs ──────────────────────────────────────────────────────────

/// Appliance addresses from the `ip` column of a CSV file.
///
/// Blank cells are skipped; repeats keep their first position.
pub fn read_addresses(path: &Path) -> Result<Vec<String>, ConfigError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let column = rdr
        .headers()?
        .iter()
        .position(|h| h.trim() == "ip")
        .ok_or_else(|| ConfigError::MissingColumn {
            column: "ip",
            path: path.to_path_buf(),
        })?;

    let mut seen = HashSet::new();
    let mut addresses = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let Some(ip) = record.get(column).map(str::trim).filter(|ip| !ip.is_empty()) else {
            continue;
        };
        if seen.insert(ip.to_owned()) {
            addresses.push(ip.to_owned());
        }
    }
    Ok(addresses)
}

/// The most recently modified `*.{extension}` file directly under `dir`.
pub fn most_recent_file(dir: &Path, extension: &str) -> Result<PathBuf, ConfigError> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != extension) {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if newest.as_ref().is_none_or(|(best, _)| modified > *best) {
            newest = Some((modified, path));
        }
    }
    newest
        .map(|(_, path)| path)
        .ok_or_else(|| ConfigError::NoMatchingFile {
            dir: dir.to_path_buf(),
            extension: extension.to_owned(),
        })
}

/// `path` itself, or the newest JSON file in it when it is a directory.
pub fn resolve_preferred_table(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_dir() {
        most_recent_file(path, "json")
    } else {
        Ok(path.to_path_buf())
    }
}
