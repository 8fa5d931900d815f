// ── Preferred-version table ──
//
// Produced offline by scraping the vendor's release-notes page. On disk
// it is a list of single-key objects, one per model family:
//
//   [ { "PAN-OS for Firewalls": { "10.2": ["10.2.9", ...], ... } }, ... ]
//
// The scraper emits each release either as a bare identifier or as the
// whole table row `[release, release date, comments]`; both are accepted.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::CoreError;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRelease {
    Id(String),
    Row(Vec<String>),
}

impl RawRelease {
    fn into_id(self) -> Option<String> {
        match self {
            Self::Id(id) => Some(id),
            Self::Row(cells) => cells.into_iter().next(),
        }
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
    }
}

type RawFamily = IndexMap<String, Vec<RawRelease>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTable {
    List(Vec<IndexMap<String, RawFamily>>),
    Map(IndexMap<String, RawFamily>),
}

/// Family label → truncated version key → ordered releases.
///
/// The first release listed for a key is the preferred one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferredVersionTable {
    families: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl PreferredVersionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let raw: RawTable = serde_json::from_str(json).map_err(|e| CoreError::PreferredTable {
            message: e.to_string(),
        })?;
        let objects = match raw {
            RawTable::List(objects) => objects,
            RawTable::Map(object) => vec![object],
        };

        let mut table = Self::new();
        for object in objects {
            for (family, versions) in object {
                for (key, releases) in versions {
                    let releases = releases.into_iter().filter_map(RawRelease::into_id);
                    table.extend(&family, &key, releases);
                }
            }
        }
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|e| match e {
            CoreError::PreferredTable { message } => CoreError::PreferredTable {
                message: format!("{}: {message}", path.display()),
            },
            other => other,
        })
    }

    /// Append releases for `family` / `key`, after any already present.
    pub fn extend(
        &mut self,
        family: &str,
        key: &str,
        releases: impl IntoIterator<Item = String>,
    ) {
        self.families
            .entry(family.to_owned())
            .or_default()
            .entry(key.to_owned())
            .or_default()
            .extend(releases);
    }

    pub fn releases(&self, family: &str, key: &str) -> Option<&[String]> {
        self.families
            .get(family)
            .and_then(|versions| versions.get(key))
            .map(Vec::as_slice)
    }

    /// First listed release for `family` / `key`.
    pub fn preferred(&self, family: &str, key: &str) -> Option<&str> {
        self.releases(family, key)
            .and_then(<[String]>::first)
            .map(String::as_str)
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}
