// ── License domain type ──

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::error::AssemblyError;

/// Layout of the appliance's `issued` field, e.g. `March 3, 2024`.
pub const ISSUED_INPUT_FORMAT: &str = "%B %d, %Y";
/// Day/month/year layout used everywhere downstream.
pub const ISSUED_OUTPUT_FORMAT: &str = "%d/%m/%Y";

/// One licensed feature entitlement of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct License {
    feature: String,
    #[serde(serialize_with = "serialize_issued")]
    issued: NaiveDate,
    expired: bool,
}

impl License {
    /// Build from the raw `feature` / `issued` / `expired` values of a
    /// license entry.
    ///
    /// `expired` is `true` only for the literal `yes`. A missing or
    /// differently-formatted `issued` is an error, never a guess.
    pub fn from_raw(
        feature: Option<&str>,
        issued: Option<&str>,
        expired: Option<&str>,
    ) -> Result<Self, AssemblyError> {
        let feature = feature.unwrap_or_default().to_owned();
        let Some(raw_issued) = issued.filter(|s| !s.is_empty()) else {
            return Err(AssemblyError::MissingIssueDate { feature });
        };
        let issued = NaiveDate::parse_from_str(raw_issued, ISSUED_INPUT_FORMAT).map_err(
            |source| AssemblyError::InvalidIssueDate {
                feature: feature.clone(),
                value: raw_issued.to_owned(),
                source,
            },
        )?;
        Ok(Self {
            feature,
            issued,
            expired: expired == Some("yes"),
        })
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub fn issued(&self) -> NaiveDate {
        self.issued
    }

    /// The issue date as `dd/mm/yyyy`.
    pub fn issued_display(&self) -> String {
        self.issued.format(ISSUED_OUTPUT_FORMAT).to_string()
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }
}

fn serialize_issued<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(ISSUED_OUTPUT_FORMAT))
}
