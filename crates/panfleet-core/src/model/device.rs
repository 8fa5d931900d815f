// ── Device domain types ──

use std::fmt;

use chrono::{DateTime, Local};
use panfleet_api::ParsedValue;
use serde::{Serialize, Serializer};

use super::family::ModelFamily;
use super::license::License;

/// Flat attribute block of `<show><system><info/></system></show>`.
///
/// Values are kept exactly as the appliance reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub hostname: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub ip_address: Option<String>,
    pub sw_version: Option<String>,
    pub global_protect_client_package_version: Option<String>,
    pub app_version: Option<String>,
    pub av_version: Option<String>,
    pub threat_version: Option<String>,
    pub wildfire_version: Option<String>,
    pub url_filtering_version: Option<String>,
    pub device_certificate_status: Option<String>,
}

impl SystemInfo {
    /// Read the known attributes out of a `system` element.
    pub fn from_element(system: &ParsedValue) -> Self {
        let field = |key: &str| system.text_at(key).map(str::to_owned);
        Self {
            hostname: field("hostname"),
            model: field("model"),
            serial: field("serial"),
            ip_address: field("ip-address"),
            sw_version: field("sw-version"),
            global_protect_client_package_version: field("global-protect-client-package-version"),
            app_version: field("app-version"),
            av_version: field("av-version"),
            threat_version: field("threat-version"),
            wildfire_version: field("wildfire-version"),
            url_filtering_version: field("url-filtering-version"),
            device_certificate_status: field("device-certificate-status"),
        }
    }
}

/// Outcome of version reconciliation for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferredVersion {
    /// The table prefers a different release than the one installed.
    Release(String),
    /// The installed release is the preferred one.
    UpToDate,
}

impl PreferredVersion {
    pub const UP_TO_DATE: &'static str = "up to date";
}

impl fmt::Display for PreferredVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Release(release) => f.write_str(release),
            Self::UpToDate => f.write_str(Self::UP_TO_DATE),
        }
    }
}

impl Serialize for PreferredVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One managed appliance.
///
/// Built only from an observed system-info block; identity and the report
/// timestamp are fixed at construction, licenses are append-only.
#[derive(Debug, Clone, Serialize)]
pub struct Device {
    #[serde(flatten)]
    system: SystemInfo,
    sw_version_preferred: Option<PreferredVersion>,
    create_report_datetime: DateTime<Local>,
    licenses: Vec<License>,
}

impl Device {
    pub fn new(system: SystemInfo) -> Self {
        Self {
            system,
            sw_version_preferred: None,
            create_report_datetime: Local::now(),
            licenses: Vec::new(),
        }
    }

    pub fn system(&self) -> &SystemInfo {
        &self.system
    }

    pub fn hostname(&self) -> Option<&str> {
        self.system.hostname.as_deref()
    }

    pub fn serial(&self) -> Option<&str> {
        self.system.serial.as_deref()
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.system.ip_address.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.system.model.as_deref()
    }

    pub fn sw_version(&self) -> Option<&str> {
        self.system.sw_version.as_deref()
    }

    pub fn family(&self) -> ModelFamily {
        self.model().map_or(ModelFamily::Unknown, ModelFamily::from_model)
    }

    pub fn sw_version_preferred(&self) -> Option<&PreferredVersion> {
        self.sw_version_preferred.as_ref()
    }

    pub(crate) fn set_sw_version_preferred(&mut self, preferred: PreferredVersion) {
        self.sw_version_preferred = Some(preferred);
    }

    pub fn create_report_datetime(&self) -> DateTime<Local> {
        self.create_report_datetime
    }

    pub fn licenses(&self) -> &[License] {
        &self.licenses
    }

    pub fn add_license(&mut self, license: License) {
        self.licenses.push(license);
    }
}
