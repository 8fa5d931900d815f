// ── Version reconciliation ──
//
// Compares each device's installed release against the preferred release
// for its family and major.minor line.

use tracing::debug;

use crate::model::{Device, ModelFamily, PreferredVersion};
use crate::preferred::PreferredVersionTable;

/// `sw_version` with its last dot-separated segment removed.
///
/// `"10.2.3"` → `"10.2"`. `None` when there is nothing left to look up.
pub fn truncated_version(version: &str) -> Option<&str> {
    version
        .rsplit_once('.')
        .map(|(head, _)| head)
        .filter(|head| !head.is_empty())
}

/// Result of looking one model/version pair up in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Preferred(PreferredVersion),
    /// Model prefix maps to no known family.
    UnmappedFamily,
    /// Version has no major.minor part to look up.
    UnusableVersion,
    /// Family or version line is absent from the table.
    NotInTable { family: ModelFamily, key: String },
}

impl Reconciliation {
    pub fn preferred(&self) -> Option<&PreferredVersion> {
        match self {
            Self::Preferred(preferred) => Some(preferred),
            Self::UnmappedFamily | Self::UnusableVersion | Self::NotInTable { .. } => None,
        }
    }
}

/// Look up the preferred release for a model and installed version.
pub fn lookup(model: &str, sw_version: &str, table: &PreferredVersionTable) -> Reconciliation {
    let family = ModelFamily::from_model(model);
    let Some(label) = family.label() else {
        return Reconciliation::UnmappedFamily;
    };
    let Some(key) = truncated_version(sw_version) else {
        return Reconciliation::UnusableVersion;
    };
    match table.preferred(label, key) {
        Some(candidate) if candidate == sw_version => {
            Reconciliation::Preferred(PreferredVersion::UpToDate)
        }
        Some(candidate) => Reconciliation::Preferred(PreferredVersion::Release(candidate.to_owned())),
        None => Reconciliation::NotInTable {
            family,
            key: key.to_owned(),
        },
    }
}

/// Annotate every device with its preferred release.
///
/// Devices whose family, version line, or model/version data is missing
/// from the table keep `sw_version_preferred` unset.
pub fn reconcile(devices: &mut [Device], table: &PreferredVersionTable) {
    for device in devices.iter_mut() {
        let (Some(model), Some(version)) = (device.model(), device.sw_version()) else {
            debug!(hostname = ?device.hostname(), "no model or version to reconcile");
            continue;
        };
        match lookup(model, version, table) {
            Reconciliation::Preferred(preferred) => {
                debug!(hostname = ?device.hostname(), %preferred, "reconciled");
                device.set_sw_version_preferred(preferred);
            }
            outcome => debug!(hostname = ?device.hostname(), ?outcome, "no preferred version"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::SystemInfo;

    fn table() -> PreferredVersionTable {
        let mut table = PreferredVersionTable::new();
        table.extend("PAN-OS for Firewalls", "10.2", ["10.2.9".to_owned()]);
        table.extend("Panorama on VM / M-series", "11.1", ["11.1.4-h7".to_owned()]);
        table
    }

    fn device(model: &str, version: &str) -> Device {
        Device::new(SystemInfo {
            model: Some(model.into()),
            sw_version: Some(version.into()),
            ..SystemInfo::default()
        })
    }

    #[test]
    fn truncation() {
        assert_eq!(truncated_version("10.2.3"), Some("10.2"));
        assert_eq!(truncated_version("10.2.3-h4"), Some("10.2"));
        assert_eq!(truncated_version("11.1"), Some("11"));
        assert_eq!(truncated_version("10"), None);
        assert_eq!(truncated_version(".3"), None);
        assert_eq!(truncated_version(""), None);
    }

    #[test]
    fn older_release_gets_candidate() {
        let mut devices = vec![device("PA-440", "10.2.3")];
        reconcile(&mut devices, &table());
        assert_eq!(
            devices[0].sw_version_preferred(),
            Some(&PreferredVersion::Release("10.2.9".into()))
        );
    }

    #[test]
    fn matching_release_is_up_to_date() {
        let mut devices = vec![device("PA-440", "10.2.9")];
        reconcile(&mut devices, &table());
        assert_eq!(
            devices[0].sw_version_preferred(),
            Some(&PreferredVersion::UpToDate)
        );
        assert_eq!(devices[0].sw_version_preferred().unwrap().to_string(), "up to date");
    }

    #[test]
    fn panorama_family() {
        let mut devices = vec![device("VM100", "11.1.2")];
        reconcile(&mut devices, &table());
        assert_eq!(
            devices[0].sw_version_preferred(),
            Some(&PreferredVersion::Release("11.1.4-h7".into()))
        );
    }

    #[test]
    fn unmapped_or_absent_stays_unset() {
        let mut devices = vec![
            device("XX100", "10.2.3"),
            device("PA-440", "9.1.0"),
            device("VM100", "10.2.3"),
            device("PA-440", "10"),
            Device::new(SystemInfo::default()),
        ];
        reconcile(&mut devices, &table());
        assert!(devices.iter().all(|d| d.sw_version_preferred().is_none()));
    }

    #[test]
    fn lookup_outcomes() {
        let table = table();
        assert_eq!(lookup("XX100", "10.2.3", &table), Reconciliation::UnmappedFamily);
        assert_eq!(lookup("PA-440", "10", &table), Reconciliation::UnusableVersion);
        assert_eq!(
            lookup("PA-440", "9.1.0", &table),
            Reconciliation::NotInTable {
                family: ModelFamily::PanOsFirewall,
                key: "9.1".into()
            }
        );
        assert!(lookup("PA-440", "10.2.1", &table).preferred().is_some());
    }
}
