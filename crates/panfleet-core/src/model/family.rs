// ── Model family ──

use serde::Serialize;
use strum::{Display, EnumIter};

/// Coarse device class, derived from the first two characters of the model.
///
/// The label of a known family is the key of the preferred-version table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
pub enum ModelFamily {
    /// `PA-*` hardware and VM-series firewalls.
    #[strum(to_string = "PAN-OS for Firewalls")]
    PanOsFirewall,
    /// Panorama virtual appliances and M-series.
    #[strum(to_string = "Panorama on VM / M-series")]
    Panorama,
    #[strum(to_string = "unknown")]
    Unknown,
}

impl ModelFamily {
    pub fn from_model(model: &str) -> Self {
        match model.get(..2) {
            Some("PA") => Self::PanOsFirewall,
            Some("VM") => Self::Panorama,
            _ => Self::Unknown,
        }
    }

    /// Table key for this family, `None` for [`Unknown`](Self::Unknown).
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::PanOsFirewall => Some("PAN-OS for Firewalls"),
            Self::Panorama => Some("Panorama on VM / M-series"),
            Self::Unknown => None,
        }
    }
}
