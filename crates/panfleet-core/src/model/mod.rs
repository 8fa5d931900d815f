// ── Domain model ──
//
// Canonical types produced by the assembler and annotated by the
// reconciler. Raw values from the appliance are kept verbatim; only the
// license issue date and expiry flag are normalized.

pub mod device;
pub mod family;
pub mod license;

pub use device::{Device, PreferredVersion, SystemInfo};
pub use family::ModelFamily;
pub use license::License;
