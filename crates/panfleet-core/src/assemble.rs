// ── Device record assembly ──
//
// Folds the fragments collected from one appliance into a `Device`.
// Fragments arrive in endpoint order, which the protocol does not fix, so
// the fold only relies on one thing: a license needs a device to attach to.

use panfleet_api::ParsedValue;
use tracing::debug;

use crate::collect::Fragment;
use crate::error::AssemblyError;
use crate::model::{Device, License, SystemInfo};

/// Build a device from `fragments`.
///
/// - a `system` block starts a new device (the last one seen wins)
/// - `licenses.entry` items attach to the current device; items seen
///   before any `system` block are dropped
/// - within one fragment, `system` is applied before `licenses`
///
/// Returns `Ok(None)` when no `system` block was seen at all. A license
/// whose issue date does not parse is an error.
pub fn assemble(fragments: &[Fragment]) -> Result<Option<Device>, AssemblyError> {
    let mut device: Option<Device> = None;

    for fragment in fragments {
        if let Some(system) = fragment.system() {
            if device.is_some() {
                debug!(endpoint = fragment.endpoint(), "replacing earlier system block");
            }
            device = Some(Device::new(SystemInfo::from_element(system)));
        }

        if let Some(entries) = fragment.license_entries() {
            match device.as_mut() {
                Some(device) => {
                    for entry in entries {
                        device.add_license(license_from_entry(entry)?);
                    }
                }
                None => debug!(
                    endpoint = fragment.endpoint(),
                    dropped = entries.len(),
                    "license entries before any system block"
                ),
            }
        }
    }

    Ok(device)
}

fn license_from_entry(entry: &ParsedValue) -> Result<License, AssemblyError> {
    License::from_raw(
        entry.text_at("feature"),
        entry.text_at("issued"),
        entry.text_at("expired"),
    )
}
