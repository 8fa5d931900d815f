// ── Report output ──
//
// One CSV row per device: scalar attributes first, then a
// `license_{i}_{feature,issued,expired}` triple per license slot. The
// number of slots is the largest license count in the batch.

use std::io;
use std::path::Path;

use csv::Writer;

use crate::error::CoreError;
use crate::model::{Device, License};

/// Scalar columns, in output order.
pub const SCALAR_COLUMNS: [&str; 14] = [
    "ip_address",
    "hostname",
    "model",
    "sw_version",
    "sw_version_preferred",
    "serial",
    "global_protect_client_package_version",
    "app_version",
    "av_version",
    "threat_version",
    "wildfire_version",
    "url_filtering_version",
    "device_certificate_status",
    "create_report_datetime",
];

const LICENSE_COLUMNS: [&str; 3] = ["feature", "issued", "expired"];

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header row for a batch whose largest license list has `max_licenses` entries.
pub fn header(max_licenses: usize) -> Vec<String> {
    let licenses = (0..max_licenses).flat_map(|i| {
        LICENSE_COLUMNS
            .iter()
            .map(move |column| format!("license_{i}_{column}"))
    });
    SCALAR_COLUMNS
        .iter()
        .map(|column| (*column).to_owned())
        .chain(licenses)
        .collect()
}

/// A device flattened to report cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    scalars: Vec<String>,
    licenses: Vec<[String; 3]>,
}

impl From<&Device> for ReportRow {
    fn from(device: &Device) -> Self {
        let system = device.system();
        let cell = |value: &Option<String>| value.clone().unwrap_or_default();
        let scalars = vec![
            cell(&system.ip_address),
            cell(&system.hostname),
            cell(&system.model),
            cell(&system.sw_version),
            device
                .sw_version_preferred()
                .map(ToString::to_string)
                .unwrap_or_default(),
            cell(&system.serial),
            cell(&system.global_protect_client_package_version),
            cell(&system.app_version),
            cell(&system.av_version),
            cell(&system.threat_version),
            cell(&system.wildfire_version),
            cell(&system.url_filtering_version),
            cell(&system.device_certificate_status),
            device
                .create_report_datetime()
                .format(DATETIME_FORMAT)
                .to_string(),
        ];
        let licenses = device.licenses().iter().map(license_cells).collect();
        Self { scalars, licenses }
    }
}

fn license_cells(license: &License) -> [String; 3] {
    [
        license.feature().to_owned(),
        license.issued_display(),
        license.is_expired().to_string(),
    ]
}

impl ReportRow {
    pub fn scalars(&self) -> &[String] {
        &self.scalars
    }

    pub fn license_count(&self) -> usize {
        self.licenses.len()
    }

    /// All cells, padded with blanks up to `max_licenses` license slots.
    pub fn into_record(self, max_licenses: usize) -> Vec<String> {
        let padding = max_licenses.saturating_sub(self.licenses.len());
        let mut record = self.scalars;
        record.extend(self.licenses.into_iter().flatten());
        record.extend(std::iter::repeat_n(String::new(), padding * LICENSE_COLUMNS.len()));
        record
    }
}

/// Write `devices` as CSV, header included.
pub fn write_csv<W: io::Write>(devices: &[Device], writer: W) -> Result<(), CoreError> {
    let rows: Vec<ReportRow> = devices.iter().map(ReportRow::from).collect();
    let max_licenses = rows.iter().map(ReportRow::license_count).max().unwrap_or(0);

    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(header(max_licenses))?;
    for row in rows {
        wtr.write_record(row.into_record(max_licenses))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the report to `path`, creating parent directories as needed.
pub fn write_report(devices: &[Device], path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv(devices, io::BufWriter::new(file))
}
