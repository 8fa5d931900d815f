//! `panfleet collect`: poll the fleet, reconcile, write the report.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use panfleet_config::{Settings, read_addresses};
use panfleet_core::{Device, Fleet, TracingLog, reconcile, report};
use tabled::Tabled;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{CollectArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::load_table;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Preferred")]
    preferred: String,
    #[tabled(rename = "Licenses")]
    licenses: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        let expired = d.licenses().iter().filter(|l| l.is_expired()).count();
        let licenses = if expired == 0 {
            d.licenses().len().to_string()
        } else {
            format!("{} ({expired} expired)", d.licenses().len())
        };
        Self {
            ip: d.ip_address().unwrap_or("-").to_owned(),
            hostname: d.hostname().unwrap_or("-").to_owned(),
            model: d.model().unwrap_or("-").to_owned(),
            serial: d.serial().unwrap_or("-").to_owned(),
            version: d.sw_version().unwrap_or("-").to_owned(),
            preferred: d
                .sw_version_preferred()
                .map_or_else(|| "-".to_owned(), ToString::to_string),
            licenses,
        }
    }
}

// ── Progress ────────────────────────────────────────────────────────

fn progress_bar(total: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing in-flight requests");
            token.cancel();
        }
    });
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    args: CollectArgs,
    settings: Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    if !args.ips.is_file() {
        return Err(CliError::NoInput {
            what: "Address file",
            path: args.ips,
        });
    }
    let addresses = read_addresses(&args.ips)?;
    let credentials = settings.credentials()?;
    let endpoints = settings.endpoints();
    if endpoints.is_empty() {
        return Err(CliError::Validation {
            field: "URIS".into(),
            reason: "no operational commands configured".into(),
        });
    }

    // Load the table up front so a bad path fails before any polling.
    let table = match args.preferred.as_ref().or(settings.preferred_table.as_ref()) {
        Some(path) => Some(load_table(path)?),
        None => None,
    };

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let pb = progress_bar(addresses.len(), global.quiet);
    let progress = pb.clone();
    let fleet = Fleet::new(credentials, endpoints, &settings.transport())?
        .with_log(Arc::new(TracingLog))
        .with_concurrency(args.concurrency.unwrap_or(settings.concurrency))
        .with_cancellation(cancel.clone())
        .with_progress(move |position, total, address| {
            progress.set_position(u64::try_from(position - 1).unwrap_or(0));
            progress.set_message(format!("Processing device {position} of {total}: {address}"));
        });

    let result = fleet.run(&addresses).await;
    pb.finish_and_clear();
    let mut devices = result?;

    if cancel.is_cancelled() {
        output::warn(
            &format!("interrupted: {} of {} devices collected", devices.len(), addresses.len()),
            color,
            global.quiet,
        );
    }

    match table {
        Some((path, table)) => {
            info!(path = %path.display(), "reconciling against preferred versions");
            reconcile(&mut devices, &table);
        }
        None => output::warn(
            "no preferred-version table given; sw_version_preferred left empty",
            color,
            global.quiet,
        ),
    }

    if let Some(path) = args.report.as_ref().or(settings.output.as_ref()) {
        report::write_report(&devices, path)?;
        info!(path = %path.display(), devices = devices.len(), "report written");
        output::note(
            &format!("Report written to {} ({} devices)", path.display(), devices.len()),
            color,
            global.quiet,
        );
    }

    let out = output::render_list(&global.output, &devices, |d| DeviceRow::from(d), |d| {
        d.ip_address().unwrap_or_default().to_owned()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
