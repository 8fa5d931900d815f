//! `panfleet reconcile`: one-off preferred-release lookup.

use panfleet_config::Settings;
use panfleet_core::{ModelFamily, Reconciliation, lookup, truncated_version};
use serde::Serialize;

use crate::cli::{GlobalOpts, ReconcileArgs};
use crate::error::CliError;
use crate::output;

use super::load_table;

#[derive(Debug, Serialize)]
struct Lookup {
    model: String,
    sw_version: String,
    family: Option<&'static str>,
    version_key: Option<String>,
    sw_version_preferred: Option<String>,
    outcome: &'static str,
}

impl Lookup {
    fn new(model: &str, sw_version: &str, result: &Reconciliation) -> Self {
        let outcome = match result {
            Reconciliation::Preferred(_) => "found",
            Reconciliation::UnmappedFamily => "unmapped family",
            Reconciliation::UnusableVersion => "unusable version",
            Reconciliation::NotInTable { .. } => "not in table",
        };
        Self {
            model: model.to_owned(),
            sw_version: sw_version.to_owned(),
            family: ModelFamily::from_model(model).label(),
            version_key: truncated_version(sw_version).map(str::to_owned),
            sw_version_preferred: result.preferred().map(ToString::to_string),
            outcome,
        }
    }
}

fn detail(l: &Lookup) -> String {
    [
        format!("Model:     {}", l.model),
        format!("Version:   {}", l.sw_version),
        format!("Family:    {}", l.family.unwrap_or("-")),
        format!("Line:      {}", l.version_key.as_deref().unwrap_or("-")),
        format!(
            "Preferred: {}",
            l.sw_version_preferred.as_deref().unwrap_or("-")
        ),
        format!("Outcome:   {}", l.outcome),
    ]
    .join("\n")
}

pub fn handle(args: &ReconcileArgs, settings: &Settings, global: &GlobalOpts) -> Result<(), CliError> {
    let path = args
        .preferred
        .as_ref()
        .or(settings.preferred_table.as_ref())
        .ok_or_else(|| CliError::Validation {
            field: "--preferred".into(),
            reason: "no preferred-version table given".into(),
        })?;
    let (_, table) = load_table(path)?;

    let result = lookup(&args.model, &args.sw_version, &table);
    let view = Lookup::new(&args.model, &args.sw_version, &result);

    let out = output::render_single(&global.output, &view, detail, |l| {
        l.sw_version_preferred.clone().unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
