// ── Multi-endpoint collection ──
//
// Runs every configured operational command against one appliance and
// keeps the non-empty `response.result` payloads. Endpoints are opaque
// strings; the collector never looks inside a command or its result.

use panfleet_api::{ApiKey, PanosClient, ParsedValue};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::log::RunLog;

/// One endpoint's `response.result` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    endpoint: String,
    payload: ParsedValue,
}

impl Fragment {
    pub fn new(endpoint: impl Into<String>, payload: ParsedValue) -> Self {
        Self {
            endpoint: endpoint.into(),
            payload,
        }
    }

    /// The command that produced this fragment.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn payload(&self) -> &ParsedValue {
        &self.payload
    }

    /// The `system` block, if this fragment carries a non-empty one.
    pub fn system(&self) -> Option<&ParsedValue> {
        self.payload
            .get("system")
            .filter(|system| system.as_map().is_some_and(|map| !map.is_empty()))
    }

    /// The `licenses.entry` items, if this fragment carries any.
    pub fn license_entries(&self) -> Option<&[ParsedValue]> {
        self.payload
            .path(&["licenses", "entry"])
            .map(ParsedValue::items)
            .filter(|entries| !entries.is_empty())
    }
}

/// Query every endpoint once and return the fragments that came back.
///
/// A failing or empty endpoint is logged and skipped; the result holds
/// whatever subset succeeded, in endpoint order. Stops early, keeping what
/// it has, once `cancel` fires.
pub async fn collect(
    client: &PanosClient,
    key: &ApiKey,
    endpoints: &[String],
    cancel: &CancellationToken,
    log: &dyn RunLog,
) -> Vec<Fragment> {
    let address = client.address();
    let mut fragments = Vec::with_capacity(endpoints.len());

    for endpoint in endpoints {
        let url = client.op_url(endpoint, key);
        let Some(response) = cancel.run_until_cancelled(client.send(url)).await else {
            debug!(address, "collection cancelled");
            break;
        };
        let Some(envelope) = response else {
            log.error(&format!("Request failed ({address}) for {endpoint}"));
            continue;
        };

        match envelope.path(&["response", "result"]) {
            Some(result) if !result.is_empty() => {
                log.info(&format!("Data retrieved from {endpoint}"));
                fragments.push(Fragment::new(endpoint.as_str(), result.clone()));
            }
            _ => log.error(&format!("No data retrieved ({address}) from {endpoint}")),
        }
    }

    fragments
}
