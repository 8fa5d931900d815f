// ── Fleet orchestrator ──
//
// Drives keygen → collect → assemble for every address in a run and
// accumulates the devices that made it through. One HTTP connection pool
// is shared by every appliance client of a run.

use std::sync::Arc;

use futures_util::{StreamExt, TryStreamExt, stream};
use panfleet_api::{PanosClient, Scheme, TransportConfig};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::assemble::assemble;
use crate::collect::collect;
use crate::config::Credentials;
use crate::error::CoreError;
use crate::log::{RunLog, TracingLog};
use crate::model::Device;

/// Called before each address is polled with `(position, total, address)`.
/// Positions are 1-based.
pub type ProgressFn = dyn Fn(usize, usize, &str) + Send + Sync;

/// How far one address got.
#[derive(Debug)]
pub enum DeviceOutcome {
    Assembled(Device),
    /// No API key: bad address, unreachable, or rejected credentials.
    KeyFailed,
    /// Key obtained, but no system-info block came back.
    AssemblyFailed,
    /// The run was cancelled before this address finished.
    Cancelled,
}

impl DeviceOutcome {
    pub fn into_device(self) -> Option<Device> {
        match self {
            Self::Assembled(device) => Some(device),
            Self::KeyFailed | Self::AssemblyFailed | Self::Cancelled => None,
        }
    }
}

/// A configured collection run over a list of appliance addresses.
pub struct Fleet {
    http: reqwest::Client,
    scheme: Scheme,
    credentials: Credentials,
    endpoints: Vec<String>,
    log: Arc<dyn RunLog>,
    concurrency: usize,
    cancel: CancellationToken,
    progress: Option<Box<ProgressFn>>,
}

impl Fleet {
    pub fn new(
        credentials: Credentials,
        endpoints: Vec<String>,
        transport: &TransportConfig,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            http: transport.build_client()?,
            scheme: transport.scheme,
            credentials,
            endpoints,
            log: Arc::new(TracingLog),
            concurrency: 1,
            cancel: CancellationToken::new(),
            progress: None,
        })
    }

    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn RunLog>) -> Self {
        self.log = log;
        self
    }

    /// Poll up to `limit` appliances at once. Output order is unaffected.
    #[must_use]
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: impl Fn(usize, usize, &str) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Process every address and return the assembled devices in input order.
    ///
    /// Per-address failures are logged and skipped. A license entry with an
    /// unreadable issue date aborts the whole run with
    /// [`CoreError::DataIntegrity`]. On cancellation, the devices finished so
    /// far are returned.
    pub async fn run(&self, addresses: &[String]) -> Result<Vec<Device>, CoreError> {
        let total = addresses.len();
        self.log.info(&format!(
            "Start the process of retrieving device information of {total}"
        ));

        let outcomes: Vec<DeviceOutcome> = stream::iter(addresses.iter().enumerate())
            .map(|(index, address)| self.process(index + 1, total, address))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let devices: Vec<Device> = outcomes
            .into_iter()
            .filter_map(DeviceOutcome::into_device)
            .collect();

        if devices.is_empty() {
            self.log.error("No devices were processed.");
        } else {
            self.log
                .info(&format!("Number of devices processed: {}", devices.len()));
        }
        self.log
            .info("End of the process of retrieving device information.");
        Ok(devices)
    }

    /// Run one address through keygen, collection, and assembly.
    pub async fn process(
        &self,
        position: usize,
        total: usize,
        address: &str,
    ) -> Result<DeviceOutcome, CoreError> {
        if self.cancel.is_cancelled() {
            return Ok(DeviceOutcome::Cancelled);
        }
        if let Some(progress) = &self.progress {
            progress(position, total, address);
        }
        self.log.info(&format!("Starting process for: {address}"));

        let client = match PanosClient::with_client(self.http.clone(), address, self.scheme) {
            Ok(client) => client,
            Err(e) => {
                debug!(address, error = %e, "unusable address");
                self.log
                    .error(&format!("Failed to generate API key for {address}"));
                return Ok(DeviceOutcome::KeyFailed);
            }
        };

        let provisioned = self
            .cancel
            .run_until_cancelled(
                client.provision_key(self.credentials.username(), self.credentials.password()),
            )
            .await;
        let key = match provisioned {
            None => return Ok(DeviceOutcome::Cancelled),
            Some(None) => {
                self.log
                    .error(&format!("Failed to generate API key for {address}"));
                return Ok(DeviceOutcome::KeyFailed);
            }
            Some(Some(key)) => key,
        };
        self.log
            .info(&format!("API key successfully generated for {address}"));

        let fragments = collect(
            &client,
            &key,
            &self.endpoints,
            &self.cancel,
            self.log.as_ref(),
        )
        .await;
        if self.cancel.is_cancelled() {
            debug!(address, "dropping partial collection");
            return Ok(DeviceOutcome::Cancelled);
        }

        match assemble(&fragments) {
            Ok(Some(device)) => {
                self.log
                    .info(&format!("Device information processed for {address}"));
                Ok(DeviceOutcome::Assembled(device))
            }
            Ok(None) => {
                self.log.error(&format!(
                    "Failed to process device information for {address}"
                ));
                Ok(DeviceOutcome::AssemblyFailed)
            }
            Err(source) => Err(CoreError::DataIntegrity {
                address: address.to_owned(),
                source,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn fleet() -> Fleet {
        let credentials = Credentials::new(
            Some("admin".into()),
            Some(SecretString::from("pw".to_owned())),
        )
        .unwrap();
        Fleet::new(credentials, vec!["<cmd/>".into()], &TransportConfig::default()).unwrap()
    }

    #[test]
    fn concurrency_is_at_least_one() {
        assert_eq!(fleet().concurrency(), 1);
        assert_eq!(fleet().with_concurrency(0).concurrency(), 1);
        assert_eq!(fleet().with_concurrency(8).concurrency(), 8);
    }

    #[test]
    fn keeps_endpoints_in_order() {
        assert_eq!(fleet().endpoints(), ["<cmd/>"]);
    }

    #[tokio::test]
    async fn empty_address_list_logs_no_devices() {
        let log = Arc::new(crate::MemoryLog::new());
        let fleet = fleet().with_log(log.clone());

        let devices = fleet.run(&[]).await.unwrap();
        assert!(devices.is_empty());
        assert_eq!(log.errors(), ["No devices were processed."]);
    }

    #[tokio::test]
    async fn cancelled_run_makes_no_requests() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let log = Arc::new(crate::MemoryLog::new());
        let fleet = fleet().with_log(log.clone()).with_cancellation(cancel);

        let devices = fleet.run(&["10.0.0.1".into()]).await.unwrap();
        assert!(devices.is_empty());
        assert!(!log.infos().iter().any(|m| m.starts_with("Starting process")));
    }

    #[test]
    fn outcome_into_device() {
        assert!(DeviceOutcome::KeyFailed.into_device().is_none());
        assert!(DeviceOutcome::Cancelled.into_device().is_none());
        let device = Device::new(crate::SystemInfo::default());
        assert!(DeviceOutcome::Assembled(device).into_device().is_some());
    }
}
