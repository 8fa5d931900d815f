#![allow(clippy::unwrap_used)]
// End-to-end fleet runs against wiremock appliances.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::SecretString;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use panfleet_api::{ApiKey, PanosClient, Scheme, TransportConfig};
use panfleet_core::{
    CoreError, Credentials, Fleet, MemoryLog, PreferredVersion, PreferredVersionTable, collect,
    reconcile,
};
use tokio_util::sync::CancellationToken;

const SYSTEM_INFO: &str = "<show><system><info></info></system></show>";
const LICENSE_INFO: &str = "<request><license><info></info></license></request>";

// Nothing listens on the discard port in the test environment.
const UNREACHABLE: &str = "127.0.0.1:9";

// ── Helpers ─────────────────────────────────────────────────────────

fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_owned(), "application/xml")
}

fn system_body(hostname: &str, model: &str, version: &str) -> String {
    format!(
        r#"<response status="success"><result><system>
            <hostname>{hostname}</hostname><ip-address>10.0.0.1</ip-address>
            <model>{model}</model><serial>0123456789</serial>
            <sw-version>{version}</sw-version>
        </system></result></response>"#
    )
}

const TWO_LICENSES: &str = r#"<response status="success"><result><licenses>
    <entry><feature>Threat Prevention</feature><issued>March 3, 2024</issued><expired>no</expired></entry>
    <entry><feature>WildFire License</feature><issued>January 15, 2023</issued><expired>yes</expired></entry>
</licenses></result></response>"#;

async fn mount_keygen(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(query_param("type", "keygen"))
        .respond_with(xml(
            r#"<response status="success"><result><key>KEY-1</key></result></response>"#,
        ))
        .mount(server)
        .await;
}

async fn mount_op(server: &MockServer, cmd: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(query_param("type", "op"))
        .and(query_param("cmd", cmd))
        .and(query_param("key", "KEY-1"))
        .respond_with(response)
        .mount(server)
        .await;
}

/// An appliance that answers keygen, system info, and license info.
async fn appliance(hostname: &str, version: &str) -> MockServer {
    let server = MockServer::start().await;
    mount_keygen(&server).await;
    mount_op(&server, SYSTEM_INFO, xml(&system_body(hostname, "PA-440", version))).await;
    mount_op(&server, LICENSE_INFO, xml(TWO_LICENSES)).await;
    server
}

fn fleet(log: &Arc<MemoryLog>) -> Fleet {
    let credentials = Credentials::new(
        Some("admin".into()),
        Some(SecretString::from("pw".to_owned())),
    )
    .unwrap();
    let transport = TransportConfig::default()
        .with_scheme(Scheme::Http)
        .with_timeout(Duration::from_secs(2));
    Fleet::new(
        credentials,
        vec![SYSTEM_INFO.to_owned(), LICENSE_INFO.to_owned()],
        &transport,
    )
    .unwrap()
    .with_log(log.clone())
}

fn address(server: &MockServer) -> String {
    server.address().to_string()
}

// ── Collector ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_collect_keeps_only_non_empty_results() {
    let server = MockServer::start().await;
    mount_op(&server, SYSTEM_INFO, xml(&system_body("fw01", "PA-440", "10.2.3"))).await;
    mount_op(&server, LICENSE_INFO, ResponseTemplate::new(500)).await;
    mount_op(
        &server,
        "<show><jobs><all/></jobs></show>",
        xml(r#"<response status="success"><result/></response>"#),
    )
    .await;
    mount_op(
        &server,
        "<show><clock/></show>",
        xml(r#"<response status="error"><msg>bad command</msg></response>"#),
    )
    .await;

    let transport = TransportConfig::default().with_scheme(Scheme::Http);
    let client = PanosClient::new(&address(&server), &transport).unwrap();
    let endpoints: Vec<String> = [
        SYSTEM_INFO,
        LICENSE_INFO,
        "<show><jobs><all/></jobs></show>",
        "<show><clock/></show>",
    ]
    .map(str::to_owned)
    .to_vec();
    let log = MemoryLog::new();

    let fragments = collect(
        &client,
        &ApiKey::new("KEY-1"),
        &endpoints,
        &CancellationToken::new(),
        &log,
    )
    .await;

    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].endpoint(), SYSTEM_INFO);
    assert!(fragments[0].system().is_some());
    assert_eq!(log.infos(), [format!("Data retrieved from {SYSTEM_INFO}")]);
    assert_eq!(log.errors().len(), 3);
}

// ── Runs ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_one_good_one_unreachable() {
    let server = appliance("fw01", "10.2.3").await;
    let log = Arc::new(MemoryLog::new());

    let addresses = vec![address(&server), UNREACHABLE.to_owned()];
    let devices = fleet(&log).run(&addresses).await.unwrap();

    assert_eq!(devices.len(), 1);
    let device = &devices[0];
    assert_eq!(device.hostname(), Some("fw01"));
    assert_eq!(device.serial(), Some("0123456789"));
    assert_eq!(device.licenses().len(), 2);
    assert_eq!(device.licenses()[0].issued_display(), "03/03/2024");
    assert!(device.licenses()[1].is_expired());
    assert!(device.sw_version_preferred().is_none());

    assert!(
        log.errors()
            .contains(&format!("Failed to generate API key for {UNREACHABLE}"))
    );
    let infos = log.infos();
    assert_eq!(
        infos.first().map(String::as_str),
        Some("Start the process of retrieving device information of 2")
    );
    assert!(infos.contains(&format!("API key successfully generated for {}", address(&server))));
    assert!(infos.contains(&"Number of devices processed: 1".to_owned()));
    assert_eq!(
        infos.last().map(String::as_str),
        Some("End of the process of retrieving device information.")
    );
}

#[tokio::test]
async fn test_empty_address_list() {
    let log = Arc::new(MemoryLog::new());
    let devices = fleet(&log).run(&[]).await.unwrap();
    assert!(devices.is_empty());
    assert_eq!(log.errors(), ["No devices were processed."]);
}

#[tokio::test]
async fn test_failed_license_endpoint_keeps_device() {
    let server = MockServer::start().await;
    mount_keygen(&server).await;
    mount_op(&server, SYSTEM_INFO, xml(&system_body("fw01", "PA-440", "10.2.3"))).await;
    mount_op(&server, LICENSE_INFO, ResponseTemplate::new(500)).await;
    let log = Arc::new(MemoryLog::new());

    let devices = fleet(&log).run(&[address(&server)]).await.unwrap();

    assert_eq!(devices.len(), 1);
    assert!(devices[0].licenses().is_empty());
    assert_eq!(
        log.errors(),
        [format!("Request failed ({}) for {LICENSE_INFO}", address(&server))]
    );
}

#[tokio::test]
async fn test_missing_system_info_drops_device() {
    let server = MockServer::start().await;
    mount_keygen(&server).await;
    mount_op(
        &server,
        SYSTEM_INFO,
        xml(r#"<response status="success"><result/></response>"#),
    )
    .await;
    mount_op(&server, LICENSE_INFO, xml(TWO_LICENSES)).await;
    let log = Arc::new(MemoryLog::new());

    let devices = fleet(&log).run(&[address(&server)]).await.unwrap();

    assert!(devices.is_empty());
    let addr = address(&server);
    assert_eq!(
        log.errors(),
        [
            format!("No data retrieved ({addr}) from {SYSTEM_INFO}"),
            format!("Failed to process device information for {addr}"),
            "No devices were processed.".to_owned(),
        ]
    );
}

#[tokio::test]
async fn test_rejected_credentials_skip_collection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("type", "keygen"))
        .respond_with(xml(
            r#"<response status="error"><result><msg>Invalid Credential</msg></result></response>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("type", "op"))
        .respond_with(xml(TWO_LICENSES))
        .expect(0)
        .mount(&server)
        .await;
    let log = Arc::new(MemoryLog::new());

    let devices = fleet(&log).run(&[address(&server)]).await.unwrap();
    assert!(devices.is_empty());
}

#[tokio::test]
async fn test_unreadable_license_date_aborts_run() {
    let server = MockServer::start().await;
    mount_keygen(&server).await;
    mount_op(&server, SYSTEM_INFO, xml(&system_body("fw01", "PA-440", "10.2.3"))).await;
    mount_op(
        &server,
        LICENSE_INFO,
        xml(
            r#"<response status="success"><result><licenses><entry>
                <feature>Threat Prevention</feature><issued>2024-03-03</issued><expired>no</expired>
            </entry></licenses></result></response>"#,
        ),
    )
    .await;
    let log = Arc::new(MemoryLog::new());

    let err = fleet(&log).run(&[address(&server)]).await.unwrap_err();
    match err {
        CoreError::DataIntegrity { address: addr, .. } => assert_eq!(addr, address(&server)),
        other => panic!("expected DataIntegrity, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_run_keeps_input_order() {
    let slow = MockServer::start().await;
    mount_keygen(&slow).await;
    mount_op(
        &slow,
        SYSTEM_INFO,
        xml(&system_body("slow", "PA-440", "10.2.3")).set_delay(Duration::from_millis(300)),
    )
    .await;
    mount_op(&slow, LICENSE_INFO, xml(TWO_LICENSES)).await;
    let fast = appliance("fast", "10.2.3").await;
    let other = appliance("other", "11.1.2").await;
    let log = Arc::new(MemoryLog::new());

    let addresses = vec![address(&slow), address(&fast), address(&other)];
    let devices = fleet(&log)
        .with_concurrency(3)
        .run(&addresses)
        .await
        .unwrap();

    let hostnames: Vec<_> = devices.iter().filter_map(|d| d.hostname()).collect();
    assert_eq!(hostnames, ["slow", "fast", "other"]);
}

#[tokio::test]
async fn test_progress_reports_each_address() {
    let server = appliance("fw01", "10.2.3").await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let log = Arc::new(MemoryLog::new());

    let addresses = vec![address(&server), UNREACHABLE.to_owned()];
    fleet(&log)
        .with_progress(move |i, n, addr| sink.lock().unwrap().push((i, n, addr.to_owned())))
        .run(&addresses)
        .await
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        [(1, 2, address(&server)), (2, 2, UNREACHABLE.to_owned())]
    );
}

#[tokio::test]
async fn test_run_then_reconcile() {
    let behind = appliance("fw01", "10.2.3").await;
    let current = appliance("fw02", "10.2.9").await;
    let log = Arc::new(MemoryLog::new());

    let mut devices = fleet(&log)
        .run(&[address(&behind), address(&current)])
        .await
        .unwrap();
    let table = PreferredVersionTable::from_json(
        r#"[{"PAN-OS for Firewalls": {"10.2": ["10.2.9", "10.2.8"]}}]"#,
    )
    .unwrap();
    reconcile(&mut devices, &table);

    assert_eq!(
        devices[0].sw_version_preferred(),
        Some(&PreferredVersion::Release("10.2.9".into()))
    );
    assert_eq!(
        devices[1].sw_version_preferred(),
        Some(&PreferredVersion::UpToDate)
    );
}
