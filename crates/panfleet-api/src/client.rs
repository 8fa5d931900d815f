// PAN-OS XML API client
//
// Wraps `reqwest::Client` with per-appliance URL construction and
// envelope checking. One client talks to one appliance; the fleet
// collector builds a fresh one per address.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, trace};
use url::Url;

use crate::error::Error;
use crate::keygen::ApiKey;
use crate::transport::{Scheme, TransportConfig};
use crate::xml::ParsedValue;

/// Query parameters whose values never reach a log line.
const SECRET_PARAMS: [&str; 2] = ["password", "key"];

/// `true` iff the envelope's `response.@status` is exactly `success`.
///
/// Appliances report application errors with HTTP 200 and
/// `status="error"`, so a successful transport says nothing on its own.
pub fn check_response(envelope: &ParsedValue) -> bool {
    envelope.path(&["response", "@status"]).and_then(ParsedValue::as_text) == Some("success")
}

/// Copy of `url` with credential-bearing query values masked.
pub fn redact_url(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if SECRET_PARAMS.contains(&k.as_ref()) {
                "***".to_owned()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

/// Best-effort error text from a failed envelope.
///
/// PAN-OS puts it at `response.msg`, `response.result.msg`, or splits it
/// over several `<line>` children of either.
fn envelope_message(envelope: &ParsedValue) -> String {
    let msg = envelope
        .path(&["response", "msg"])
        .or_else(|| envelope.path(&["response", "result", "msg"]));
    let Some(msg) = msg else {
        return "no message".into();
    };
    if let Some(text) = msg.as_text() {
        return text.to_owned();
    }
    msg.get("line")
        .map(|lines| {
            lines
                .items()
                .iter()
                .filter_map(ParsedValue::as_text)
                .collect::<Vec<_>>()
                .join("; ")
        })
        .filter(|joined| !joined.is_empty())
        .unwrap_or_else(|| "no message".into())
}

/// HTTP client bound to a single appliance.
pub struct PanosClient {
    http: reqwest::Client,
    base_url: Url,
    address: String,
}

impl PanosClient {
    /// Create a client for `address` (host or `host:port`) from a `TransportConfig`.
    pub fn new(address: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, address, transport.scheme)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// Lets one connection pool serve every appliance in a run.
    pub fn with_client(
        http: reqwest::Client,
        address: &str,
        scheme: Scheme,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("{scheme}://{address}/"))?;
        Ok(Self {
            http,
            base_url,
            address: address.to_owned(),
        })
    }

    /// The appliance address this client was built for.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn api_url(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        url.set_path("/api/");
        url.query_pairs_mut().clear().extend_pairs(params);
        url
    }

    /// `{scheme}://{address}/api/?type=keygen&user={u}&password={p}`
    pub fn keygen_url(&self, username: &str, password: &SecretString) -> Url {
        self.api_url(&[
            ("type", "keygen"),
            ("user", username),
            ("password", password.expose_secret()),
        ])
    }

    /// `{scheme}://{address}/api/?type=op&cmd={cmd}&key={key}`
    ///
    /// `cmd` is forwarded verbatim (percent-encoded); it is usually an XML
    /// fragment such as `<show><system><info></info></system></show>`.
    pub fn op_url(&self, cmd: &str, key: &ApiKey) -> Url {
        self.api_url(&[("type", "op"), ("cmd", cmd), ("key", key.expose())])
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// POST `url` and decode a successful envelope.
    ///
    /// Errors are returned untouched; see [`send`](Self::send) for the
    /// logging variant.
    pub async fn request(&self, url: Url) -> Result<ParsedValue, Error> {
        let shown = redact_url(&url);
        debug!(url = %shown, "POST");

        let resp = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| Error::Transport(e.without_url()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: shown,
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Transport(e.without_url()))?;
        trace!(bytes = body.len(), "response body received");

        let envelope = ParsedValue::from_xml(&body)?;
        if !check_response(&envelope) {
            let status = envelope
                .path(&["response", "@status"])
                .and_then(ParsedValue::as_text)
                .unwrap_or("missing")
                .to_owned();
            return Err(Error::Status {
                status,
                message: envelope_message(&envelope),
            });
        }
        Ok(envelope)
    }

    /// POST `url`; `None` on any transport, decoding, or envelope failure.
    ///
    /// The failure is logged with the (redacted) URL and its cause.
    pub async fn send(&self, url: Url) -> Option<ParsedValue> {
        let shown = redact_url(&url);
        match self.request(url).await {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                error!(address = %self.address, url = %shown, error = %e, "request failed");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn envelope(xml: &str) -> ParsedValue {
        ParsedValue::from_xml(xml).unwrap()
    }

    #[test]
    fn check_response_requires_success_status() {
        assert!(check_response(&envelope(
            r#"<response status="success"><result/></response>"#
        )));
        assert!(!check_response(&envelope(
            r#"<response status="error"><msg>bad</msg></response>"#
        )));
        assert!(!check_response(&envelope("<response><result/></response>")));
        assert!(!check_response(&envelope(
            r#"<reply status="success"></reply>"#
        )));
    }

    #[test]
    fn urls_embed_and_encode_parameters() {
        let client =
            PanosClient::with_client(reqwest::Client::new(), "10.0.0.1", Scheme::Https).unwrap();

        let password = SecretString::from("p&ss word".to_owned());
        let url = client.keygen_url("admin", &password);
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("10.0.0.1"));
        assert_eq!(url.path(), "/api/");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            [
                ("type".to_owned(), "keygen".to_owned()),
                ("user".to_owned(), "admin".to_owned()),
                ("password".to_owned(), "p&ss word".to_owned()),
            ]
        );

        let key = ApiKey::new("KEY123");
        let url = client.op_url("<show><system><info></info></system></show>", &key);
        let cmd = url
            .query_pairs()
            .find(|(k, _)| k == "cmd")
            .map(|(_, v)| v.into_owned());
        assert_eq!(
            cmd.as_deref(),
            Some("<show><system><info></info></system></show>")
        );
    }

    #[test]
    fn redaction_masks_secrets_only() {
        let url = Url::parse("https://fw/api/?type=keygen&user=admin&password=hunter2").unwrap();
        let shown = redact_url(&url);
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("user=admin"));

        let url = Url::parse("https://fw/api/?type=op&cmd=x&key=SECRET").unwrap();
        assert!(!redact_url(&url).contains("SECRET"));
    }

    #[test]
    fn envelope_message_variants() {
        assert_eq!(
            envelope_message(&envelope(
                r#"<response status="error"><msg>Invalid credentials.</msg></response>"#
            )),
            "Invalid credentials."
        );
        assert_eq!(
            envelope_message(&envelope(
                r#"<response status="error"><result><msg><line>a</line><line>b</line></msg></result></response>"#
            )),
            "a; b"
        );
        assert_eq!(
            envelope_message(&envelope(r#"<response status="error"/>"#)),
            "no message"
        );
    }
}
