use thiserror::Error;

/// Error type for the `panfleet-api` crate.
///
/// Callers that only care about "did this call produce usable data" go
/// through [`PanosClient::send`](crate::PanosClient::send), which logs the
/// error and collapses it to `None`.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, TLS).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The appliance answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The device address could not be turned into a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration error (unreadable or invalid CA bundle).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Envelope ────────────────────────────────────────────────────
    /// The body is not a well-formed XML document.
    #[error("XML decoding error: {0}")]
    Xml(String),

    /// The envelope decoded, but `response.@status` is not `success`.
    #[error("API returned status '{status}': {message}")]
    Status { status: String, message: String },

    /// A required element is absent from a successful envelope.
    #[error("Missing field in response: {path}")]
    MissingField { path: &'static str },
}

impl Error {
    /// Returns `true` for failures that happened before any envelope was read.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::HttpStatus { .. } | Self::InvalidUrl(_) | Self::Tls(_)
        )
    }

    /// Returns `true` if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}
