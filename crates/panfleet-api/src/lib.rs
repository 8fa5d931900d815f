//! Async client for the PAN-OS XML management API.
//!
//! Firewalls and Panorama appliances expose a single `/api/` endpoint that
//! takes a `type` query parameter. This crate covers the two request types
//! the fleet collector needs:
//!
//! - **keygen** -- exchange a username/password for an API key
//!   ([`PanosClient::provision_key`]).
//! - **op** -- run an operational command with that key
//!   ([`PanosClient::op_url`] + [`PanosClient::send`]).
//!
//! Every response is an XML document rooted at `<response status="...">`.
//! Bodies are decoded into the loosely-typed [`ParsedValue`] tree, and
//! [`check_response`] decides whether the envelope reports success.

pub mod client;
pub mod error;
pub mod keygen;
pub mod transport;
pub mod xml;

pub use client::{PanosClient, check_response, redact_url};
pub use error::Error;
pub use keygen::ApiKey;
pub use transport::{Scheme, TlsMode, TransportConfig};
pub use xml::ParsedValue;
