// API key provisioning
//
// `type=keygen` trades a username/password for a key that authenticates
// every later call. One attempt per appliance; no retries.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info};

use crate::client::PanosClient;
use crate::error::Error;
use crate::xml::ParsedValue;

/// An appliance API key. Never printed by `Debug`.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// The raw key, for embedding in a request URL.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Pull the key out of a keygen envelope at `response.result.key`.
pub fn extract_key(envelope: &ParsedValue) -> Result<ApiKey, Error> {
    envelope
        .path(&["response", "result", "key"])
        .and_then(ParsedValue::as_text)
        .filter(|key| !key.is_empty())
        .map(ApiKey::new)
        .ok_or(Error::MissingField {
            path: "response.result.key",
        })
}

impl PanosClient {
    /// Exchange credentials for an API key.
    ///
    /// `POST /api/?type=keygen&user={username}&password={password}`
    pub async fn generate_key(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<ApiKey, Error> {
        let url = self.keygen_url(username, password);
        let envelope = self.request(url).await?;
        extract_key(&envelope)
    }

    /// Like [`generate_key`](Self::generate_key), but logs and collapses
    /// every failure to `None`.
    pub async fn provision_key(&self, username: &str, password: &SecretString) -> Option<ApiKey> {
        match self.generate_key(username, password).await {
            Ok(key) => {
                info!(address = %self.address(), "API key successfully generated");
                Some(key)
            }
            Err(e) => {
                error!(address = %self.address(), error = %e, "failed to generate API key");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn extracts_key_from_result() {
        let envelope = ParsedValue::from_xml(
            r#"<response status="success"><result><key>LUFRPT14MW5xOEo1R09KVlBZNnpnemh0VHRBOWl6TGM9</key></result></response>"#,
        )
        .unwrap();
        let key = extract_key(&envelope).unwrap();
        assert_eq!(key.expose(), "LUFRPT14MW5xOEo1R09KVlBZNnpnemh0VHRBOWl6TGM9");
    }

    #[test]
    fn missing_or_empty_key_is_an_error() {
        for xml in [
            r#"<response status="success"><result/></response>"#,
            r#"<response status="success"><result><key/></result></response>"#,
            r#"<response status="success"/>"#,
        ] {
            let envelope = ParsedValue::from_xml(xml).unwrap();
            assert!(
                matches!(extract_key(&envelope), Err(Error::MissingField { .. })),
                "expected MissingField for {xml}"
            );
        }
    }

    #[test]
    fn debug_hides_the_key() {
        let key = ApiKey::new("secret-value");
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
    }
}
