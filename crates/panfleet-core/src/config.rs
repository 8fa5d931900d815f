// ── Run credentials ──
//
// A `Credentials` value only exists when both halves are set, so a
// `Fleet` (which requires one) cannot start polling without them.

use secrecy::{ExposeSecret, SecretString};

use crate::error::CoreError;

/// Username/password used for the keygen exchange on every appliance.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    /// Validate and build. Unset, empty, or whitespace-only values are rejected.
    pub fn new(
        username: Option<String>,
        password: Option<SecretString>,
    ) -> Result<Self, CoreError> {
        let username = username
            .filter(|u| !u.trim().is_empty())
            .ok_or(CoreError::MissingCredentials { field: "username" })?;
        let password = password
            .filter(|p| !p.expose_secret().trim().is_empty())
            .ok_or(CoreError::MissingCredentials { field: "password" })?;
        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }
}
