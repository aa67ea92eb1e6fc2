//! OAuth2 password-grant token acquisition
//!
//! The token is obtained once when the client is built and shared read-only
//! for the client's lifetime; mid-session refresh is not modeled.

use reqwest::blocking::Client;
use tracing::debug;

use crate::config::CiConfig;
use crate::error::{CiError, Result};
use crate::types::{AuthErrorBody, TokenResponse};

/// Bearer token for the Ci service
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// The `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Keep the token out of debug output
impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Exchange the configured credentials for a bearer token
pub(crate) fn acquire_token(http: &Client, config: &CiConfig) -> Result<AccessToken> {
    let url = format!(
        "{}/oauth2/token",
        config.api_base_url.trim_end_matches('/')
    );
    let form = [
        ("grant_type", "password"),
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
    ];

    let response = http
        .post(&url)
        .basic_auth(&config.username, Some(&config.password))
        .form(&form)
        .send()?;

    let status = response.status();
    if !status.is_success() {
        let body: AuthErrorBody = response.json().map_err(|e| {
            CiError::UnexpectedResponse(format!("Malformed token error body: {}", e))
        })?;
        return Err(CiError::Auth {
            code: body.error,
            message: body.error_description,
        });
    }

    let token: TokenResponse = response
        .json()
        .map_err(|e| CiError::UnexpectedResponse(format!("Malformed token response: {}", e)))?;
    debug!("token grant succeeded");
    Ok(AccessToken(token.access_token))
}
