//! Ci client context
//!
//! `CiClient` carries everything a remote call needs: the HTTP client, the
//! bearer token, the resolved workspace and the configuration. There is no
//! ambient global state; collaborators receive the context explicitly.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::auth::{acquire_token, AccessToken};
use crate::config::CiConfig;
use crate::error::{CiError, Result};

/// Authenticated handle to the Ci service
///
/// Cheap to clone; the underlying HTTP client shares its connection pool.
#[derive(Debug, Clone)]
pub struct CiClient {
    http: Client,
    token: AccessToken,
    workspace_id: String,
    config: CiConfig,
}

impl CiClient {
    /// Build a client: validate config, obtain a token, resolve the workspace
    ///
    /// When the config names no workspace, the account's workspaces are
    /// queried and the first one whose class contains `Personal` is used.
    pub fn new(config: CiConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CiError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let token = acquire_token(&http, &config)?;
        info!("authenticated against {}", config.api_base_url);

        let mut client = Self {
            http,
            token,
            workspace_id: String::new(),
            config,
        };

        client.workspace_id = match client.config.workspace_id.clone() {
            Some(id) => id,
            None => client.discover_personal_workspace()?,
        };
        debug!(workspace_id = %client.workspace_id, "workspace resolved");

        Ok(client)
    }

    /// Build a client from a TOML config file
    pub fn from_config_file(path: &std::path::Path) -> Result<Self> {
        Self::new(CiConfig::from_file(path)?)
    }

    fn discover_personal_workspace(&self) -> Result<String> {
        for workspace in self.workspaces(50, 0, "name,class")? {
            if workspace
                .class
                .as_deref()
                .is_some_and(|c| c.contains("Personal"))
            {
                return Ok(workspace.id);
            }
        }
        Err(CiError::Config(
            "No workspace_id configured and no personal workspace found".to_string(),
        ))
    }

    /// The workspace operations default to
    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    /// The bearer token in use
    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    pub fn config(&self) -> &CiConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// URL on the API host
    pub(crate) fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// URL on the upload host
    pub(crate) fn upload_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.upload_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url).bearer_auth(self.token.secret())
    }

    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url).bearer_auth(self.token.secret())
    }

    pub(crate) fn put(&self, url: &str) -> RequestBuilder {
        self.http.put(url).bearer_auth(self.token.secret())
    }

    pub(crate) fn delete(&self, url: &str) -> RequestBuilder {
        self.http.delete(url).bearer_auth(self.token.secret())
    }

    /// Check the status of a management response and decode its JSON body
    pub(crate) fn parse_json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let response = check_status(response)?;
        response
            .json()
            .map_err(|e| CiError::UnexpectedResponse(e.to_string()))
    }
}

/// Map error statuses to the error taxonomy, pass successes through
pub(crate) fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let message = response.text().unwrap_or_default();
        return Err(CiError::Auth {
            code: status
                .canonical_reason()
                .unwrap_or("unauthorized")
                .to_string(),
            message,
        });
    }
    if !status.is_success() {
        let message = response.text().unwrap_or_default();
        return Err(CiError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}
