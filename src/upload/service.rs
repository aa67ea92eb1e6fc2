//! Remote asset-service boundary for uploads
//!
//! The coordinator drives any [`UploadService`]; the production
//! implementation lives on [`CiClient`]. Tests substitute a recording mock.

use std::path::Path;

use bytes::Bytes;
use reqwest::StatusCode;
use tracing::debug;

use crate::client::CiClient;
use crate::error::{CiError, Result};
use crate::types::{AssetCreated, SessionRequest};

/// The four remote calls the upload subsystem depends on
///
/// Implementations perform exactly one network transfer per call and never
/// retry; retry policy belongs to the coordinator. `Sync` because pool
/// workers share one service reference during parallel transfer.
pub trait UploadService: Sync {
    /// Create a multipart session; returns the opaque asset id
    fn initiate_multipart_session(&self, request: &SessionRequest) -> Result<String>;

    /// Store `payload` as part `part_number` of the session
    ///
    /// Parts may be sent in any order; the service assembles them by number.
    fn upload_part(&self, asset_id: &str, part_number: u64, payload: &Bytes) -> Result<()>;

    /// Finalize the session once every part has been stored
    fn complete_multipart_session(&self, asset_id: &str) -> Result<()>;

    /// One-shot upload for files below the multipart threshold
    fn single_part_upload(&self, path: &Path, request: &SessionRequest) -> Result<String>;
}

impl UploadService for CiClient {
    fn initiate_multipart_session(&self, request: &SessionRequest) -> Result<String> {
        let url = self.upload_url("upload/multipart");
        let response = self.post(&url).json(request).send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CiError::Auth {
                code: status.canonical_reason().unwrap_or("unauthorized").to_string(),
                message: response.text().unwrap_or_default(),
            });
        }
        if !status.is_success() {
            return Err(CiError::SessionInit {
                name: request.name.clone(),
                message: format!("{}: {}", status, response.text().unwrap_or_default()),
            });
        }

        let created: AssetCreated = response
            .json()
            .map_err(|e| CiError::UnexpectedResponse(format!("Session response: {}", e)))?;
        debug!(asset_id = %created.asset_id, name = %request.name, "multipart session created");
        Ok(created.asset_id)
    }

    fn upload_part(&self, asset_id: &str, part_number: u64, payload: &Bytes) -> Result<()> {
        let url = self.upload_url(&format!("upload/multipart/{}/{}", asset_id, part_number));
        let response = self
            .put(&url)
            .header("Content-Type", "application/octet-stream")
            .body(payload.to_vec())
            .send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CiError::Auth {
                code: status.canonical_reason().unwrap_or("unauthorized").to_string(),
                message: response.text().unwrap_or_default(),
            });
        }
        if !status.is_success() {
            return Err(CiError::ServerRejected {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }
        debug!(asset_id, part_number, bytes = payload.len(), "part stored");
        Ok(())
    }

    fn complete_multipart_session(&self, asset_id: &str) -> Result<()> {
        let url = self.upload_url(&format!("upload/multipart/{}/complete", asset_id));
        let response = self.post(&url).send().map_err(|e| CiError::Completion {
            asset_id: asset_id.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CiError::Completion {
                asset_id: asset_id.to_string(),
                message: format!("{}: {}", status, response.text().unwrap_or_default()),
            });
        }
        debug!(asset_id, "multipart session completed");
        Ok(())
    }

    fn single_part_upload(&self, path: &Path, request: &SessionRequest) -> Result<String> {
        let metadata_json = serde_json::to_string(request)
            .map_err(|e| CiError::UnexpectedResponse(format!("Metadata encoding: {}", e)))?;

        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let file_part = reqwest::blocking::multipart::Part::file(path)?
            .mime_str(mime.essence_str())
            .map_err(|e| CiError::Config(format!("Invalid content type: {}", e)))?;

        let form = reqwest::blocking::multipart::Form::new()
            .part("filename", file_part)
            .text("metadata", metadata_json);

        let url = self.upload_url("upload");
        let response = self.post(&url).multipart(form).send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CiError::Auth {
                code: status.canonical_reason().unwrap_or("unauthorized").to_string(),
                message: response.text().unwrap_or_default(),
            });
        }
        if !status.is_success() {
            return Err(CiError::ServerRejected {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }

        let created: AssetCreated = response
            .json()
            .map_err(|e| CiError::UnexpectedResponse(format!("Upload response: {}", e)))?;
        debug!(asset_id = %created.asset_id, "single-part upload accepted");
        Ok(created.asset_id)
    }
}
