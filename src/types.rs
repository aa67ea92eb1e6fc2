//! Request and response schemas for the Ci REST API
//!
//! Every remote call deserializes into one of these types at the boundary;
//! unexpected shapes surface as [`crate::CiError::UnexpectedResponse`] instead
//! of leaking raw JSON into callers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Successful OAuth2 token grant
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// OAuth2 error body returned on a failed grant
#[derive(Debug, Clone, Deserialize)]
pub struct AuthErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: String,
}

/// A workspace the account can operate in
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
}

/// One entry of a workspace or folder listing (asset or folder)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// One page of a paginated listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    pub count: u64,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Folder detail
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDetail {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
}

/// Status message returned by management endpoints (trash, delete, archive)
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response to a multipart session initiation or single-part upload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCreated {
    pub asset_id: String,
}

/// Response to a folder creation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderCreated {
    pub folder_id: String,
}

/// Response to a download-link request
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadInfo {
    #[serde(default)]
    pub location: Option<String>,
}

/// Response to a mediabox creation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaboxCreated {
    pub mediabox_id: String,
    pub link: String,
}

/// User-supplied metadata attached to uploads
pub type AssetMetadata = HashMap<String, serde_json::Value>;

/// Body of a multipart session initiation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub name: String,
    pub size: u64,
    pub workspace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(skip_serializing_if = "AssetMetadata::is_empty")]
    pub metadata: AssetMetadata,
}

/// Parameters for creating a mediabox share link
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaboxRequest {
    pub name: String,
    pub asset_ids: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub recipients: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub send_notifications: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub notify_on_open: bool,
}

impl MediaboxRequest {
    /// A mediabox share for the given assets, with all optionals off
    pub fn new(name: impl Into<String>, asset_ids: Vec<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            asset_ids,
            kind: kind.into(),
            recipients: Vec::new(),
            message: None,
            password: None,
            expiration_days: None,
            expiration_date: None,
            send_notifications: false,
            notify_on_open: false,
        }
    }
}
