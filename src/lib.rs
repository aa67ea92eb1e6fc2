/*!
 * cimedia - client library for the Ci media cloud service
 *
 * Authenticates with an OAuth2 password grant, browses and searches
 * workspaces, manages assets and folders, shares via mediabox links, and
 * uploads files either in one shot or as a chunked multipart session with
 * a fixed-size pool of part-upload workers.
 *
 * ```no_run
 * use cimedia::{CiClient, CiConfig, UploadOptions};
 *
 * # fn main() -> cimedia::Result<()> {
 * let config = CiConfig::from_file(std::path::Path::new("ci.toml"))?;
 * let client = CiClient::new(config)?;
 * let asset_id = client.upload(
 *     std::path::Path::new("footage/clip.mp4"),
 *     &UploadOptions::default(),
 * )?;
 * println!("uploaded as {asset_id}");
 * # Ok(())
 * # }
 * ```
 */

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod operations;
pub mod types;
pub mod upload;

// Re-export commonly used types
pub use auth::AccessToken;
pub use client::CiClient;
pub use config::{
    CiConfig, LogLevel, UploadConfig, DEFAULT_CHUNK_SIZE, DEFAULT_WORKER_COUNT,
    MULTIPART_THRESHOLD,
};
pub use error::{CiError, Result};
pub use operations::ListOptions;
pub use types::{AssetMetadata, Item, MediaboxRequest, Page, SessionRequest, Workspace};
pub use upload::{UploadOptions, UploadService, UploadStrategy};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
