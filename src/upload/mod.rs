//! Chunked upload subsystem
//!
//! The coordinator owns an upload from strategy decision to completion:
//!
//! ```text
//! Idle -> Initiating -> Transferring -> Completing -> Done
//!            |               |              |
//!            +---------------+--------------+--> Failed
//! ```
//!
//! Files at or above the 5 MiB threshold go through a multipart session:
//! the file is split into fixed-size chunks, transferred sequentially or
//! through the worker pool, and the session is finalized only after every
//! part has confirmed success. Smaller files take a one-shot form POST.

pub mod chunker;
pub mod pool;
pub mod service;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::client::CiClient;
use crate::config::{UploadConfig, MULTIPART_THRESHOLD};
use crate::error::{CiError, Result};
use crate::types::{AssetMetadata, SessionRequest};

pub use chunker::{part_count, Chunk, ChunkReader};
pub use pool::PartResult;
pub use service::UploadService;

/// How a file will be transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStrategy {
    /// One synchronous multipart-form POST
    Single,
    /// Session-based chunked transfer
    Multipart,
}

/// Pick the strategy for a file size; the threshold is a hard 5 MiB
pub fn strategy_for(size_bytes: u64) -> UploadStrategy {
    if size_bytes >= MULTIPART_THRESHOLD {
        UploadStrategy::Multipart
    } else {
        UploadStrategy::Single
    }
}

/// Destination and metadata for an upload
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Target folder; the workspace root when absent
    pub folder_id: Option<String>,
    /// Workspace override; the client's resolved workspace when absent
    pub workspace_id: Option<String>,
    /// Custom metadata stored with the asset
    pub metadata: AssetMetadata,
}

impl CiClient {
    /// Upload a file and return its asset id
    ///
    /// Strategy, chunk size, worker count and retry policy come from the
    /// client's [`UploadConfig`].
    pub fn upload(&self, path: &Path, options: &UploadOptions) -> Result<String> {
        let upload_config = self.config().upload.clone();
        upload(self, &upload_config, self.workspace_id(), path, options)
    }
}

/// Drive one upload through any [`UploadService`]
pub fn upload<S: UploadService>(
    service: &S,
    config: &UploadConfig,
    default_workspace: &str,
    path: &Path,
    options: &UploadOptions,
) -> Result<String> {
    let file_meta = std::fs::metadata(path)?;
    if !file_meta.is_file() {
        return Err(CiError::Config(format!(
            "Not a file: {}",
            path.display()
        )));
    }
    let size = file_meta.len();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CiError::Config(format!("No file name in path: {}", path.display())))?;

    let request = SessionRequest {
        name,
        size,
        workspace_id: options
            .workspace_id
            .clone()
            .unwrap_or_else(|| default_workspace.to_string()),
        folder_id: options.folder_id.clone(),
        metadata: options.metadata.clone(),
    };

    match strategy_for(size) {
        UploadStrategy::Single => {
            info!(name = %request.name, size, "single-part upload");
            service.single_part_upload(path, &request)
        }
        UploadStrategy::Multipart => multipart_upload(service, config, path, &request),
    }
}

/// The Initiating -> Transferring -> Completing leg of the state machine
fn multipart_upload<S: UploadService>(
    service: &S,
    config: &UploadConfig,
    path: &Path,
    request: &SessionRequest,
) -> Result<String> {
    let asset_id = service.initiate_multipart_session(request)?;
    let expected = part_count(request.size, config.chunk_size);
    info!(
        asset_id = %asset_id,
        name = %request.name,
        size = request.size,
        parts = expected,
        parallel = config.parallel,
        "multipart session initiated"
    );

    let chunks = ChunkReader::open(path, config.chunk_size)?;
    let results = if config.parallel && config.worker_count > 1 {
        pool::drain_parallel(service, &asset_id, chunks, config)?
    } else {
        pool::drain_sequential(service, &asset_id, chunks, config)?
    };

    verify_coverage(&asset_id, expected, &results)?;
    debug!(asset_id = %asset_id, parts = results.len(), "all parts confirmed");

    service.complete_multipart_session(&asset_id)?;
    info!(asset_id = %asset_id, "upload complete");
    Ok(asset_id)
}

/// Completion gate: parts 1..=expected must all have a success result
fn verify_coverage(asset_id: &str, expected: u64, results: &[PartResult]) -> Result<()> {
    let mut failed: Vec<u64> = results
        .iter()
        .filter(|r| r.outcome.is_err())
        .map(|r| r.part_number)
        .collect();

    // Parts with no result at all count as failed too
    for part in 1..=expected {
        if !results.iter().any(|r| r.part_number == part) {
            failed.push(part);
        }
    }

    if failed.is_empty() {
        return Ok(());
    }

    failed.sort_unstable();
    failed.dedup();
    for result in results {
        if let Err(e) = &result.outcome {
            warn!(asset_id, part_number = result.part_number, "part failed: {}", e);
        }
    }
    Err(CiError::PartsFailed {
        asset_id: asset_id.to_string(),
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_threshold_boundary() {
        assert_eq!(strategy_for(0), UploadStrategy::Single);
        assert_eq!(strategy_for(3 * 1024 * 1024), UploadStrategy::Single);
        assert_eq!(strategy_for(MULTIPART_THRESHOLD - 1), UploadStrategy::Single);
        assert_eq!(strategy_for(MULTIPART_THRESHOLD), UploadStrategy::Multipart);
        assert_eq!(strategy_for(22 * 1024 * 1024), UploadStrategy::Multipart);
    }

    #[test]
    fn test_verify_coverage_full_success() {
        let results: Vec<PartResult> = (1..=3)
            .map(|part_number| PartResult {
                part_number,
                outcome: Ok(()),
            })
            .collect();
        assert!(verify_coverage("a1", 3, &results).is_ok());
    }

    #[test]
    fn test_verify_coverage_reports_failed_parts() {
        let results = vec![
            PartResult {
                part_number: 1,
                outcome: Ok(()),
            },
            PartResult {
                part_number: 2,
                outcome: Err(CiError::ServerRejected {
                    status: 500,
                    message: "boom".to_string(),
                }),
            },
            PartResult {
                part_number: 3,
                outcome: Ok(()),
            },
        ];
        let err = verify_coverage("a1", 3, &results).unwrap_err();
        match err {
            CiError::PartsFailed { asset_id, failed } => {
                assert_eq!(asset_id, "a1");
                assert_eq!(failed, vec![2]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_verify_coverage_counts_missing_parts_as_failed() {
        let results = vec![PartResult {
            part_number: 1,
            outcome: Ok(()),
        }];
        let err = verify_coverage("a1", 3, &results).unwrap_err();
        match err {
            CiError::PartsFailed { failed, .. } => assert_eq!(failed, vec![2, 3]),
            other => panic!("unexpected error: {}", other),
        }
    }
}
