//! Fixed-size worker pool for parallel part transfer
//!
//! A bounded job queue feeds N workers; each worker pulls one chunk, pushes
//! it through the part uploader (with the retry policy applied) and reports
//! a result over a channel. Scoped threads give the join/barrier semantic:
//! the pool does not return until every enqueued part has a result.

use std::thread;
use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::{bounded, unbounded};
use tracing::{debug, warn};

use super::chunker::Chunk;
use super::service::UploadService;
use crate::config::UploadConfig;
use crate::error::Result;

/// Result of transferring one part, success or not
#[derive(Debug)]
pub struct PartResult {
    pub part_number: u64,
    pub outcome: Result<()>,
}

struct PartJob {
    part_number: u64,
    payload: Bytes,
}

/// Upload one part, retrying transient failures per the configured policy
///
/// Auth errors and server rejections are returned on the first occurrence.
pub(crate) fn upload_part_with_retry<S: UploadService + ?Sized>(
    service: &S,
    asset_id: &str,
    part_number: u64,
    payload: &Bytes,
    config: &UploadConfig,
) -> Result<()> {
    let mut attempt: u32 = 0;
    loop {
        match service.upload_part(asset_id, part_number, payload) {
            Ok(()) => return Ok(()),
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                attempt += 1;
                let delay = if config.exponential_backoff {
                    Duration::from_secs(
                        config
                            .retry_delay_secs
                            .saturating_mul(2u64.saturating_pow(attempt - 1)),
                    )
                } else {
                    Duration::from_secs(config.retry_delay_secs)
                };
                warn!(part_number, attempt, ?delay, "part transfer failed, retrying: {}", e);
                thread::sleep(delay);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Drain `chunks` through a pool of `config.worker_count` workers
///
/// Chunks are enqueued in file order as fast as they are read, subject to
/// queue capacity; completion order across parts is not guaranteed. Returns
/// one [`PartResult`] per produced chunk. A chunking I/O error aborts the
/// producer and propagates after in-flight transfers have drained.
pub(crate) fn drain_parallel<S, I>(
    service: &S,
    asset_id: &str,
    chunks: I,
    config: &UploadConfig,
) -> Result<Vec<PartResult>>
where
    S: UploadService,
    I: Iterator<Item = std::io::Result<Chunk>>,
{
    let workers = config.worker_count;
    // Enough queued read-ahead to keep workers busy without buffering the file
    let (job_tx, job_rx) = bounded::<PartJob>(workers * 2);
    let (result_tx, result_rx) = unbounded::<PartResult>();

    let produced = thread::scope(|scope| -> Result<u64> {
        // Senders move into this scope so that every exit path closes the
        // queue and lets the workers run down before the scope joins them.
        let job_tx = job_tx;
        let result_tx = result_tx;

        for worker in 0..workers {
            let rx = job_rx.clone();
            let tx = result_tx.clone();
            scope.spawn(move || {
                for job in rx.iter() {
                    let outcome = upload_part_with_retry(
                        service,
                        asset_id,
                        job.part_number,
                        &job.payload,
                        config,
                    );
                    if tx
                        .send(PartResult {
                            part_number: job.part_number,
                            outcome,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
                debug!(worker, "upload worker finished");
            });
        }
        drop(job_rx);

        let mut produced: u64 = 0;
        for chunk in chunks {
            let chunk = chunk?;
            produced += 1;
            debug!(
                part_number = chunk.part_number,
                bytes = chunk.payload.len(),
                "part enqueued"
            );
            if job_tx
                .send(PartJob {
                    part_number: chunk.part_number,
                    payload: chunk.payload,
                })
                .is_err()
            {
                break;
            }
        }
        Ok(produced)
    });

    let results: Vec<PartResult> = result_rx.try_iter().collect();
    let produced = produced?;
    debug_assert_eq!(results.len() as u64, produced);
    Ok(results)
}

/// Drain `chunks` one at a time on the calling thread
pub(crate) fn drain_sequential<S, I>(
    service: &S,
    asset_id: &str,
    chunks: I,
    config: &UploadConfig,
) -> Result<Vec<PartResult>>
where
    S: UploadService,
    I: Iterator<Item = std::io::Result<Chunk>>,
{
    let mut results = Vec::new();
    for chunk in chunks {
        let chunk = chunk?;
        let outcome =
            upload_part_with_retry(service, asset_id, chunk.part_number, &chunk.payload, config);
        results.push(PartResult {
            part_number: chunk.part_number,
            outcome,
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CiError;
    use crate::types::SessionRequest;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fails a part with a transient error a fixed number of times
    struct FlakyService {
        failures_left: AtomicU32,
        attempts: AtomicU32,
        parts_seen: Mutex<Vec<u64>>,
    }

    impl FlakyService {
        fn failing(times: u32) -> Self {
            Self {
                failures_left: AtomicU32::new(times),
                attempts: AtomicU32::new(0),
                parts_seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl UploadService for FlakyService {
        fn initiate_multipart_session(&self, _request: &SessionRequest) -> Result<String> {
            Ok("asset".to_string())
        }

        fn upload_part(&self, _asset_id: &str, part_number: u64, _payload: &Bytes) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(CiError::TransientNetwork("connection reset".to_string()));
            }
            self.parts_seen.lock().unwrap().push(part_number);
            Ok(())
        }

        fn complete_multipart_session(&self, _asset_id: &str) -> Result<()> {
            Ok(())
        }

        fn single_part_upload(&self, _path: &Path, _request: &SessionRequest) -> Result<String> {
            Ok("asset".to_string())
        }
    }

    fn fast_config(workers: usize) -> UploadConfig {
        UploadConfig {
            worker_count: workers,
            max_retries: 2,
            retry_delay_secs: 0,
            exponential_backoff: false,
            ..Default::default()
        }
    }

    fn chunks_of(count: u64) -> impl Iterator<Item = std::io::Result<Chunk>> {
        (1..=count).map(|part_number| {
            Ok(Chunk {
                part_number,
                payload: Bytes::from_static(b"data"),
            })
        })
    }

    #[test]
    fn test_retry_recovers_from_transient_failure() {
        let service = FlakyService::failing(2);
        let config = fast_config(1);
        let payload = Bytes::from_static(b"data");

        upload_part_with_retry(&service, "asset", 1, &payload, &config).unwrap();
        assert_eq!(service.attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_retry_gives_up_after_max_attempts() {
        let service = FlakyService::failing(10);
        let config = fast_config(1);
        let payload = Bytes::from_static(b"data");

        let err = upload_part_with_retry(&service, "asset", 1, &payload, &config).unwrap_err();
        assert!(err.is_transient());
        // Initial attempt plus max_retries
        assert_eq!(service.attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_server_rejection_is_not_retried() {
        struct Rejecting;
        impl UploadService for Rejecting {
            fn initiate_multipart_session(&self, _r: &SessionRequest) -> Result<String> {
                unreachable!()
            }
            fn upload_part(&self, _a: &str, _p: u64, _b: &Bytes) -> Result<()> {
                Err(CiError::ServerRejected {
                    status: 400,
                    message: "bad part".to_string(),
                })
            }
            fn complete_multipart_session(&self, _a: &str) -> Result<()> {
                unreachable!()
            }
            fn single_part_upload(&self, _p: &Path, _r: &SessionRequest) -> Result<String> {
                unreachable!()
            }
        }

        let config = fast_config(1);
        let payload = Bytes::from_static(b"data");
        let err = upload_part_with_retry(&Rejecting, "asset", 1, &payload, &config).unwrap_err();
        assert!(matches!(err, CiError::ServerRejected { status: 400, .. }));
    }

    #[test]
    fn test_parallel_drain_covers_every_part_once() {
        crate::logging::init_test_logging();
        let service = FlakyService::failing(0);
        let config = fast_config(4);

        let results = drain_parallel(&service, "asset", chunks_of(9), &config).unwrap();
        assert_eq!(results.len(), 9);
        assert!(results.iter().all(|r| r.outcome.is_ok()));

        let mut seen = service.parts_seen.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, (1..=9).collect::<Vec<u64>>());
    }

    #[test]
    fn test_sequential_drain_preserves_order() {
        let service = FlakyService::failing(0);
        let config = fast_config(1);

        let results = drain_sequential(&service, "asset", chunks_of(5), &config).unwrap();
        let parts: Vec<u64> = results.iter().map(|r| r.part_number).collect();
        assert_eq!(parts, vec![1, 2, 3, 4, 5]);
        assert_eq!(*service.parts_seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_parallel_drain_propagates_chunking_io_error() {
        let service = FlakyService::failing(0);
        let config = fast_config(2);

        let chunks = (1..=4u64).map(|part_number| {
            if part_number == 3 {
                Err(std::io::Error::other("disk error"))
            } else {
                Ok(Chunk {
                    part_number,
                    payload: Bytes::from_static(b"data"),
                })
            }
        });

        let err = drain_parallel(&service, "asset", chunks, &config).unwrap_err();
        assert!(matches!(err, CiError::Io(_)));
    }
}
