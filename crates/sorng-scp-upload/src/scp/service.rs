// ── ScpService – async facade over the blocking uploader ────────────────────

use crate::scp::error::{ScpError, ScpResult};
use crate::scp::history;
use crate::scp::ssh::Ssh2Transport;
use crate::scp::transport::ScpTransport;
use crate::scp::types::*;
use crate::scp::uploader::ScpUploader;
use chrono::Utc;
use log::warn;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use uuid::Uuid;

/// Service over the libssh2 transport.
pub type Ssh2ScpService = ScpService<Ssh2Transport>;

/// Runs uploads on tokio's blocking pool and keeps a bounded history.
///
/// Cloning is cheap; clones share the uploader and the history.
pub struct ScpService<T: ScpTransport> {
    pub(crate) uploader: Arc<ScpUploader<T>>,
    pub(crate) history: Arc<StdMutex<Vec<ScpTransferRecord>>>,
}

impl<T: ScpTransport> Clone for ScpService<T> {
    fn clone(&self) -> Self {
        Self {
            uploader: self.uploader.clone(),
            history: self.history.clone(),
        }
    }
}

impl<T> ScpService<T>
where
    T: ScpTransport + Send + Sync + 'static,
{
    pub fn new(uploader: ScpUploader<T>) -> Self {
        Self {
            uploader: Arc::new(uploader),
            history: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    pub fn uploader(&self) -> &ScpUploader<T> {
        &self.uploader
    }

    /// Upload one file without blocking the async runtime.
    pub async fn upload(&self, local_path: impl Into<PathBuf>) -> ScpResult<ScpTransferStatistics> {
        let transfer_id = Uuid::new_v4().to_string();
        let started = Utc::now();
        let local_path = local_path.into();

        let uploader = self.uploader.clone();
        let task_path = local_path.clone();
        let result = tokio::task::spawn_blocking(move || uploader.upload(&task_path))
            .await
            .map_err(|e| ScpError::io_error(format!("SCP upload task failed: {}", e)))
            .and_then(|r| r);

        let config = self.uploader.config();
        let record = match &result {
            Ok(stats) => ScpTransferRecord {
                transfer_id,
                host: config.host.clone(),
                username: config.username.clone(),
                local_path: local_path.display().to_string(),
                remote_directory: config.remote_directory.clone(),
                bytes_transferred: stats.total_bytes,
                duration_ms: stats.duration_ms(),
                average_speed: stats.average_rate().unwrap_or(0.0),
                success: true,
                error: None,
                timestamp: Utc::now(),
            },
            Err(e) => {
                warn!("SCP upload {} failed: {}", transfer_id, e);
                ScpTransferRecord {
                    transfer_id,
                    host: config.host.clone(),
                    username: config.username.clone(),
                    local_path: local_path.display().to_string(),
                    remote_directory: config.remote_directory.clone(),
                    bytes_transferred: 0,
                    duration_ms: (Utc::now() - started).num_milliseconds().max(0) as u64,
                    average_speed: 0.0,
                    success: false,
                    error: Some(e.to_string()),
                    timestamp: Utc::now(),
                }
            }
        };
        history::record_transfer(&self.history, record);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scp::ScpErrorKind;

    fn service() -> Ssh2ScpService {
        let mut cfg = ScpConfig::new("127.0.0.1", "nobody");
        cfg.timeout_secs = 1;
        ScpService::new(ScpUploader::new(cfg.clone(), Ssh2Transport::from_config(&cfg)).unwrap())
    }

    #[tokio::test]
    async fn test_missing_file_is_recorded_as_failure() {
        let svc = service();
        let err = svc.upload("/nonexistent/file.txt").await.unwrap_err();
        assert_eq!(err.kind, ScpErrorKind::InvalidInput);

        let records = svc.get_history(None);
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
        assert_eq!(records[0].bytes_transferred, 0);
        assert!(records[0].error.as_deref().unwrap().contains("InvalidInput"));
    }

    #[tokio::test]
    async fn test_clones_share_history() {
        let svc = service();
        let other = svc.clone();
        let _ = other.upload("/nonexistent/a").await;
        assert_eq!(svc.get_history(None).len(), 1);
    }
}
