// ── Transfer history – records of completed/failed uploads ───────────────────

use crate::scp::service::ScpService;
use crate::scp::transport::ScpTransport;
use crate::scp::types::*;
use std::sync::Mutex as StdMutex;

const MAX_HISTORY_SIZE: usize = 500;

/// Append `record`, dropping the oldest entries beyond the cap.
pub(crate) fn record_transfer(history: &StdMutex<Vec<ScpTransferRecord>>, record: ScpTransferRecord) {
    if let Ok(mut history) = history.lock() {
        history.push(record);
        if history.len() > MAX_HISTORY_SIZE {
            let excess = history.len() - MAX_HISTORY_SIZE;
            history.drain(0..excess);
        }
    }
}

impl<T: ScpTransport> ScpService<T> {
    /// Most recent records first.
    pub fn get_history(&self, limit: Option<usize>) -> Vec<ScpTransferRecord> {
        if let Ok(history) = self.history.lock() {
            let limit = limit.unwrap_or(100);
            history.iter().rev().take(limit).cloned().collect()
        } else {
            Vec::new()
        }
    }

    pub fn clear_history(&self) -> u32 {
        if let Ok(mut history) = self.history.lock() {
            let count = history.len() as u32;
            history.clear();
            count
        } else {
            0
        }
    }

    pub fn history_stats(&self) -> ScpHistoryStats {
        match self.history.lock() {
            Ok(history) => summarize(&history),
            Err(_) => summarize(&[]),
        }
    }
}

fn summarize(history: &[ScpTransferRecord]) -> ScpHistoryStats {
    let total_bytes: u64 = history.iter().map(|r| r.bytes_transferred).sum();
    let total_duration_ms: u64 = history.iter().map(|r| r.duration_ms).sum();
    let average_speed = if total_duration_ms > 0 {
        total_bytes as f64 / (total_duration_ms as f64 / 1000.0)
    } else {
        0.0
    };
    ScpHistoryStats {
        total_transfers: history.len(),
        succeeded: history.iter().filter(|r| r.success).count(),
        failed: history.iter().filter(|r| !r.success).count(),
        total_bytes,
        total_duration_ms,
        average_speed,
    }
}

/// Statistics about transfer history.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScpHistoryStats {
    pub total_transfers: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_bytes: u64,
    pub total_duration_ms: u64,
    pub average_speed: f64,
}
