//! Audit trail for gateway verdicts.
//!
//! Records every allow/block decision the gateway makes, for debugging and
//! for generating security audit trails. Append-only and never consulted for
//! decisions.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// One recorded gateway decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// The raw command text as submitted.
    pub command: String,
    /// The task on whose behalf the command ran.
    pub task_id: String,
    /// Whether the command was allowed through to execution.
    pub allowed: bool,
    /// The stage that produced the verdict (`validation`, `executed`, …).
    pub stage: String,
    /// Human-readable reason or disposition.
    pub reason: String,
    /// Unix timestamp of the decision.
    pub timestamp_secs: u64,
}

impl AuditEntry {
    pub fn new(
        command: String,
        task_id: String,
        allowed: bool,
        stage: String,
        reason: String,
    ) -> Self {
        let timestamp_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            command,
            task_id,
            allowed,
            stage,
            reason,
            timestamp_secs,
        }
    }
}

/// Shared, in-memory audit log. Clones share the same entries.
pub struct SafetyAuditLogger {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
    enabled: bool,
}

impl SafetyAuditLogger {
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            enabled,
        }
    }

    pub async fn log(&self, entry: AuditEntry) {
        if self.enabled {
            self.entries.lock().await.push(entry);
        }
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().await.clone()
    }

    /// Blocked decisions only.
    pub async fn denied_entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|entry| !entry.allowed)
            .cloned()
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

impl Clone for SafetyAuditLogger {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            enabled: self.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(allowed: bool) -> AuditEntry {
        AuditEntry::new(
            "git status".to_string(),
            "task-1".to_string(),
            allowed,
            "validation".to_string(),
            "ok".to_string(),
        )
    }

    #[tokio::test]
    async fn logs_and_counts_entries() {
        let logger = SafetyAuditLogger::new(true);
        logger.log(entry(true)).await;
        logger.log(entry(false)).await;
        assert_eq!(logger.count().await, 2);
        assert_eq!(logger.denied_entries().await.len(), 1);
    }

    #[tokio::test]
    async fn disabled_logger_records_nothing() {
        let logger = SafetyAuditLogger::new(false);
        logger.log(entry(false)).await;
        assert_eq!(logger.count().await, 0);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let first = SafetyAuditLogger::new(true);
        let second = first.clone();
        first.log(entry(true)).await;
        assert_eq!(second.count().await, 1);
        second.clear().await;
        assert_eq!(first.count().await, 0);
    }
}
