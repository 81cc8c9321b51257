//! Background execution.
//!
//! Explicit background mode hands a fully-validated command to the
//! [`BackgroundTaskSupervisor`] and returns a handle immediately; the caller
//! learns the pid (and everything else) by polling later. Concurrency limits
//! and queuing are the supervisor's concern, not the gateway's.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;
use tokio::sync::Mutex;

/// Spawns a command decoupled from the caller's lifetime, returning a task
/// handle immediately.
#[async_trait]
pub trait BackgroundTaskSupervisor: Send + Sync {
    async fn spawn(
        &self,
        command: &str,
        task_id: &str,
        tool_id: &str,
        cwd: Option<&Path>,
        max_timeout_ms: Option<u64>,
    ) -> Result<String>;
}

/// Lifecycle of one supervised task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundTaskState {
    Running,
    Completed { exit_code: i32 },
    TimedOut,
    Failed { message: String },
}

/// Poll result for a supervised task.
#[derive(Debug, Clone, Serialize)]
pub struct BackgroundTaskStatus {
    pub task_id: String,
    pub tool_id: String,
    pub pid: Option<u32>,
    pub state: BackgroundTaskState,
}

/// Production supervisor: spawns `bash -c` detached from the caller and
/// tracks each task in a shared map keyed by tool id.
pub struct TokioBackgroundSupervisor {
    tasks: Arc<Mutex<HashMap<String, BackgroundTaskStatus>>>,
}

impl TokioBackgroundSupervisor {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current view of a task, when the supervisor knows it.
    pub async fn status(&self, tool_id: &str) -> Option<BackgroundTaskStatus> {
        self.tasks.lock().await.get(tool_id).cloned()
    }
}

impl Default for TokioBackgroundSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackgroundTaskSupervisor for TokioBackgroundSupervisor {
    async fn spawn(
        &self,
        command: &str,
        task_id: &str,
        tool_id: &str,
        cwd: Option<&Path>,
        max_timeout_ms: Option<u64>,
    ) -> Result<String> {
        let mut shell = Command::new("bash");
        shell
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = cwd {
            shell.current_dir(dir);
        }

        let mut child = shell
            .spawn()
            .with_context(|| format!("failed to spawn background command: {command}"))?;

        let status = BackgroundTaskStatus {
            task_id: task_id.to_string(),
            tool_id: tool_id.to_string(),
            pid: child.id(),
            state: BackgroundTaskState::Running,
        };
        self.tasks
            .lock()
            .await
            .insert(tool_id.to_string(), status);

        let tasks = Arc::clone(&self.tasks);
        let handle = tool_id.to_string();
        tokio::spawn(async move {
            let waited = match max_timeout_ms {
                Some(ms) => tokio::time::timeout(Duration::from_millis(ms), child.wait())
                    .await
                    .map_err(|_| None)
                    .and_then(|status| status.map_err(Some)),
                None => child.wait().await.map_err(Some),
            };
            let state = match waited {
                Ok(status) => BackgroundTaskState::Completed {
                    exit_code: status.code().unwrap_or(-1),
                },
                Err(Some(err)) => BackgroundTaskState::Failed {
                    message: err.to_string(),
                },
                Err(None) => BackgroundTaskState::TimedOut,
            };
            if let Some(entry) = tasks.lock().await.get_mut(&handle) {
                entry.state = state;
            }
        });

        Ok(tool_id.to_string())
    }
}
