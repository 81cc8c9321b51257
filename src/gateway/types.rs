//! Request and outcome types for the gateway.

use serde::{Deserialize, Serialize};

use crate::command_safety::{split_chain_segments, strip_heredoc_bodies};
use crate::error::BlockedReason;

/// Whether the caller waits for the command or gets a handle back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Foreground,
    Background,
}

/// One command submission. Constructed per call and discarded once the
/// outcome exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Raw command text, passed to the shell verbatim if allowed.
    pub command: String,
    /// The task on whose behalf the command runs.
    pub task_id: String,
    /// Tool-invocation identifier; generated for background runs if blank.
    #[serde(default)]
    pub tool_id: String,
    /// Optional working directory, validated against the workspace root.
    #[serde(default)]
    pub working_dir: Option<String>,
    /// Hard ceiling override for the foreground wait, in milliseconds.
    #[serde(default)]
    pub max_timeout_ms: Option<u64>,
    /// Idle-window override, in milliseconds.
    #[serde(default)]
    pub idle_timeout_ms: Option<u64>,
    #[serde(default)]
    pub mode: ExecutionMode,
}

impl CommandRequest {
    pub fn new(
        command: impl Into<String>,
        task_id: impl Into<String>,
        tool_id: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            task_id: task_id.into(),
            tool_id: tool_id.into(),
            working_dir: None,
            max_timeout_ms: None,
            idle_timeout_ms: None,
            mode: ExecutionMode::Foreground,
        }
    }

    pub fn background(mut self) -> Self {
        self.mode = ExecutionMode::Background;
        self
    }
}

/// The sole value surfaced to callers. Derived from the raw execution result,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub idle_timed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_task_id: Option<String>,
}

impl CommandOutcome {
    /// A validation refusal. Never reaches the process runner.
    pub fn blocked(reason: &BlockedReason) -> Self {
        Self {
            success: false,
            message: format!("Command blocked: {reason}"),
            output: None,
            error: None,
            exit_code: None,
            timed_out: false,
            idle_timed_out: false,
            pid: None,
            background_task_id: None,
        }
    }

    /// The runner itself failed to start or wait on the command.
    pub fn execution_error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: None,
            error: None,
            exit_code: None,
            timed_out: false,
            idle_timed_out: false,
            pid: None,
            background_task_id: None,
        }
    }
}

/// A command normalized once per call: raw text, heredoc-filtered text, and
/// chain segments. Threaded through the detector and the guard so nothing
/// re-derives it stage by stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedCommand {
    pub raw: String,
    pub checked: String,
    pub segments: Vec<String>,
}

impl CheckedCommand {
    pub fn parse(command: &str) -> Self {
        let checked = strip_heredoc_bodies(command);
        let segments = split_chain_segments(&checked);
        Self {
            raw: command.to_string(),
            checked,
            segments,
        }
    }
}
