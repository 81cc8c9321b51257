//! Result shaping.
//!
//! Derives the caller-facing [`CommandOutcome`] from an immutable
//! [`RawExecutionResult`] and the classifier's output strategy. Streams are
//! truncated from the TAIL — the end of a log is where failures live — and
//! blank streams normalize to absent, never to empty strings.

use crate::command_safety::classifier::OutputStrategy;
use crate::config::constants::{
    MAX_FAILURE_STDOUT_CHARS, MAX_OUTPUT_CHARS, MINIMAL_OUTPUT_PLACEHOLDER,
};
use crate::exec::process_runner::RawExecutionResult;
use crate::gateway::CommandOutcome;

/// Keeps the last `limit` characters, prefixed with an exact truncation
/// marker when anything was dropped.
pub fn truncate_tail(text: &str, limit: usize) -> String {
    let total = text.chars().count();
    if total <= limit {
        return text.to_string();
    }
    let dropped = total - limit;
    let tail: String = text.chars().skip(dropped).collect();
    format!("... ({dropped} chars truncated)\n{tail}")
}

fn non_blank(text: &str) -> Option<&str> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Shapes one raw result into the outcome surfaced to the caller.
pub fn shape_outcome(raw: &RawExecutionResult, strategy: OutputStrategy) -> CommandOutcome {
    if raw.timed_out || raw.idle_timed_out {
        let kind = if raw.idle_timed_out {
            "produced no output within the idle window"
        } else {
            "exceeded the maximum duration"
        };
        let pid_note = match raw.pid {
            Some(pid) => format!(" (pid {pid})"),
            None => String::new(),
        };
        return CommandOutcome {
            success: true,
            message: format!("Command {kind}; the process may still be running{pid_note}"),
            output: non_blank(&raw.stdout).map(|text| truncate_tail(text, MAX_OUTPUT_CHARS)),
            error: non_blank(&raw.stderr).map(|text| truncate_tail(text, MAX_OUTPUT_CHARS)),
            exit_code: None,
            timed_out: raw.timed_out,
            idle_timed_out: raw.idle_timed_out,
            pid: raw.pid,
            background_task_id: None,
        };
    }

    if raw.exit_code == 0 {
        let output = match strategy {
            OutputStrategy::Minimal => {
                non_blank(&raw.stdout).map(|_| MINIMAL_OUTPUT_PLACEHOLDER.to_string())
            }
            OutputStrategy::Full | OutputStrategy::Default => {
                non_blank(&raw.stdout).map(|text| truncate_tail(text, MAX_OUTPUT_CHARS))
            }
        };
        CommandOutcome {
            success: true,
            message: "Command completed successfully".to_string(),
            output,
            error: None,
            exit_code: Some(0),
            timed_out: false,
            idle_timed_out: false,
            pid: raw.pid,
            background_task_id: None,
        }
    } else {
        CommandOutcome {
            success: false,
            message: format!("Command failed with exit code {}", raw.exit_code),
            output: non_blank(&raw.stdout)
                .map(|text| truncate_tail(text, MAX_FAILURE_STDOUT_CHARS)),
            error: non_blank(&raw.stderr).map(|text| truncate_tail(text, MAX_OUTPUT_CHARS)),
            exit_code: Some(raw.exit_code),
            timed_out: false,
            idle_timed_out: false,
            pid: raw.pid,
            background_task_id: None,
        }
    }
}
