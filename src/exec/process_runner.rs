//! The process-runner boundary.
//!
//! [`ProcessRunner`] is the one collaborator that actually touches the
//! operating-system shell. It receives the ORIGINAL command text — never the
//! heredoc-filtered form, which exists only for checking — plus the working
//! directory and both timeout windows, and reports a [`RawExecutionResult`]
//! the formatter shapes without mutating.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Cap on bytes retained per stream; the formatter truncates further by
/// characters, this just bounds memory while draining.
const MAX_CAPTURE_BYTES: usize = 1024 * 1024;

/// Immutable output of one process run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
    pub idle_timed_out: bool,
    pub pid: Option<u32>,
}

/// Spawns a command and waits for it, bounded by a hard maximum duration and
/// an idle (no-new-output) window.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        command: &str,
        cwd: Option<&Path>,
        timeout_ms: u64,
        idle_timeout_ms: u64,
    ) -> Result<RawExecutionResult>;
}

enum StreamEvent {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
}

/// Production runner: `bash -c <command>` with piped stdio and pagers
/// disabled. On a timeout the wait ends but the process is left running —
/// it may still finish usefully, and the pid lets callers find it again.
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        command: &str,
        cwd: Option<&Path>,
        timeout_ms: u64,
        idle_timeout_ms: u64,
    ) -> Result<RawExecutionResult> {
        let mut shell = Command::new("bash");
        shell
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("PAGER", "cat")
            .env("GIT_PAGER", "cat")
            .env("LESS", "R");
        if let Some(dir) = cwd {
            shell.current_dir(dir);
        }

        let mut child = shell
            .spawn()
            .with_context(|| format!("failed to spawn shell for command: {command}"))?;
        let pid = child.id();

        let (sender, mut receiver) = mpsc::unbounded_channel();
        spawn_pump(child.stdout.take(), sender.clone(), StreamEvent::Stdout);
        spawn_pump(child.stderr.take(), sender, StreamEvent::Stderr);

        let hard_deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let idle_window = Duration::from_millis(idle_timeout_ms);

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut timed_out = false;
        let mut idle_timed_out = false;
        let mut exit_code = -1;

        loop {
            tokio::select! {
                event = receiver.recv() => match event {
                    Some(StreamEvent::Stdout(chunk)) => append_capped(&mut stdout, &chunk),
                    Some(StreamEvent::Stderr(chunk)) => append_capped(&mut stderr, &chunk),
                    None => {
                        // Both pipes closed. A process can close its pipes yet
                        // keep running, so the reap itself stays bounded by
                        // the remaining hard window.
                        let remaining = hard_deadline.saturating_duration_since(Instant::now());
                        match tokio::time::timeout(remaining, child.wait()).await {
                            Ok(status) => {
                                let status = status.context("failed to wait for child")?;
                                exit_code = status.code().unwrap_or(-1);
                            }
                            Err(_) => timed_out = true,
                        }
                        break;
                    }
                },
                _ = tokio::time::sleep_until(hard_deadline) => {
                    timed_out = true;
                    break;
                }
                _ = tokio::time::sleep(idle_window) => {
                    idle_timed_out = true;
                    break;
                }
            }
        }

        Ok(RawExecutionResult {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code,
            timed_out,
            idle_timed_out,
            pid,
        })
    }
}

fn append_capped(buffer: &mut Vec<u8>, chunk: &[u8]) {
    let remaining = MAX_CAPTURE_BYTES.saturating_sub(buffer.len());
    if remaining > 0 {
        buffer.extend_from_slice(&chunk[..chunk.len().min(remaining)]);
    }
}

/// Reads a stream to EOF, forwarding chunks. Keeps draining even after the
/// receiver is gone so an abandoned (timed-out) process never blocks on a
/// full pipe.
fn spawn_pump<R>(
    reader: Option<R>,
    sender: mpsc::UnboundedSender<StreamEvent>,
    wrap: fn(Vec<u8>) -> StreamEvent,
) where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    let Some(mut reader) = reader else {
        return;
    };
    tokio::spawn(async move {
        let mut buffer = [0u8; 4096];
        loop {
            match reader.read(&mut buffer).await {
                Ok(0) | Err(_) => break,
                Ok(read) => {
                    let _ = sender.send(wrap(buffer[..read].to_vec()));
                }
            }
        }
    });
}
