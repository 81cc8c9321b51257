//! Containment guard for `rm` invocations.
//!
//! Bare `rm` with an explicit path is allowed — but only inside a workspace
//! root that is a version-controlled tree, and only when every target
//! (explicit or wildcard-expanded) canonicalizes inside that root. The flow:
//!
//! no `rm` present → pass through
//! → require a workspace root (fail closed)
//! → require the root to be inside a git work tree (fresh probe, fail closed)
//! → extract targets per chain segment, wildcard vs. explicit
//! → validate every target; one bad target blocks the whole command.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use crate::config::constants::REPOSITORY_PROBE_TIMEOUT_MS;
use crate::error::BlockedReason;
use crate::workspace::containment::{path_is_contained, FilesystemResolver};
use crate::workspace::wildcard::{is_wildcard, validate_wildcard_target, GlobSearch};

/// Answers whether a directory sits inside a version-controlled work tree.
#[async_trait]
pub trait RepositoryCheck: Send + Sync {
    async fn is_inside_work_tree(&self, path: &Path) -> Result<bool>;
}

/// Production probe: `git rev-parse --is-inside-work-tree`, short timeout,
/// requires exit 0 and stdout `true`. Runs fresh on every call so the answer
/// never goes stale.
pub struct GitWorkTreeProbe;

#[async_trait]
impl RepositoryCheck for GitWorkTreeProbe {
    async fn is_inside_work_tree(&self, path: &Path) -> Result<bool> {
        let mut probe = Command::new("git");
        probe
            .arg("rev-parse")
            .arg("--is-inside-work-tree")
            .current_dir(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let output = tokio::time::timeout(
            Duration::from_millis(REPOSITORY_PROBE_TIMEOUT_MS),
            probe.output(),
        )
        .await
        .context("repository probe timed out")?
        .context("failed to run git")?;

        Ok(output.status.success()
            && String::from_utf8_lossy(&output.stdout).trim() == "true")
    }
}

/// A path token as written by the command author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTarget {
    pub raw: String,
    pub is_wildcard: bool,
}

/// Argument vectors (tokens after the program name) for every chain segment
/// that invokes `rm`, with leading `sudo` and environment assignments
/// unwrapped.
fn rm_argument_lists(segments: &[String]) -> Vec<Vec<String>> {
    let mut invocations = Vec::new();
    for segment in segments {
        let tokens = match shell_words::split(segment) {
            Ok(tokens) => tokens,
            // Unbalanced quotes and the like: fall back to whitespace tokens
            // rather than letting the segment dodge inspection.
            Err(_) => segment.split_whitespace().map(str::to_string).collect(),
        };

        let mut tokens = tokens.as_slice();
        while tokens
            .first()
            .is_some_and(|token| token == "sudo" || is_env_assignment(token))
        {
            tokens = &tokens[1..];
        }

        let Some(program) = tokens.first() else {
            continue;
        };
        if command_basename(program) == "rm" {
            invocations.push(tokens[1..].to_vec());
        }
    }
    invocations
}

fn is_env_assignment(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && name
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        None => false,
    }
}

fn command_basename(program: &str) -> &str {
    Path::new(program)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(program)
}

/// Separates flags from path tokens; `--` ends flag parsing.
fn extract_targets(arguments: &[String]) -> Vec<PathTarget> {
    let mut targets = Vec::new();
    let mut flags_done = false;
    for token in arguments {
        if !flags_done {
            if token == "--" {
                flags_done = true;
                continue;
            }
            if token.starts_with('-') && token.len() > 1 {
                continue;
            }
        }
        targets.push(PathTarget {
            raw: token.clone(),
            is_wildcard: is_wildcard(token),
        });
    }
    targets
}

/// Validates every `rm` target in the checked command's chain segments.
/// Passes through untouched when no segment invokes `rm`.
pub async fn check_rm_containment(
    segments: &[String],
    root: Option<&Path>,
    repository: &dyn RepositoryCheck,
    search: &dyn GlobSearch,
    resolver: &dyn FilesystemResolver,
    max_glob_matches: usize,
) -> Result<(), BlockedReason> {
    let invocations = rm_argument_lists(segments);
    if invocations.is_empty() {
        return Ok(());
    }

    let root = root.ok_or(BlockedReason::NoWorkspaceRoot)?;

    match repository.is_inside_work_tree(root).await {
        Ok(true) => {}
        Ok(false) => return Err(BlockedReason::NotRepository),
        Err(err) => {
            tracing::warn!(
                root = %root.display(),
                error = %format!("{err:#}"),
                "repository probe failed; blocking rm"
            );
            return Err(BlockedReason::NotRepository);
        }
    }

    for arguments in &invocations {
        for target in extract_targets(arguments) {
            if target.is_wildcard {
                validate_wildcard_target(&target.raw, root, search, resolver, max_glob_matches)
                    .await?;
            } else if !path_is_contained(resolver, root, &target.raw).await {
                return Err(BlockedReason::PathEscape { path: target.raw });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_safety::split_chain_segments;
    use crate::workspace::containment::OsFilesystemResolver;
    use crate::workspace::wildcard::GlobWalker;
    use std::fs;
    use tempfile::TempDir;

    struct FakeRepo {
        inside: bool,
    }

    #[async_trait]
    impl RepositoryCheck for FakeRepo {
        async fn is_inside_work_tree(&self, _path: &Path) -> Result<bool> {
            Ok(self.inside)
        }
    }

    struct FailingRepo;

    #[async_trait]
    impl RepositoryCheck for FailingRepo {
        async fn is_inside_work_tree(&self, _path: &Path) -> Result<bool> {
            anyhow::bail!("git binary missing")
        }
    }

    fn segments(command: &str) -> Vec<String> {
        split_chain_segments(command)
    }

    async fn check(
        command: &str,
        root: Option<&Path>,
        repo_inside: bool,
    ) -> Result<(), BlockedReason> {
        check_rm_containment(
            &segments(command),
            root,
            &FakeRepo { inside: repo_inside },
            &GlobWalker,
            &OsFilesystemResolver,
            100,
        )
        .await
    }

    #[test]
    fn rm_detection_handles_paths_sudo_and_env_prefixes() {
        assert_eq!(rm_argument_lists(&segments("rm file.txt")).len(), 1);
        assert_eq!(rm_argument_lists(&segments("/bin/rm file.txt")).len(), 1);
        assert_eq!(rm_argument_lists(&segments("sudo rm file.txt")).len(), 1);
        assert_eq!(rm_argument_lists(&segments("FOO=1 rm file.txt")).len(), 1);
        assert_eq!(
            rm_argument_lists(&segments("echo a && rm b && rm c")).len(),
            2
        );
        assert!(rm_argument_lists(&segments("echo rm")).is_empty());
        assert!(rm_argument_lists(&segments("format file.txt")).is_empty());
    }

    #[test]
    fn target_extraction_skips_flags_and_honors_double_dash() {
        let targets = extract_targets(&[
            "-rf".to_string(),
            "build/".to_string(),
            "*.log".to_string(),
        ]);
        assert_eq!(targets.len(), 2);
        assert!(!targets[0].is_wildcard);
        assert!(targets[1].is_wildcard);

        let dashed = extract_targets(&["--".to_string(), "-weird-name".to_string()]);
        assert_eq!(dashed.len(), 1);
        assert_eq!(dashed[0].raw, "-weird-name");
    }

    #[tokio::test]
    async fn commands_without_rm_pass_through() {
        assert!(check("git status && ls", None, false).await.is_ok());
    }

    #[tokio::test]
    async fn rm_without_workspace_root_is_blocked() {
        let verdict = check("rm file.txt", None, true).await;
        assert_eq!(verdict, Err(BlockedReason::NoWorkspaceRoot));
        assert!(verdict
            .unwrap_err()
            .to_string()
            .contains("no workspace root"));
    }

    #[tokio::test]
    async fn rm_outside_a_repository_is_blocked() {
        let ws = TempDir::new().unwrap();
        let verdict = check("rm file.txt", Some(ws.path()), false).await;
        assert_eq!(verdict, Err(BlockedReason::NotRepository));
        assert!(verdict
            .unwrap_err()
            .to_string()
            .contains("git repositories"));
    }

    #[tokio::test]
    async fn probe_failure_fails_closed() {
        let ws = TempDir::new().unwrap();
        let verdict = check_rm_containment(
            &segments("rm file.txt"),
            Some(ws.path()),
            &FailingRepo,
            &GlobWalker,
            &OsFilesystemResolver,
            100,
        )
        .await;
        assert_eq!(verdict, Err(BlockedReason::NotRepository));
    }

    #[tokio::test]
    async fn contained_targets_are_allowed() {
        let ws = TempDir::new().unwrap();
        fs::write(ws.path().join("file.txt"), "x").unwrap();
        assert!(check("rm file.txt", Some(ws.path()), true).await.is_ok());
        assert!(check("rm -rf file.txt missing.txt", Some(ws.path()), true)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn absolute_escape_is_blocked_with_path_in_reason() {
        let ws = TempDir::new().unwrap();
        let verdict = check("rm /etc/passwd", Some(ws.path()), true).await;
        match verdict {
            Err(BlockedReason::PathEscape { path }) => assert_eq!(path, "/etc/passwd"),
            other => panic!("expected PathEscape, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn one_unsafe_segment_blocks_the_whole_chain() {
        let ws = TempDir::new().unwrap();
        fs::write(ws.path().join("safe.txt"), "x").unwrap();
        let verdict = check(
            "rm safe.txt && rm /etc/hosts",
            Some(ws.path()),
            true,
        )
        .await;
        assert!(matches!(verdict, Err(BlockedReason::PathEscape { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn wildcard_expanding_through_a_symlink_is_blocked() {
        let ws = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("real.txt"), "x").unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("real.txt"),
            ws.path().join("lure.txt"),
        )
        .unwrap();

        let verdict = check("rm *.txt", Some(ws.path()), true).await;
        assert!(matches!(verdict, Err(BlockedReason::WildcardEscape { .. })));
    }

    #[tokio::test]
    async fn wildcard_with_no_matches_is_allowed() {
        let ws = TempDir::new().unwrap();
        assert!(check("rm *.absent", Some(ws.path()), true).await.is_ok());
    }
}
