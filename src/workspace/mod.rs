//! Workspace boundary enforcement.
//!
//! Resolution of a task's workspace root, canonical path containment,
//! wildcard expansion validation, and the `rm` guard.

pub mod containment;
pub mod rm_guard;
pub mod wildcard;

use std::path::PathBuf;

use async_trait::async_trait;

pub use containment::{
    path_is_contained, sanitize_working_dir, FilesystemResolver, OsFilesystemResolver,
};
pub use rm_guard::{check_rm_containment, GitWorkTreeProbe, PathTarget, RepositoryCheck};
pub use wildcard::{is_wildcard, validate_wildcard_target, GlobMatch, GlobSearch, GlobWalker};

/// Maps a task to its workspace root, when one is configured.
#[async_trait]
pub trait WorkspaceRootResolver: Send + Sync {
    async fn effective_root(&self, task_id: &str) -> Option<PathBuf>;
}

/// Fixed-root resolver: every task maps to the same workspace root (or none).
pub struct StaticWorkspaceResolver {
    root: Option<PathBuf>,
}

impl StaticWorkspaceResolver {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

#[async_trait]
impl WorkspaceRootResolver for StaticWorkspaceResolver {
    async fn effective_root(&self, _task_id: &str) -> Option<PathBuf> {
        self.root.clone()
    }
}

/// Per-call view of the workspace. Recomputed on every request — never cached
/// across calls — so decisions always reflect the current workspace state.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    pub root: Option<PathBuf>,
}

impl WorkspaceContext {
    pub async fn resolve(resolver: &dyn WorkspaceRootResolver, task_id: &str) -> Self {
        Self {
            root: resolver.effective_root(task_id).await,
        }
    }
}
