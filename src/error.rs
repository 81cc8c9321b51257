//! Reasons a command is refused before it reaches the process runner.

use thiserror::Error;

/// A validation verdict that stops a command inside the gateway.
///
/// Every variant renders into the user-facing message as
/// `"Command blocked: <reason>"`; none of them ever reaches the process
/// runner.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BlockedReason {
    /// The checked text hit the exact blocklist or a dangerous pattern.
    #[error("{reason}")]
    Dangerous { reason: String },

    /// `rm` without any workspace boundary to contain it.
    #[error("no workspace root is set for this task, so rm has no boundary to be contained in")]
    NoWorkspaceRoot,

    /// `rm` with a workspace root that is not a version-controlled tree.
    #[error("rm is only allowed in git repositories")]
    NotRepository,

    /// An explicit `rm` target canonicalizes outside the workspace.
    #[error("rm target '{path}' resolves outside the workspace root")]
    PathEscape { path: String },

    /// A wildcard pattern escapes, or expands to a path escaping, the root.
    #[error("wildcard pattern '{pattern}' matches '{path}' outside workspace root")]
    WildcardEscape { pattern: String, path: String },

    /// A per-request working-directory override leaves the workspace.
    #[error("working directory '{dir}' escapes the workspace root")]
    WorkingDirEscape { dir: String },
}
