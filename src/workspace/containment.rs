//! Canonical path containment.
//!
//! The single place symlink-escape defense lives: a target is inside the
//! workspace only if its canonical (symlink-resolved) path is the canonical
//! workspace root or a descendant of it. Literal-path checks are not enough —
//! a workspace-internal symlink may resolve outside the workspace.
//!
//! Canonicalization is injected as [`FilesystemResolver`] so the logic stays
//! testable with fake mappings; [`OsFilesystemResolver`] wires it to the real
//! filesystem.

use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::BlockedReason;

/// Resolves a path to its canonical, symlink-free form.
#[async_trait]
pub trait FilesystemResolver: Send + Sync {
    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Canonicalizes through the operating system, resolving symlinks.
pub struct OsFilesystemResolver;

#[async_trait]
impl FilesystemResolver for OsFilesystemResolver {
    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || dunce::canonicalize(path))
            .await
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?
    }
}

/// Joins `raw` to `root` when relative; absolute paths pass through.
pub(crate) fn join_to_root(root: &Path, raw: &str) -> PathBuf {
    let raw_path = Path::new(raw);
    if raw_path.is_absolute() {
        raw_path.to_path_buf()
    } else {
        root.join(raw_path)
    }
}

/// Lexical normalization: `..` pops, `.` drops. No filesystem access.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}

/// Whether `raw` (relative tokens joined to `root` first) canonicalizes to
/// the workspace root or a descendant of it.
///
/// A target that does not exist yet cannot be canonicalized directly; its
/// deepest existing ancestor is canonicalized instead and the remaining
/// components re-appended, so `rm missing.txt` inside the workspace stays
/// permitted while `../escape` is still caught. Any other resolver failure
/// refuses containment.
pub async fn path_is_contained(
    resolver: &dyn FilesystemResolver,
    root: &Path,
    raw: &str,
) -> bool {
    let canonical_root = match resolver.canonicalize(root).await {
        Ok(path) => path,
        Err(err) => {
            tracing::warn!(
                root = %root.display(),
                error = %err,
                "workspace root failed to canonicalize; refusing containment"
            );
            return false;
        }
    };

    let joined = join_to_root(root, raw);
    match resolver.canonicalize(&joined).await {
        Ok(canonical) => is_descendant(&canonical_root, &canonical),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            match canonicalize_existing_prefix(resolver, &normalize_path(&joined)).await {
                Some(rebuilt) => is_descendant(&canonical_root, &rebuilt),
                None => false,
            }
        }
        Err(err) => {
            tracing::warn!(
                path = %joined.display(),
                error = %err,
                "target failed to canonicalize; refusing containment"
            );
            false
        }
    }
}

fn is_descendant(root: &Path, candidate: &Path) -> bool {
    candidate == root || candidate.starts_with(root)
}

/// Canonicalizes the deepest existing ancestor of `path` and re-appends the
/// non-existing tail components.
async fn canonicalize_existing_prefix(
    resolver: &dyn FilesystemResolver,
    path: &Path,
) -> Option<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut tail: Vec<OsString> = Vec::new();

    loop {
        match resolver.canonicalize(&existing).await {
            Ok(canonical) => {
                let mut rebuilt = canonical;
                for part in tail.iter().rev() {
                    rebuilt.push(part);
                }
                return Some(rebuilt);
            }
            Err(_) => {
                let name = existing.file_name()?.to_os_string();
                let parent = existing.parent()?.to_path_buf();
                tail.push(name);
                existing = parent;
            }
        }
    }
}

/// Normalizes an optional per-request working-directory override against the
/// workspace root; escapes are refused before anything executes.
pub async fn sanitize_working_dir(
    resolver: &dyn FilesystemResolver,
    root: &Path,
    working_dir: Option<&str>,
) -> Result<PathBuf, BlockedReason> {
    let dir = match working_dir {
        Some(dir) if !dir.trim().is_empty() => dir,
        _ => return Ok(root.to_path_buf()),
    };

    if path_is_contained(resolver, root, dir).await {
        Ok(normalize_path(&join_to_root(root, dir)))
    } else {
        Err(BlockedReason::WorkingDirEscape {
            dir: dir.to_string(),
        })
    }
}
