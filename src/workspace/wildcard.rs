//! Wildcard target validation.
//!
//! A glob pattern is only as safe as every path it expands to. Candidates
//! come back from the [`GlobSearch`] collaborator carrying both a nominal and
//! a canonical path — the nominal path may look workspace-internal while the
//! canonical one, after symlink resolution, is not. Every canonical candidate
//! goes through the same containment check as explicit targets; a single
//! escapee rejects the whole expansion.
//!
//! Expansion failures degrade to "no matches" (the shell will report its own
//! error), but never bypass validation of anything that did expand.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::error::BlockedReason;
use crate::workspace::containment::{
    join_to_root, normalize_path, path_is_contained, FilesystemResolver,
};

/// Characters that make a token a glob pattern rather than a literal path.
const WILDCARD_CHARS: [char; 4] = ['*', '?', '[', '{'];

/// One glob candidate: the path as matched and its symlink-resolved form.
#[derive(Debug, Clone, Serialize)]
pub struct GlobMatch {
    pub path: PathBuf,
    pub canonical_path: PathBuf,
    pub is_directory: bool,
}

/// Expands a glob pattern beneath a base directory.
#[async_trait]
pub trait GlobSearch: Send + Sync {
    async fn search(
        &self,
        pattern: &str,
        base: &Path,
        max_results: usize,
    ) -> Result<Vec<GlobMatch>>;
}

/// Production glob expansion via the `glob` crate, off the async runtime.
pub struct GlobWalker;

#[async_trait]
impl GlobSearch for GlobWalker {
    async fn search(
        &self,
        pattern: &str,
        base: &Path,
        max_results: usize,
    ) -> Result<Vec<GlobMatch>> {
        let absolute = if Path::new(pattern).is_absolute() {
            pattern.to_string()
        } else {
            base.join(pattern).to_string_lossy().into_owned()
        };

        tokio::task::spawn_blocking(move || -> Result<Vec<GlobMatch>> {
            let mut matches = Vec::new();
            for entry in glob::glob(&absolute).context("invalid glob pattern")? {
                let path = entry.context("glob entry unreadable")?;
                let canonical_path = dunce::canonicalize(&path)
                    .with_context(|| format!("failed to canonicalize '{}'", path.display()))?;
                let is_directory = canonical_path.is_dir();
                matches.push(GlobMatch {
                    path,
                    canonical_path,
                    is_directory,
                });
                if matches.len() >= max_results {
                    break;
                }
            }
            Ok(matches)
        })
        .await
        .context("glob expansion task failed")?
    }
}

/// Whether a token contains any glob metacharacter.
pub fn is_wildcard(token: &str) -> bool {
    token.contains(WILDCARD_CHARS)
}

/// Validates one wildcard `rm` target against the workspace root.
pub async fn validate_wildcard_target(
    pattern: &str,
    root: &Path,
    search: &dyn GlobSearch,
    resolver: &dyn FilesystemResolver,
    max_results: usize,
) -> Result<(), BlockedReason> {
    // Cheap rejection before any I/O: a literal prefix that already escapes
    // the root cannot expand to anything inside it.
    if let Some(prefix) = escaping_literal_prefix(pattern, root) {
        return Err(BlockedReason::WildcardEscape {
            pattern: pattern.to_string(),
            path: prefix,
        });
    }

    let matches = match search.search(pattern, root, max_results).await {
        Ok(matches) => matches,
        Err(err) => {
            tracing::warn!(
                pattern,
                error = %format!("{err:#}"),
                "glob expansion failed; treating as zero matches"
            );
            return Ok(());
        }
    };

    for candidate in &matches {
        let canonical = candidate.canonical_path.to_string_lossy();
        if !path_is_contained(resolver, root, canonical.as_ref()).await {
            return Err(BlockedReason::WildcardEscape {
                pattern: pattern.to_string(),
                path: candidate.path.display().to_string(),
            });
        }
    }

    Ok(())
}

/// The literal prefix before the first wildcard character, when it escapes
/// the workspace root lexically.
fn escaping_literal_prefix(pattern: &str, root: &Path) -> Option<String> {
    let prefix_end = pattern.find(WILDCARD_CHARS).unwrap_or(pattern.len());
    let prefix = &pattern[..prefix_end];
    let normalized = normalize_path(&join_to_root(root, prefix));
    let normalized_root = normalize_path(root);
    if normalized == normalized_root || normalized.starts_with(&normalized_root) {
        None
    } else {
        Some(prefix.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use crate::workspace::containment::OsFilesystemResolver;
    use tempfile::TempDir;

    /// Test double returning a fixed candidate list (or an error), recording
    /// whether it was consulted at all.
    struct FakeGlob {
        matches: Result<Vec<GlobMatch>, String>,
        called: Arc<AtomicBool>,
    }

    impl FakeGlob {
        fn returning(matches: Vec<GlobMatch>) -> Self {
            Self {
                matches: Ok(matches),
                called: Arc::new(AtomicBool::new(false)),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                matches: Err(message.to_string()),
                called: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl GlobSearch for FakeGlob {
        async fn search(
            &self,
            _pattern: &str,
            _base: &Path,
            _max_results: usize,
        ) -> Result<Vec<GlobMatch>> {
            self.called.store(true, Ordering::SeqCst);
            match &self.matches {
                Ok(matches) => Ok(matches.clone()),
                Err(message) => Err(anyhow::anyhow!("{message}")),
            }
        }
    }

    fn candidate(path: &Path) -> GlobMatch {
        GlobMatch {
            path: path.to_path_buf(),
            canonical_path: path.to_path_buf(),
            is_directory: false,
        }
    }

    #[test]
    fn wildcard_detection() {
        assert!(is_wildcard("*.txt"));
        assert!(is_wildcard("file?.rs"));
        assert!(is_wildcard("[ab].log"));
        assert!(is_wildcard("{a,b}.toml"));
        assert!(!is_wildcard("plain/path.txt"));
    }

    #[tokio::test]
    async fn traversal_prefix_is_rejected_without_expanding() {
        let ws = TempDir::new().unwrap();
        let search = FakeGlob::returning(vec![]);
        let called = Arc::clone(&search.called);
        let resolver = OsFilesystemResolver;

        let verdict =
            validate_wildcard_target("../*.txt", ws.path(), &search, &resolver, 100).await;
        assert!(matches!(verdict, Err(BlockedReason::WildcardEscape { .. })));
        assert!(!called.load(Ordering::SeqCst), "glob must not run for escaping prefixes");
    }

    #[tokio::test]
    async fn absolute_prefix_outside_root_is_rejected_without_expanding() {
        let ws = TempDir::new().unwrap();
        let search = FakeGlob::returning(vec![]);
        let called = Arc::clone(&search.called);
        let resolver = OsFilesystemResolver;

        let verdict = validate_wildcard_target("/etc/*", ws.path(), &search, &resolver, 100).await;
        assert!(matches!(verdict, Err(BlockedReason::WildcardEscape { .. })));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn in_root_candidates_are_allowed() {
        let ws = TempDir::new().unwrap();
        fs::write(ws.path().join("a.txt"), "a").unwrap();
        let canonical = dunce::canonicalize(ws.path().join("a.txt")).unwrap();
        let search = FakeGlob::returning(vec![candidate(&canonical)]);
        let resolver = OsFilesystemResolver;

        let verdict = validate_wildcard_target("*.txt", ws.path(), &search, &resolver, 100).await;
        assert!(verdict.is_ok());
    }

    #[tokio::test]
    async fn one_escaping_candidate_rejects_the_whole_expansion() {
        let ws = TempDir::new().unwrap();
        fs::write(ws.path().join("a.txt"), "a").unwrap();
        let inside = dunce::canonicalize(ws.path().join("a.txt")).unwrap();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("b.txt"), "b").unwrap();
        let escapee = dunce::canonicalize(outside.path().join("b.txt")).unwrap();

        let search = FakeGlob::returning(vec![candidate(&inside), candidate(&escapee)]);
        let resolver = OsFilesystemResolver;

        let verdict = validate_wildcard_target("*.txt", ws.path(), &search, &resolver, 100).await;
        assert!(matches!(verdict, Err(BlockedReason::WildcardEscape { .. })));
    }

    #[tokio::test]
    async fn zero_matches_is_allowed() {
        let ws = TempDir::new().unwrap();
        let search = FakeGlob::returning(vec![]);
        let resolver = OsFilesystemResolver;
        let verdict = validate_wildcard_target("*.none", ws.path(), &search, &resolver, 100).await;
        assert!(verdict.is_ok());
    }

    #[tokio::test]
    async fn glob_errors_degrade_to_zero_matches() {
        let ws = TempDir::new().unwrap();
        let search = FakeGlob::failing("disk exploded");
        let resolver = OsFilesystemResolver;
        let verdict = validate_wildcard_target("*.txt", ws.path(), &search, &resolver, 100).await;
        assert!(verdict.is_ok());
    }

    #[tokio::test]
    async fn glob_walker_finds_files_with_canonical_paths() {
        let ws = TempDir::new().unwrap();
        fs::write(ws.path().join("one.log"), "1").unwrap();
        fs::write(ws.path().join("two.log"), "2").unwrap();
        fs::write(ws.path().join("other.txt"), "x").unwrap();

        let walker = GlobWalker;
        let matches = walker.search("*.log", ws.path(), 100).await.unwrap();
        assert_eq!(matches.len(), 2);
        let canonical_root = dunce::canonicalize(ws.path()).unwrap();
        for candidate in &matches {
            assert!(candidate.canonical_path.starts_with(&canonical_root));
            assert!(!candidate.is_directory);
        }
    }

    #[tokio::test]
    async fn glob_walker_honors_the_result_cap() {
        let ws = TempDir::new().unwrap();
        for index in 0..5 {
            fs::write(ws.path().join(format!("f{index}.log")), "x").unwrap();
        }
        let walker = GlobWalker;
        let matches = walker.search("*.log", ws.path(), 3).await.unwrap();
        assert_eq!(matches.len(), 3);
    }
}
