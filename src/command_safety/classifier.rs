//! Output-shaping classification.
//!
//! Categorizes a command by its leading tokens into one of three strategies
//! used by the result formatter. Pure and deterministic: the same command
//! string always classifies the same way.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How much of a successful command's stdout the caller should see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStrategy {
    /// The output IS the result (`git status`, `ls`, `cat`, …): surface it.
    Full,
    /// Build/test commands whose success output is noise: surface a
    /// placeholder instead of the log.
    Minimal,
    /// Everything else: behaves like [`OutputStrategy::Full`].
    Default,
}

/// Commands whose output is the answer the agent asked for.
static FULL_OUTPUT_COMMANDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^git\s+(status|diff|log|show|branch|remote|rev-parse|blame)\b",
        r"^(ls|dir|tree)\b",
        r"^(cat|head|tail|less|more)\b",
        r"^(grep|rg|ag|ack)\b",
        r"^find\b",
        r"^(ps|top|df|du|free|uptime)\b",
        r"^(curl|wget)\b",
        r"^(echo|printf|pwd|which|whoami|date|env|printenv|uname|hostname)\b",
        r"^(wc|file|stat|diff)\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("full-output classifier regex"))
    .collect()
});

/// Build/test runners whose success output should stay out of context.
static QUIET_ON_SUCCESS_COMMANDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^(npm|yarn|pnpm|bun)\s+(run\s+)?(test|build|lint|typecheck|check|format|fmt)\b",
        r"^cargo\s+(test|build|check|clippy|fmt)\b",
        r"^go\s+(build|test|vet|fmt)\b",
        r"^(pytest|tox|jest|vitest|mocha|tsc|eslint|ruff|mypy)\b",
        r"^python3?\s+-m\s+(pytest|unittest)\b",
        r"^make(\s|$)",
        r"^(mvn|gradle|\./gradlew)\s+(test|build|verify|assemble)\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("quiet-on-success classifier regex"))
    .collect()
});

/// First match wins across the two ordered families; no match falls through
/// to [`OutputStrategy::Default`].
pub fn classify_command(command: &str) -> OutputStrategy {
    let trimmed = command.trim();
    if FULL_OUTPUT_COMMANDS.iter().any(|re| re.is_match(trimmed)) {
        return OutputStrategy::Full;
    }
    if QUIET_ON_SUCCESS_COMMANDS
        .iter()
        .any(|re| re.is_match(trimmed))
    {
        return OutputStrategy::Minimal;
    }
    OutputStrategy::Default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_back_commands_are_full() {
        assert_eq!(classify_command("git status"), OutputStrategy::Full);
        assert_eq!(classify_command("ls -la"), OutputStrategy::Full);
        assert_eq!(classify_command("cat README.md"), OutputStrategy::Full);
        assert_eq!(classify_command("  grep -rn TODO src  "), OutputStrategy::Full);
        assert_eq!(classify_command("curl -s https://example.com"), OutputStrategy::Full);
        assert_eq!(classify_command("ps aux"), OutputStrategy::Full);
    }

    #[test]
    fn build_and_test_commands_are_minimal() {
        assert_eq!(classify_command("npm run test"), OutputStrategy::Minimal);
        assert_eq!(classify_command("npm test"), OutputStrategy::Minimal);
        assert_eq!(classify_command("cargo test --all"), OutputStrategy::Minimal);
        assert_eq!(classify_command("go build ./..."), OutputStrategy::Minimal);
        assert_eq!(classify_command("pytest -x"), OutputStrategy::Minimal);
        assert_eq!(classify_command("make"), OutputStrategy::Minimal);
    }

    #[test]
    fn unknown_commands_fall_through_to_default() {
        assert_eq!(classify_command("./run_server.sh"), OutputStrategy::Default);
        assert_eq!(classify_command("python script.py"), OutputStrategy::Default);
        assert_eq!(classify_command(""), OutputStrategy::Default);
    }

    #[test]
    fn destructive_git_subcommands_are_not_full() {
        // Only read-back git subcommands classify as Full.
        assert_eq!(classify_command("git push"), OutputStrategy::Default);
        assert_eq!(classify_command("git reset --hard"), OutputStrategy::Default);
    }

    #[test]
    fn classification_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(classify_command("npm run build"), OutputStrategy::Minimal);
            assert_eq!(classify_command("git status"), OutputStrategy::Full);
        }
    }
}
