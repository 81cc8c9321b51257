//! Gateway-wide limits and defaults, centralized in one place.

/// Maximum characters of stdout/stderr surfaced to the caller; longer streams
/// are truncated from the tail with an explicit marker.
pub const MAX_OUTPUT_CHARS: usize = 10_000;

/// Stdout cap for failed commands, where stderr carries the signal and stdout
/// is only kept as supporting context.
pub const MAX_FAILURE_STDOUT_CHARS: usize = 5_000;

/// Placeholder returned instead of stdout for successful build/test commands.
pub const MINIMAL_OUTPUT_PLACEHOLDER: &str = "Command completed successfully.";

/// Hard ceiling on a foreground wait before the gateway stops blocking.
pub const DEFAULT_MAX_TIMEOUT_MS: u64 = 600_000;

/// Inactivity window: a process producing no output for this long ends the
/// foreground wait (the process itself is left running).
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 120_000;

/// Upper bound on wildcard expansion; patterns matching more candidates than
/// this are validated against the first `MAX_GLOB_MATCHES` results.
pub const MAX_GLOB_MATCHES: usize = 2_000;

/// Timeout for the `git rev-parse --is-inside-work-tree` probe.
pub const REPOSITORY_PROBE_TIMEOUT_MS: u64 = 5_000;
