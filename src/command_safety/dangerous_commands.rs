//! Detection of commands that should never be executed.
//!
//! Two layers, short-circuiting on the first hit:
//!
//! 1. an exact blocklist of bare destructive program names (`dd`, `mkfs`,
//!    `shutdown`, …) matched against the first token or the whole string;
//! 2. a pattern table catching dangerous *shapes* regardless of program name
//!    (current-directory wipes, `find … -delete`, redirection into raw
//!    devices, curl piped into a shell, service and kernel tampering, …).
//!
//! Chained commands are split once on `&&`, `||`, and `;` and each segment is
//! re-checked; bare `|` is deliberately not a boundary because pipes are used
//! legitimately by search and text-processing pipelines.
//!
//! Bare `rm` with an explicit path is NOT blocked here. That decision needs a
//! workspace boundary this module does not have; see
//! [`crate::workspace::rm_guard`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Destructive programs refused outright, matched as the first
/// whitespace-delimited token or as the entire trimmed command.
const EXACT_BLOCKLIST: &[&str] = &[
    "dd",
    "mkfs",
    "fdisk",
    "parted",
    "shred",
    "mkswap",
    "shutdown",
    "reboot",
    "halt",
    "poweroff",
    "init",
    "su",
    "sudo su",
];

/// Dangerous command shapes, evaluated against lower-cased text.
static DANGEROUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // rm aimed at the current directory, everything, root, or home —
        // scoped wildcards like `rm *.log` are the rm guard's job, not ours
        r"(?:^|\s)rm\s+(?:-[a-z]+\s+)*(?:\.{1,2}/?|\*|\./\*|/\*?|~/?)(?:\s|$)",
        r"(?:^|\s)rm\s+.*--no-preserve-root",
        // deletion driven through find
        r"(?:^|\s)find\s+.*-delete\b",
        r"(?:^|\s)find\s+.*-exec\s+rm\b",
        // history rewrites and working-tree wipes
        r"(?:^|\s)git\s+reset\s+--hard",
        r"(?:^|\s)git\s+clean\s+-[a-z]*[fd]",
        // redirection into raw block devices or system configuration
        r">\s*/dev/(?:sd|hd|nvme|disk|mmcblk)",
        r">\s*/etc/",
        // remote code piped straight into a shell
        r"(?:^|\s)(?:curl|wget)\s+[^|]*\|\s*(?:sudo\s+)?(?:ba|z|da|fi)?sh\b",
        // recursive permission or ownership changes on /
        r"(?:^|\s)(?:chmod|chown)\s+(?:-[a-z]*r[a-z]*|--recursive)\s.*\s/(?:\s|$)",
        // service and kernel control
        r"(?:^|\s)systemctl\s+(?:stop|disable|mask)\b",
        r"(?:^|\s)service\s+\S+\s+stop\b",
        r"(?:^|\s)(?:insmod|rmmod|modprobe)\s",
        r"(?:^|\s)sysctl\s+-w\b",
        // discarding files into the bit bucket
        r"(?:^|\s)mv\s+.*\s+/dev/null",
        // shell history and scheduler tampering
        r"(?:^|\s)history\s+-c\b",
        r">\s*(?:~/)?\.bash_history",
        r"(?:^|\s)crontab\s+-r\b",
        // fork bomb
        r":\s*\(\s*\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("dangerous pattern regex"))
    .collect()
});

/// The outcome of danger detection. Terminal: once `dangerous` is true no
/// further gateway stage runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DangerVerdict {
    pub dangerous: bool,
    pub reason: Option<String>,
}

impl DangerVerdict {
    fn safe() -> Self {
        Self {
            dangerous: false,
            reason: None,
        }
    }

    fn blocked(reason: impl Into<String>) -> Self {
        Self {
            dangerous: true,
            reason: Some(reason.into()),
        }
    }
}

/// Evaluates heredoc-filtered command text against the blocklist and the
/// pattern table, then re-checks each chain segment. Any dangerous segment
/// condemns the whole command.
pub fn evaluate_command(checked_text: &str) -> DangerVerdict {
    let normalized = checked_text.trim().to_lowercase();
    if normalized.is_empty() {
        return DangerVerdict::safe();
    }

    if let Some(verdict) = check_segment(&normalized) {
        return verdict;
    }
    for segment in split_chain_segments(&normalized) {
        if let Some(verdict) = check_segment(&segment) {
            return verdict;
        }
    }
    DangerVerdict::safe()
}

fn check_segment(segment: &str) -> Option<DangerVerdict> {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return None;
    }

    let first_token = trimmed.split_whitespace().next().unwrap_or("");
    for entry in EXACT_BLOCKLIST {
        if trimmed == *entry || first_token == *entry {
            return Some(DangerVerdict::blocked(format!(
                "'{entry}' is on the destructive command blocklist"
            )));
        }
    }

    for pattern in DANGEROUS_PATTERNS.iter() {
        if pattern.is_match(trimmed) {
            return Some(DangerVerdict::blocked("matches a dangerous pattern"));
        }
    }

    None
}

/// Splits command text on `&&`, `||`, `;`, and newlines in a single pass.
/// Bare `|` and `&` are not boundaries.
pub fn split_chain_segments(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];
        if (ch == '&' || ch == '|') && chars.get(index + 1) == Some(&ch) {
            flush(&mut segments, &mut current);
            index += 2;
            continue;
        }
        if ch == ';' || ch == '\n' {
            flush(&mut segments, &mut current);
            index += 1;
            continue;
        }
        current.push(ch);
        index += 1;
    }
    flush(&mut segments, &mut current);
    segments
}

fn flush(segments: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_string());
    }
    current.clear();
}
