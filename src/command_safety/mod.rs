//! Command safety detection.
//!
//! The text-level half of the gateway: heredoc segmentation, the
//! dangerous-command rules, output classification, and the audit trail.
//! Everything here is pure string work — filesystem-aware checks live in
//! [`crate::workspace`].

pub mod audit;
pub mod classifier;
pub mod dangerous_commands;
pub mod heredoc;


pub use audit::{AuditEntry, SafetyAuditLogger};
pub use classifier::{classify_command, OutputStrategy};
pub use dangerous_commands::{evaluate_command, split_chain_segments, DangerVerdict};
pub use heredoc::strip_heredoc_bodies;

/// Convenience wrapper: strip heredoc bodies, then run danger detection on
/// what remains.
pub fn evaluate_raw_command(command: &str) -> DangerVerdict {
    evaluate_command(&strip_heredoc_bodies(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heredoc_body_does_not_trigger_detection() {
        let verdict = evaluate_raw_command("cat <<EOF\nrm -rf /\nEOF");
        assert!(!verdict.dangerous);
    }

    #[test]
    fn text_after_heredoc_still_triggers_detection() {
        let verdict = evaluate_raw_command("cat <<EOF\nrm -rf /\nEOF\nrm -rf /");
        assert!(verdict.dangerous);
    }
}
