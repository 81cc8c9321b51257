//! Heredoc segmentation.
//!
//! Splits a command string into text that must be safety-checked and heredoc
//! body text that must be ignored. A command may contain several heredocs;
//! text after a closing delimiter is always checked again. The output of
//! [`strip_heredoc_bodies`] is advisory only — the executor always receives
//! the original, unmodified command.

use once_cell::sync::Lazy;
use regex::Regex;

/// `<<` or `<<-`, optional whitespace, then a delimiter word that may be
/// single- or double-quoted.
static HEREDOC_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<<(-?)[ \t]*(?:'([^']+)'|"([^"]+)"|([A-Za-z_][A-Za-z0-9_]*))"#)
        .expect("heredoc opener regex")
});

struct Opener {
    start: usize,
    end: usize,
    strip_tabs: bool,
    delimiter: String,
}

/// Returns the concatenation of every fragment of `command` that is real
/// shell text, with heredoc bodies (and their delimiter lines) removed.
///
/// An unterminated heredoc consumes the rest of the string, so only the text
/// before its opener is returned.
pub fn strip_heredoc_bodies(command: &str) -> String {
    let mut checked = String::new();
    let mut rest = command;

    loop {
        let opener = match find_opener(rest) {
            Some(opener) => opener,
            None => {
                checked.push_str(rest);
                return checked;
            }
        };

        checked.push_str(&rest[..opener.start]);
        let after = &rest[opener.end..];
        match closing_line_end(after, &opener.delimiter, opener.strip_tabs) {
            Some(resume) => rest = &after[resume..],
            None => return checked,
        }
    }
}

fn find_opener(text: &str) -> Option<Opener> {
    for caps in HEREDOC_OPENER.captures_iter(text) {
        let whole = caps.get(0).expect("capture 0 always present");
        // `<<<` is a herestring, not a heredoc; the regex would otherwise
        // match its trailing `<<word`.
        if whole.start() > 0 && text.as_bytes()[whole.start() - 1] == b'<' {
            continue;
        }
        let delimiter = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_string())?;
        return Some(Opener {
            start: whole.start(),
            end: whole.end(),
            strip_tabs: &caps[1] == "-",
            delimiter,
        });
    }
    None
}

/// Byte offset in `body` where checking resumes after the line matching
/// `delimiter`, or `None` when the heredoc never closes. The delimiter must
/// occupy the line from its start (tabs excepted for `<<-`), with only
/// trailing whitespace allowed. The delimiter line's own newline is NOT
/// consumed, so the text after it stays a separate chain segment.
fn closing_line_end(body: &str, delimiter: &str, strip_tabs: bool) -> Option<usize> {
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        let line_end = offset + line.len();
        let (content, had_newline) = match line.strip_suffix('\n') {
            Some(content) => (content, true),
            None => (line, false),
        };
        let content = content.strip_suffix('\r').unwrap_or(content);
        let candidate = if strip_tabs {
            content.trim_start_matches('\t')
        } else {
            content
        };
        if candidate.trim_end_matches([' ', '\t']) == delimiter {
            return Some(if had_newline { line_end - 1 } else { line_end });
        }
        offset = line_end;
    }
    None
}
