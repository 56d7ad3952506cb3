//! Ground-truth marker extraction.
//!
//! Fixture files label their seeded defects with a marker comment, either
//! trailing the offending code or on a comment line directly above it:
//!
//! ```c
//! // Issue: buffer overflow vulnerability
//! strcpy(buffer, input);
//!
//! *ptr = 42;  // Issue: dereferencing null pointer
//! ```
//!
//! A trailing marker is charged to its own line; a full-comment-line marker
//! is charged to the next non-blank, non-comment line. Both conventions
//! coexist in real corpora, so attribution can be off by one line. The
//! matcher's line tolerance absorbs that rather than this module trying to
//! perfect the heuristic.

/// One extracted marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// 1-based line the marker comment sits on.
    pub marker_line: usize,
    /// 1-based line the defect is charged to.
    pub attributed_line: usize,
    /// Free text after the marker token, trimmed.
    pub text: String,
}

/// Extract all markers from `content`. Pure over line-indexed text.
pub fn extract_markers(content: &str, token: &str) -> Vec<Marker> {
    let lines: Vec<&str> = content.lines().collect();
    let mut markers = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let Some(pos) = line.find(token) else {
            continue;
        };

        // The token must live in a comment, not a string literal.
        let comment_only = is_comment_line(line);
        if !comment_only {
            let before = &line[..pos];
            if !before.contains("//") && !before.contains("/*") {
                continue;
            }
        }

        let text = line[pos + token.len()..]
            .trim_end_matches("*/")
            .trim()
            .to_string();

        let attributed_line = if comment_only {
            next_code_line(&lines, idx + 1).unwrap_or(idx + 1)
        } else {
            idx + 1
        };

        markers.push(Marker {
            marker_line: idx + 1,
            attributed_line: attributed_line.min(lines.len().max(1)),
            text,
        });
    }

    markers
}

/// First non-blank, non-comment line at or after `start` (0-based), as a
/// 1-based line number.
fn next_code_line(lines: &[&str], start: usize) -> Option<usize> {
    lines[start..]
        .iter()
        .position(|l| {
            let t = l.trim();
            !t.is_empty() && !is_comment_line(l)
        })
        .map(|off| start + off + 1)
}

/// Whole-line comment check. A bare `*` prefix only counts as a block-comment
/// continuation when followed by whitespace, so `*ptr = 42;` stays code.
fn is_comment_line(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("//")
        || t.starts_with("/*")
        || t.starts_with("*/")
        || t == "*"
        || t.starts_with("* ")
}
