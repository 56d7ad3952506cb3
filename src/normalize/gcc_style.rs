//! `file:line[:col]: severity: message` adapter, the convention shared by
//! gcc, clang and clang-tidy. Context lines (code excerpts, caret markers,
//! "N warnings generated.") are counted as skipped rather than failing the
//! parse.

use super::{Diagnostic, NormalizedOutput, line_number};
use crate::taxonomy::{CategoryMap, Severity};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<file>[^:\s][^:]*):(?P<line>\d+)(?::(?P<col>\d+))?:\s*(?P<sev>[A-Za-z][A-Za-z ]*):\s*(?P<msg>.+)$")
        .unwrap()
});

pub fn parse(tool: &str, raw: &str, categories: &CategoryMap) -> NormalizedOutput {
    let mut out = NormalizedOutput::default();

    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(caps) = LINE_RE.captures(line) else {
            out.skipped_lines += 1;
            continue;
        };
        let Ok(line_no) = caps["line"].parse::<u64>() else {
            out.skipped_lines += 1;
            continue;
        };
        let msg = caps["msg"].trim().to_string();
        out.diagnostics.push(Diagnostic {
            file: PathBuf::from(&caps["file"]),
            line: line_number(line_no),
            severity: Severity::from_raw(&caps["sev"]),
            category: categories.classify(&msg),
            tool: tool.to_string(),
            message: msg,
        });
    }

    out
}
