//! One-JSON-object-per-line adapter, for tools that stream machine-readable
//! findings. Recognized keys: `file`/`path`, `line`, `severity`, `rule`/`id`,
//! `message`/`msg`. Unparsable lines are counted and skipped.

use super::{Diagnostic, NormalizedOutput, line_number};
use crate::taxonomy::{CategoryMap, Severity};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize)]
struct RawLine {
    #[serde(alias = "path", default)]
    file: Option<String>,
    #[serde(default)]
    line: Option<u64>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(alias = "id", default)]
    rule: Option<String>,
    #[serde(alias = "msg")]
    message: String,
}

pub fn parse(tool: &str, raw: &str, categories: &CategoryMap) -> NormalizedOutput {
    let mut out = NormalizedOutput::default();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed: RawLine = match serde_json::from_str(trimmed) {
            Ok(p) => p,
            Err(_) => {
                out.skipped_lines += 1;
                continue;
            }
        };

        // Classify over the rule id and the message together, so either
        // side can carry the category keywords.
        let classify_text = match &parsed.rule {
            Some(rule) => format!("{rule} {}", parsed.message),
            None => parsed.message.clone(),
        };

        out.diagnostics.push(Diagnostic {
            file: PathBuf::from(parsed.file.unwrap_or_default()),
            line: parsed.line.and_then(line_number),
            severity: Severity::from_raw(parsed.severity.as_deref().unwrap_or("")),
            category: categories.classify(&classify_text),
            tool: tool.to_string(),
            message: parsed.message,
        });
    }

    out
}
