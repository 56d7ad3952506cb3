//! cppcheck XML (v2) adapter.
//!
//! The schema is shallow and line-oriented in practice:
//!
//! ```xml
//! <error id="nullPointer" severity="error" msg="Null pointer dereference: ptr">
//!   <location file="bad.c" line="21" column="5"/>
//! </error>
//! ```
//!
//! Parsing is per-line so a truncated or interleaved document loses only the
//! damaged entries. An `<error>` with no `<location>` is a file-level
//! diagnostic; one with several locations yields one diagnostic each.

use super::{Diagnostic, NormalizedOutput, line_number};
use crate::taxonomy::{CategoryMap, Severity};
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)="([^"]*)""#).unwrap());

fn attrs(line: &str) -> HashMap<&str, String> {
    ATTR_RE
        .captures_iter(line)
        .map(|c| {
            let key = c.get(1).unwrap().as_str();
            let value = unescape(c.get(2).unwrap().as_str());
            (key, value)
        })
        .collect()
}

fn unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#039;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Attributes of the `<error>` element currently open.
struct Pending {
    id: String,
    severity: Severity,
    msg: String,
    located: bool,
}

fn emit(
    out: &mut NormalizedOutput,
    categories: &CategoryMap,
    tool: &str,
    id: &str,
    severity: Severity,
    msg: &str,
    file: String,
    line: Option<usize>,
) {
    out.diagnostics.push(Diagnostic {
        file: PathBuf::from(file),
        line,
        severity,
        category: categories.classify(&format!("{id} {msg}")),
        tool: tool.to_string(),
        message: msg.to_string(),
    });
}

fn flush(out: &mut NormalizedOutput, categories: &CategoryMap, tool: &str, pending: Option<Pending>) {
    if let Some(p) = pending
        && !p.located
    {
        emit(
            out,
            categories,
            tool,
            &p.id,
            p.severity,
            &p.msg,
            String::new(),
            None,
        );
    }
}

pub fn parse(tool: &str, raw: &str, categories: &CategoryMap) -> NormalizedOutput {
    let mut out = NormalizedOutput::default();
    let mut pending: Option<Pending> = None;

    for line in raw.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("<error ") {
            // An unlocated previous entry flushes as file-level.
            flush(&mut out, categories, tool, pending.take());

            let a = attrs(trimmed);
            let (Some(id), Some(msg)) = (a.get("id"), a.get("msg")) else {
                out.skipped_lines += 1;
                continue;
            };
            let severity = Severity::from_raw(a.get("severity").map(String::as_str).unwrap_or(""));

            if trimmed.ends_with("/>") {
                emit(&mut out, categories, tool, id, severity, msg, String::new(), None);
            } else {
                pending = Some(Pending {
                    id: id.clone(),
                    severity,
                    msg: msg.clone(),
                    located: false,
                });
            }
        } else if trimmed.starts_with("<location ") {
            let Some(p) = pending.as_mut() else {
                out.skipped_lines += 1;
                continue;
            };
            let a = attrs(trimmed);
            let Some(line_attr) = a.get("line").and_then(|l| l.parse::<u64>().ok()) else {
                out.skipped_lines += 1;
                continue;
            };
            let file = a.get("file").cloned().unwrap_or_default();
            let (id, severity, msg) = (p.id.clone(), p.severity, p.msg.clone());
            p.located = true;
            emit(
                &mut out,
                categories,
                tool,
                &id,
                severity,
                &msg,
                file,
                line_number(line_attr),
            );
        } else if trimmed.starts_with("</error>") {
            flush(&mut out, categories, tool, pending.take());
        }
        // <?xml?>, <results>, <cppcheck version>, </results>: structure, not findings.
    }

    flush(&mut out, categories, tool, pending.take());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::CategoryMap;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<results version="2">
  <cppcheck version="2.13"/>
  <errors>
    <error id="bufferAccessOutOfBounds" severity="error" msg="Array 'arr[5]' accessed at index 10, which is out of bounds.">
      <location file="tests/basic/vulnerable.c" line="50" column="34"/>
    </error>
    <error id="nullPointer" severity="error" msg="Null pointer dereference: ptr">
      <location file="tests/basic/vulnerable.c" line="21" column="6"/>
    </error>
    <error id="memleak" severity="error" msg="Memory leak: data">
      <location file="tests/basic/vulnerable.c" line="36" column="1"/>
    </error>
    <error id="missingIncludeSystem" severity="information" msg="Include file not found"/>
  </errors>
</results>
"#;

    #[test]
    fn parses_located_errors() {
        let out = parse("cppcheck", SAMPLE, &CategoryMap::default());
        assert_eq!(out.diagnostics.len(), 4);
        assert_eq!(out.skipped_lines, 0);

        let d = &out.diagnostics[0];
        assert_eq!(d.line, Some(50));
        assert_eq!(d.category, "buffer-overflow");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.tool, "cppcheck");

        assert_eq!(out.diagnostics[1].category, "null-deref");
        assert_eq!(out.diagnostics[2].category, "resource-leak");
    }

    #[test]
    fn self_closing_error_is_file_level() {
        let out = parse("cppcheck", SAMPLE, &CategoryMap::default());
        let d = &out.diagnostics[3];
        assert_eq!(d.line, None);
        assert_eq!(d.severity, Severity::Info);
    }

    #[test]
    fn error_without_location_is_file_level() {
        let raw = r#"<error id="toomanyconfigs" severity="information" msg="Too many #ifdef configurations">
</error>"#;
        let out = parse("cppcheck", raw, &CategoryMap::default());
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].line, None);
    }

    #[test]
    fn multiple_locations_yield_multiple_diagnostics() {
        let raw = r#"<error id="memleak" severity="error" msg="Memory leak: data">
  <location file="a.c" line="36"/>
  <location file="a.c" line="40"/>
</error>"#;
        let out = parse("cppcheck", raw, &CategoryMap::default());
        assert_eq!(out.diagnostics.len(), 2);
        assert_eq!(out.diagnostics[0].line, Some(36));
        assert_eq!(out.diagnostics[1].line, Some(40));
    }

    #[test]
    fn malformed_error_line_is_counted_not_fatal() {
        let raw = r#"<error severity="error">
<error id="nullPointer" severity="error" msg="Null pointer dereference">
  <location file="a.c" line="3"/>
</error>"#;
        let out = parse("cppcheck", raw, &CategoryMap::default());
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.skipped_lines, 1);
    }

    #[test]
    fn orphan_location_is_skipped() {
        let raw = r#"<location file="a.c" line="3"/>"#;
        let out = parse("cppcheck", raw, &CategoryMap::default());
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.skipped_lines, 1);
    }

    #[test]
    fn entities_are_unescaped() {
        let raw = r#"<error id="x" severity="warning" msg="value &lt;= 0 &amp; &quot;quoted&quot;">
  <location file="a.c" line="7"/>
</error>"#;
        let out = parse("cppcheck", raw, &CategoryMap::default());
        assert_eq!(out.diagnostics[0].message, "value <= 0 & \"quoted\"");
    }

    #[test]
    fn line_zero_location_is_file_level() {
        let raw = r#"<error id="x" severity="warning" msg="whole file">
  <location file="a.c" line="0"/>
</error>"#;
        let out = parse("cppcheck", raw, &CategoryMap::default());
        assert_eq!(out.diagnostics[0].line, None);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let out = parse("cppcheck", "", &CategoryMap::default());
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.skipped_lines, 0);
    }
}
