//! Raw tool output → canonical diagnostics.
//!
//! One adapter per supported output convention, selected by format tag. The
//! set is closed: adding a tool means adding a variant and an adapter
//! module, existing adapters stay untouched. Adapters are pure and tolerant:
//! a malformed line is counted and skipped, never fatal.

mod cppcheck;
mod gcc_style;
mod json_lines;

use crate::error::{Error, Result};
use crate::taxonomy::{CategoryMap, Severity};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// cppcheck `--xml --xml-version=2`.
    CppcheckXml,
    /// `file:line[:col]: severity: message` (gcc, clang, clang-tidy).
    Gcc,
    /// One JSON object per line.
    JsonLines,
}

impl OutputFormat {
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "cppcheck-xml" => Ok(Self::CppcheckXml),
            "gcc" => Ok(Self::Gcc),
            "json-lines" => Ok(Self::JsonLines),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Canonical finding shared by every adapter. `line` is absent for
/// file-level diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub line: Option<usize>,
    pub severity: Severity,
    pub category: String,
    pub tool: String,
    /// Original message, retained for audit.
    pub message: String,
}

#[derive(Debug, Default)]
pub struct NormalizedOutput {
    pub diagnostics: Vec<Diagnostic>,
    /// Finding-shaped lines the adapter could not parse.
    pub skipped_lines: usize,
}

/// Normalize one tool's raw output text.
pub fn normalize(
    tool: &str,
    format: OutputFormat,
    raw: &str,
    categories: &CategoryMap,
) -> NormalizedOutput {
    match format {
        OutputFormat::CppcheckXml => cppcheck::parse(tool, raw, categories),
        OutputFormat::Gcc => gcc_style::parse(tool, raw, categories),
        OutputFormat::JsonLines => json_lines::parse(tool, raw, categories),
    }
}

/// A reported line of 0 means "whole file" by long-standing tool convention.
fn line_number(raw: u64) -> Option<usize> {
    if raw == 0 { None } else { Some(raw as usize) }
}
