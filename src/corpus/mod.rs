//! Fixture corpus loading: discover C/C++ fixture files under a root and
//! parse their embedded defect markers into ground-truth expectations.

pub mod marker;

use crate::config::CorpusConfig;
use crate::error::{Error, Result};
use crate::taxonomy::CategoryMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
}

impl Language {
    /// Extension-based tag. Bare `.h` headers count as C.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "c" | "h" => Some(Self::C),
            "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => Some(Self::Cpp),
            _ => None,
        }
    }
}

/// One ground-truth expectation parsed from a marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedIssue {
    /// 1-based line the defect is charged to. Always within the file.
    pub line: usize,
    /// Free text after the marker token.
    pub label: String,
    /// Canonical category tag. Never empty.
    pub category: String,
}

/// A loaded fixture file with its expectations. Read-only after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureFile {
    pub path: PathBuf,
    pub language: Language,
    #[serde(skip)]
    pub content: String,
    pub expected: Vec<ExpectedIssue>,
}

/// A file that was discovered but could not be loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusWarning {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct Corpus {
    pub root: PathBuf,
    pub files: Vec<FixtureFile>,
    pub warnings: Vec<CorpusWarning>,
}

impl Corpus {
    pub fn total_expectations(&self) -> usize {
        self.files.iter().map(|f| f.expected.len()).sum()
    }
}

/// Parse one file's content into expectations.
pub fn parse_expectations(
    content: &str,
    marker_token: &str,
    categories: &CategoryMap,
) -> Vec<ExpectedIssue> {
    marker::extract_markers(content, marker_token)
        .into_iter()
        .map(|m| ExpectedIssue {
            line: m.attributed_line,
            category: categories.classify(&m.text),
            label: m.text,
        })
        .collect()
}

/// Load every fixture under `root`. A missing or unreadable root is fatal;
/// a single unreadable file is skipped with a recorded warning.
pub fn load(root: &Path, cfg: &CorpusConfig, categories: &CategoryMap) -> Result<Corpus> {
    if !root.exists() {
        return Err(Error::corpus(format!(
            "corpus root does not exist: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    let mut warnings = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                warnings.push(CorpusWarning {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !has_fixture_extension(path, cfg) {
            continue;
        }
        let Some(language) = Language::from_path(path) else {
            continue;
        };

        match std::fs::read_to_string(path) {
            Ok(content) => {
                let expected = parse_expectations(&content, &cfg.marker_token, categories);
                debug!(
                    path = %path.display(),
                    expectations = expected.len(),
                    "loaded fixture"
                );
                files.push(FixtureFile {
                    path: path.to_path_buf(),
                    language,
                    content,
                    expected,
                });
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable fixture");
                warnings.push(CorpusWarning {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if files.is_empty() {
        return Err(Error::corpus(format!(
            "no loadable fixtures under {} ({} unreadable)",
            root.display(),
            warnings.len()
        )));
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));

    info!(
        files = files.len(),
        expectations = files.iter().map(|f| f.expected.len()).sum::<usize>(),
        skipped = warnings.len(),
        "corpus loaded"
    );

    Ok(Corpus {
        root: root.to_path_buf(),
        files,
        warnings,
    })
}

fn has_fixture_extension(path: &Path, cfg: &CorpusConfig) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_lowercase();
            cfg.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
        })
}
