use crate::error::{Error, Result};
use crate::taxonomy::{self, CategoryRule};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
    /// Keyword table mapping marker/message text to category tags.
    /// Replaces the stock table wholesale when present.
    #[serde(default = "taxonomy::default_rules")]
    pub category_rules: Vec<CategoryRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorpusConfig {
    /// Marker token that introduces a ground-truth expectation in a fixture.
    #[serde(default = "default_marker_token")]
    pub marker_token: String,
    /// File extensions considered fixtures.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            marker_token: default_marker_token(),
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatcherConfig {
    /// Max |expected line - reported line| for two same-category items to
    /// still count as the same defect.
    #[serde(default = "default_line_tolerance")]
    pub line_tolerance: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            line_tolerance: default_line_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Wall-clock budget per (file, tool) subprocess.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Cap on captured bytes per stream.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: u64,
    /// Worker pool size. 0 = available parallelism.
    #[serde(default)]
    pub workers: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
            workers: 0,
        }
    }
}

impl RunnerConfig {
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}

/// Descriptor for one external analyzer.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    /// Executable path or bare program name resolved via PATH.
    pub program: String,
    /// Argument template; every occurrence of `{file}` is replaced with the
    /// fixture path.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Output format tag selecting the normalizer adapter.
    pub format: String,
    /// Exit codes that mean "ran fine" under this tool's convention.
    /// Anything else is a crash.
    #[serde(default = "default_ok_exit_codes")]
    pub ok_exit_codes: Vec<i32>,
    /// Parse stderr instead of stdout (cppcheck writes its XML there).
    #[serde(default)]
    pub parse_stderr: bool,
    /// Per-tool timeout override.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

// Defaults
fn default_marker_token() -> String {
    "Issue:".into()
}
fn default_extensions() -> Vec<String> {
    ["c", "cc", "cpp", "cxx", "h", "hpp"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_line_tolerance() -> u32 {
    2
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_output_bytes() -> u64 {
    1024 * 1024
}
fn default_args() -> Vec<String> {
    vec!["{file}".into()]
}
fn default_ok_exit_codes() -> Vec<i32> {
    vec![0]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus: CorpusConfig::default(),
            matcher: MatcherConfig::default(),
            runner: RunnerConfig::default(),
            tools: Vec::new(),
            category_rules: taxonomy::default_rules(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::config(format!("Failed to parse config: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.tools.is_empty() {
            return Err(Error::config(
                "No tools configured. Add at least one [[tools]] entry.",
            ));
        }
        for tool in &self.tools {
            if tool.name.is_empty() || tool.program.is_empty() {
                return Err(Error::config(format!(
                    "Tool entry missing name or program: {:?}",
                    tool.name
                )));
            }
        }
        if self.corpus.marker_token.trim().is_empty() {
            return Err(Error::config("corpus.marker_token must not be blank"));
        }
        Ok(())
    }
}
