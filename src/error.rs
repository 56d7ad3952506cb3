use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Tool '{tool}' not found: {program}")]
    ToolNotFound { tool: String, program: String },

    #[error("Tool '{tool}' timed out after {secs}s on {file}")]
    ToolTimeout {
        tool: String,
        file: PathBuf,
        secs: u64,
    },

    #[error("Tool '{tool}' crashed on {file}: {detail}")]
    ToolCrash {
        tool: String,
        file: PathBuf,
        detail: String,
    },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn corpus(msg: impl Into<String>) -> Self {
        Self::Corpus(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn tool_crash(tool: impl Into<String>, file: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::ToolCrash {
            tool: tool.into(),
            file: file.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
