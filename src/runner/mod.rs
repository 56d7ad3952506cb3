//! Analyzer subprocess execution.
//!
//! One invocation per (fixture, tool) pair: spawn the tool in its own
//! process group, capture capped stdout/stderr, enforce a wall-clock
//! deadline, and guarantee the whole subprocess tree is killed and reaped on
//! every exit path, including timeout and cancellation.

pub mod pool;

use crate::config::{RunnerConfig, ToolConfig};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Raw capture from one tool invocation. Immutable once produced.
#[derive(Debug, Clone)]
pub struct RawToolOutput {
    pub tool: String,
    pub file: PathBuf,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Why a (file, tool) pair produced no findings. Recorded in the report so
/// "tool found nothing" and "tool failed" stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FailureKind {
    Timeout { secs: u64 },
    Crash { detail: String },
    NotFound { program: String },
    UnsupportedFormat { format: String },
    Cancelled,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { secs } => write!(f, "timeout after {secs}s"),
            Self::Crash { detail } => write!(f, "crash: {detail}"),
            Self::NotFound { program } => write!(f, "executable not found: {program}"),
            Self::UnsupportedFormat { format } => write!(f, "unsupported format: {format}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Substitute `{file}` in the tool's argument template.
pub fn render_args(template: &[String], file: &Path) -> Vec<String> {
    let file_str = file.to_string_lossy();
    template
        .iter()
        .map(|arg| arg.replace("{file}", &file_str))
        .collect()
}

/// Run one tool against one fixture.
pub async fn run_tool(
    tool: &ToolConfig,
    file: &Path,
    limits: &RunnerConfig,
    cancel: &watch::Receiver<bool>,
) -> Result<RawToolOutput> {
    let args = render_args(&tool.args, file);
    debug!(tool = %tool.name, file = %file.display(), ?args, "spawning analyzer");

    let mut cmd = Command::new(&tool.program);
    cmd.args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ToolNotFound {
                tool: tool.name.clone(),
                program: tool.program.clone(),
            }
        } else {
            Error::Io(e)
        }
    })?;
    let pid = child.id();

    let cap = limits.max_output_bytes;
    let stdout_task = tokio::spawn(read_capped(child.stdout.take(), cap));
    let stderr_task = tokio::spawn(read_capped(child.stderr.take(), cap));

    let timeout_secs = tool.timeout_secs.unwrap_or(limits.timeout_secs);
    let mut cancel = cancel.clone();

    let status = tokio::select! {
        status = child.wait() => status?,
        _ = tokio::time::sleep(Duration::from_secs(timeout_secs)) => {
            warn!(tool = %tool.name, file = %file.display(), timeout_secs, "analyzer timed out, killing process group");
            kill_tree(&mut child, pid).await;
            return Err(Error::ToolTimeout {
                tool: tool.name.clone(),
                file: file.to_path_buf(),
                secs: timeout_secs,
            });
        }
        _ = wait_cancelled(&mut cancel) => {
            debug!(tool = %tool.name, file = %file.display(), "cancelled, killing process group");
            kill_tree(&mut child, pid).await;
            return Err(Error::Cancelled);
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    let exit_code = status.code();
    let clean = exit_code.is_some_and(|c| tool.ok_exit_codes.contains(&c));
    if !clean {
        let detail = match exit_code {
            Some(c) => format!("exit code {c}: {}", head(&stderr, 200)),
            None => format!("terminated by signal: {}", head(&stderr, 200)),
        };
        return Err(Error::ToolCrash {
            tool: tool.name.clone(),
            file: file.to_path_buf(),
            detail,
        });
    }

    Ok(RawToolOutput {
        tool: tool.name.clone(),
        file: file.to_path_buf(),
        stdout,
        stderr,
        exit_code,
    })
}

/// Read a stream up to `cap` bytes, then drain the rest so the child never
/// blocks on a full pipe.
async fn read_capped<R>(reader: Option<R>, cap: u64) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return String::new();
    };
    let mut buf = Vec::new();
    let mut limited = reader.take(cap);
    let _ = limited.read_to_end(&mut buf).await;
    let mut rest = limited.into_inner();
    let _ = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await;
    String::from_utf8_lossy(&buf).into_owned()
}

/// Resolve only when cancellation is signalled; never resolves if the sender
/// goes away without signalling.
async fn wait_cancelled(rx: &mut watch::Receiver<bool>) {
    if *rx.borrow() {
        return;
    }
    while rx.changed().await.is_ok() {
        if *rx.borrow() {
            return;
        }
    }
    std::future::pending::<()>().await
}

/// Kill the child's whole process group and reap it.
async fn kill_tree(child: &mut Child, pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pid {
        // The child is its own group leader (process_group(0)), so the
        // negative pid reaches every descendant.
        unsafe {
            libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
    let _ = child.start_kill();
    let _ = child.wait().await;
}

fn head(s: &str, max: usize) -> String {
    let trimmed = s.trim();
    if trimmed.len() <= max {
        trimmed.to_string()
    } else {
        let mut end = max;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &trimmed[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_args_substitutes_every_occurrence() {
        let args = vec![
            "--enable=all".to_string(),
            "{file}".to_string(),
            "--log={file}.log".to_string(),
        ];
        let rendered = render_args(&args, Path::new("/corpus/a.c"));
        assert_eq!(rendered[0], "--enable=all");
        assert_eq!(rendered[1], "/corpus/a.c");
        assert_eq!(rendered[2], "--log=/corpus/a.c.log");
    }

    #[test]
    fn head_truncates_long_text() {
        let long = "x".repeat(500);
        assert!(head(&long, 200).len() < 500);
        assert_eq!(head("short", 200), "short");
    }

    #[test]
    fn failure_kind_serializes_with_tag() {
        let json = serde_json::to_string(&FailureKind::Timeout { secs: 30 }).unwrap();
        assert!(json.contains("timeout"));
        let json = serde_json::to_string(&FailureKind::Cancelled).unwrap();
        assert!(json.contains("cancelled"));
    }
}
