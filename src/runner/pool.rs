//! Bounded parallel dispatch over independent (fixture, tool) pairs.
//!
//! Pairs have no ordering dependency, so they run on a semaphore-bounded
//! `JoinSet`. Results land in a `BTreeMap` keyed by (path, tool name), so
//! downstream scoring never observes completion order.

use super::{FailureKind, RawToolOutput, run_tool};
use crate::config::{RunnerConfig, ToolConfig};
use crate::error::Error;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Outcome of one (fixture, tool) invocation.
#[derive(Debug, Clone)]
pub enum PairOutcome {
    Completed(RawToolOutput),
    Failed(FailureKind),
}

pub type PairKey = (PathBuf, String);

/// Run every tool against every fixture. Failures are isolated per pair;
/// the map always holds one entry per (file, tool).
pub async fn run_all(
    files: &[PathBuf],
    tools: &[ToolConfig],
    limits: &RunnerConfig,
    cancel: &watch::Receiver<bool>,
) -> BTreeMap<PairKey, PairOutcome> {
    let workers = limits.effective_workers();
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut set: JoinSet<(PairKey, PairOutcome)> = JoinSet::new();

    info!(
        files = files.len(),
        tools = tools.len(),
        workers,
        "dispatching analyzer runs"
    );

    for file in files {
        for tool in tools {
            let key = (file.clone(), tool.name.clone());
            let file = file.clone();
            let tool = tool.clone();
            let limits = limits.clone();
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();

            set.spawn(async move {
                // Closed only on runtime shutdown.
                let Ok(_permit) = semaphore.acquire().await else {
                    return (key, PairOutcome::Failed(FailureKind::Cancelled));
                };
                if *cancel.borrow() {
                    return (key, PairOutcome::Failed(FailureKind::Cancelled));
                }
                let outcome = match run_tool(&tool, &file, &limits, &cancel).await {
                    Ok(raw) => PairOutcome::Completed(raw),
                    Err(e) => {
                        let kind = failure_kind(e);
                        warn!(
                            tool = %tool.name,
                            file = %file.display(),
                            failure = %kind,
                            "analyzer run failed"
                        );
                        PairOutcome::Failed(kind)
                    }
                };
                (key, outcome)
            });
        }
    }

    let mut results = BTreeMap::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((key, outcome)) => {
                results.insert(key, outcome);
            }
            Err(e) => warn!(error = %e, "analyzer task panicked"),
        }
    }
    results
}

fn failure_kind(e: Error) -> FailureKind {
    match e {
        Error::ToolTimeout { secs, .. } => FailureKind::Timeout { secs },
        Error::ToolCrash { detail, .. } => FailureKind::Crash { detail },
        Error::ToolNotFound { program, .. } => FailureKind::NotFound { program },
        Error::Cancelled => FailureKind::Cancelled,
        other => FailureKind::Crash {
            detail: other.to_string(),
        },
    }
}
