//! End-to-end orchestration: load the corpus, fan analyzer runs out over the
//! worker pool, normalize each tool's output, score every (fixture, tool)
//! pair, and assemble the final report.

use crate::config::{Config, ToolConfig};
use crate::corpus;
use crate::normalize::{self, OutputFormat};
use crate::runner::FailureKind;
use crate::runner::pool::{self, PairOutcome};
use crate::score::{self, HarnessReport, MatchResult, matcher};
use crate::taxonomy::CategoryMap;
use anyhow::{Result, bail};
use chrono::Utc;
use std::path::Path;
use tokio::sync::watch;
use tracing::{info, warn};

/// A tool with its resolved output format, or the reason it cannot run.
enum ToolPlan {
    Runnable(ToolConfig, OutputFormat),
    Unsupported(ToolConfig),
}

/// Run the whole harness over a corpus.
///
/// 1. Load fixtures and their ground-truth expectations
/// 2. Execute every (fixture, tool) pair in the bounded pool
/// 3. Normalize raw output per tool format
/// 4. Match and score each pair, then aggregate per tool
pub async fn run(
    corpus_root: &Path,
    config: &Config,
    cancel: &watch::Receiver<bool>,
) -> Result<HarnessReport> {
    info!(corpus = %corpus_root.display(), "harness starting");

    let categories = CategoryMap::new(config.category_rules.clone());

    // Phase 1: ground truth.
    let corpus = corpus::load(corpus_root, &config.corpus, &categories)?;

    // Resolve adapters up front; an unknown format disables that tool only.
    let mut plans: Vec<ToolPlan> = Vec::new();
    for tool in &config.tools {
        match OutputFormat::from_tag(&tool.format) {
            Ok(format) => plans.push(ToolPlan::Runnable(tool.clone(), format)),
            Err(e) => {
                warn!(tool = %tool.name, error = %e, "tool disabled: no adapter for its format");
                plans.push(ToolPlan::Unsupported(tool.clone()));
            }
        }
    }
    let runnable: Vec<ToolConfig> = plans
        .iter()
        .filter_map(|p| match p {
            ToolPlan::Runnable(t, _) => Some(t.clone()),
            ToolPlan::Unsupported(_) => None,
        })
        .collect();
    if runnable.is_empty() {
        bail!("no runnable tools: every configured tool has an unsupported format");
    }

    // Phase 2: execute.
    let paths: Vec<_> = corpus.files.iter().map(|f| f.path.clone()).collect();
    let outcomes = pool::run_all(&paths, &runnable, &config.runner, cancel).await;

    // Phase 3 + 4: normalize and score, in deterministic (file, tool) order.
    let mut plans_sorted: Vec<&ToolPlan> = plans.iter().collect();
    plans_sorted.sort_by(|a, b| plan_name(a).cmp(plan_name(b)));

    let mut results: Vec<MatchResult> = Vec::new();
    for file in &corpus.files {
        for plan in &plans_sorted {
            let result = match plan {
                ToolPlan::Unsupported(tool) => MatchResult::failed(
                    file.path.clone(),
                    tool.name.clone(),
                    &file.expected,
                    FailureKind::UnsupportedFormat {
                        format: tool.format.clone(),
                    },
                ),
                ToolPlan::Runnable(tool, format) => {
                    let key = (file.path.clone(), tool.name.clone());
                    match outcomes.get(&key) {
                        Some(PairOutcome::Completed(raw)) => {
                            let payload = if tool.parse_stderr {
                                &raw.stderr
                            } else {
                                &raw.stdout
                            };
                            let normalized =
                                normalize::normalize(&tool.name, *format, payload, &categories);
                            matcher::match_file(
                                &file.path,
                                &tool.name,
                                &file.expected,
                                &normalized.diagnostics,
                                config.matcher.line_tolerance,
                                normalized.skipped_lines,
                            )
                        }
                        Some(PairOutcome::Failed(kind)) => MatchResult::failed(
                            file.path.clone(),
                            tool.name.clone(),
                            &file.expected,
                            kind.clone(),
                        ),
                        // Cancelled before the pair was ever dispatched.
                        None => MatchResult::failed(
                            file.path.clone(),
                            tool.name.clone(),
                            &file.expected,
                            FailureKind::Cancelled,
                        ),
                    }
                }
            };
            results.push(result);
        }
    }

    let tools = score::summarize(&results);
    let interrupted = *cancel.borrow();
    if interrupted {
        warn!("run was interrupted; report covers partial results");
    }

    info!(
        fixtures = corpus.files.len(),
        expectations = corpus.total_expectations(),
        pairs = results.len(),
        tools = tools.len(),
        "harness complete"
    );

    Ok(HarnessReport {
        generated_at: Utc::now().to_rfc3339(),
        corpus_root: corpus.root.clone(),
        interrupted,
        total_fixtures: corpus.files.len(),
        total_expectations: corpus.total_expectations(),
        corpus_warnings: corpus.warnings,
        tools,
        results,
    })
}

fn plan_name(plan: &ToolPlan) -> &str {
    match plan {
        ToolPlan::Runnable(t, _) | ToolPlan::Unsupported(t) => &t.name,
    }
}
