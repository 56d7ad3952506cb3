//! Confusion accounting and aggregate metrics.
//!
//! Pure computation over in-memory structures: no I/O, no clocks, no
//! ordering dependence. Re-running over identical inputs yields identical
//! results.

pub mod matcher;

use crate::corpus::{CorpusWarning, ExpectedIssue};
use crate::normalize::Diagnostic;
use crate::runner::FailureKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One matched expectation/diagnostic pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedPair {
    pub expected: ExpectedIssue,
    pub diagnostic: Diagnostic,
    /// Absent when the diagnostic was file-level.
    pub line_distance: Option<u32>,
}

/// Outcome for one (fixture, tool) pair.
///
/// Partition invariant: every expectation of the fixture appears in exactly
/// one of {`true_positives`, `false_negatives`}; every (deduplicated)
/// diagnostic in exactly one of {`true_positives`, `false_positives`}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub file: PathBuf,
    pub tool: String,
    pub true_positives: Vec<MatchedPair>,
    pub false_negatives: Vec<ExpectedIssue>,
    pub false_positives: Vec<Diagnostic>,
    /// Set when the tool never produced findings for this file. Keeps
    /// "found nothing" distinguishable from "failed".
    pub failure: Option<FailureKind>,
    /// Raw output lines the normalizer could not parse.
    pub skipped_output_lines: usize,
}

impl MatchResult {
    /// Result for a pair whose tool run failed: zero findings, every
    /// expectation missed, annotated with the failure.
    pub fn failed(
        file: PathBuf,
        tool: String,
        expected: &[ExpectedIssue],
        failure: FailureKind,
    ) -> Self {
        Self {
            file,
            tool,
            true_positives: Vec::new(),
            false_negatives: expected.to_vec(),
            false_positives: Vec::new(),
            failure: Some(failure),
            skipped_output_lines: 0,
        }
    }

    pub fn counts(&self) -> Confusion {
        Confusion {
            true_positives: self.true_positives.len(),
            false_positives: self.false_positives.len(),
            false_negatives: self.false_negatives.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusion {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl Confusion {
    pub fn add(&mut self, other: Confusion) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
    }

    /// TP / (TP + FP); 0.0 on an empty denominator.
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN); 0.0 on an empty denominator.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall; 0.0 when both are 0.
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1(),
        }
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub counts: Confusion,
    pub metrics: Metrics,
}

/// Aggregate accuracy for one tool across the whole corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolScore {
    pub counts: Confusion,
    pub metrics: Metrics,
    pub per_category: BTreeMap<String, CategoryScore>,
    /// Diagnostics reported, keyed by canonical severity.
    pub severity_breakdown: BTreeMap<String, usize>,
    /// Failed pairs, keyed by failure description.
    pub failures: BTreeMap<String, usize>,
    pub files_analyzed: usize,
    pub files_failed: usize,
    pub skipped_output_lines: usize,
}

/// The complete, deterministic, serializable run summary handed to the
/// presentation layer.
#[derive(Debug, Serialize, Deserialize)]
pub struct HarnessReport {
    pub generated_at: String,
    pub corpus_root: PathBuf,
    /// True when the run was cancelled; collected results are still scored.
    pub interrupted: bool,
    pub total_fixtures: usize,
    pub total_expectations: usize,
    pub corpus_warnings: Vec<CorpusWarning>,
    pub tools: BTreeMap<String, ToolScore>,
    /// Sorted by (file path, tool name).
    pub results: Vec<MatchResult>,
}

/// Sum per-pair results into per-tool scores. Confusion counts are summed
/// before any ratio is computed.
pub fn summarize(results: &[MatchResult]) -> BTreeMap<String, ToolScore> {
    let mut tools: BTreeMap<String, ToolScore> = BTreeMap::new();

    for result in results {
        let entry = tools.entry(result.tool.clone()).or_insert_with(|| ToolScore {
            counts: Confusion::default(),
            metrics: Confusion::default().metrics(),
            per_category: BTreeMap::new(),
            severity_breakdown: BTreeMap::new(),
            failures: BTreeMap::new(),
            files_analyzed: 0,
            files_failed: 0,
            skipped_output_lines: 0,
        });

        entry.counts.add(result.counts());
        entry.files_analyzed += 1;
        entry.skipped_output_lines += result.skipped_output_lines;

        if let Some(failure) = &result.failure {
            entry.files_failed += 1;
            *entry.failures.entry(failure.to_string()).or_default() += 1;
        }

        for pair in &result.true_positives {
            per_category(entry, &pair.expected.category).true_positives += 1;
            *entry
                .severity_breakdown
                .entry(pair.diagnostic.severity.to_string())
                .or_default() += 1;
        }
        for missed in &result.false_negatives {
            per_category(entry, &missed.category).false_negatives += 1;
        }
        for extra in &result.false_positives {
            per_category(entry, &extra.category).false_positives += 1;
            *entry
                .severity_breakdown
                .entry(extra.severity.to_string())
                .or_default() += 1;
        }
    }

    for score in tools.values_mut() {
        score.metrics = score.counts.metrics();
        for cat in score.per_category.values_mut() {
            cat.metrics = cat.counts.metrics();
        }
    }

    tools
}

fn per_category<'a>(score: &'a mut ToolScore, category: &str) -> &'a mut Confusion {
    &mut score
        .per_category
        .entry(category.to_string())
        .or_insert_with(|| CategoryScore {
            counts: Confusion::default(),
            metrics: Metrics {
                precision: 0.0,
                recall: 0.0,
                f1: 0.0,
            },
        })
        .counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Severity;

    fn expected(line: usize, category: &str) -> ExpectedIssue {
        ExpectedIssue {
            line,
            label: format!("{category} at {line}"),
            category: category.to_string(),
        }
    }

    fn diagnostic(line: Option<usize>, category: &str) -> Diagnostic {
        Diagnostic {
            file: PathBuf::from("a.c"),
            line,
            severity: Severity::Warning,
            category: category.to_string(),
            tool: "t".to_string(),
            message: format!("{category} report"),
        }
    }

    #[test]
    fn metrics_zero_denominators_are_zero_not_nan() {
        let empty = Confusion::default();
        assert_eq!(empty.precision(), 0.0);
        assert_eq!(empty.recall(), 0.0);
        assert_eq!(empty.f1(), 0.0);

        let only_fn = Confusion {
            true_positives: 0,
            false_positives: 0,
            false_negatives: 3,
        };
        assert_eq!(only_fn.precision(), 0.0);
        assert_eq!(only_fn.recall(), 0.0);
        assert_eq!(only_fn.f1(), 0.0);
    }

    #[test]
    fn metrics_stay_in_unit_interval() {
        let c = Confusion {
            true_positives: 7,
            false_positives: 3,
            false_negatives: 2,
        };
        let m = c.metrics();
        for v in [m.precision, m.recall, m.f1] {
            assert!((0.0..=1.0).contains(&v), "metric out of range: {v}");
            assert!(v.is_finite());
        }
        assert!((m.precision - 0.7).abs() < 1e-9);
        assert!((m.recall - 7.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn perfect_tool_scores_one() {
        let c = Confusion {
            true_positives: 5,
            false_positives: 0,
            false_negatives: 0,
        };
        assert_eq!(c.precision(), 1.0);
        assert_eq!(c.recall(), 1.0);
        assert_eq!(c.f1(), 1.0);
    }

    #[test]
    fn failed_pair_counts_every_expectation_as_missed() {
        // A timed-out tool is not a tool that found nothing.
        let exp = vec![expected(5, "buffer-overflow"), expected(9, "resource-leak")];
        let r = MatchResult::failed(
            PathBuf::from("a.c"),
            "cppcheck".into(),
            &exp,
            FailureKind::Timeout { secs: 30 },
        );
        let c = r.counts();
        assert_eq!(c.true_positives, 0);
        assert_eq!(c.false_positives, 0);
        assert_eq!(c.false_negatives, 2);
        assert_eq!(r.failure, Some(FailureKind::Timeout { secs: 30 }));
    }

    #[test]
    fn summarize_sums_counts_before_ratios() {
        // File 1: 1 TP, 1 FP.  File 2: 1 TP, 1 FN.
        // Summed: P = 2/3, R = 2/3, not the mean of per-file ratios.
        let r1 = MatchResult {
            file: PathBuf::from("a.c"),
            tool: "t".into(),
            true_positives: vec![MatchedPair {
                expected: expected(1, "resource-leak"),
                diagnostic: diagnostic(Some(1), "resource-leak"),
                line_distance: Some(0),
            }],
            false_negatives: vec![],
            false_positives: vec![diagnostic(Some(9), "null-deref")],
            failure: None,
            skipped_output_lines: 0,
        };
        let r2 = MatchResult {
            file: PathBuf::from("b.c"),
            tool: "t".into(),
            true_positives: vec![MatchedPair {
                expected: expected(3, "resource-leak"),
                diagnostic: diagnostic(Some(4), "resource-leak"),
                line_distance: Some(1),
            }],
            false_negatives: vec![expected(7, "buffer-overflow")],
            false_positives: vec![],
            failure: None,
            skipped_output_lines: 2,
        };

        let tools = summarize(&[r1, r2]);
        let score = &tools["t"];
        assert_eq!(score.counts.true_positives, 2);
        assert_eq!(score.counts.false_positives, 1);
        assert_eq!(score.counts.false_negatives, 1);
        assert!((score.metrics.precision - 2.0 / 3.0).abs() < 1e-9);
        assert!((score.metrics.recall - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(score.files_analyzed, 2);
        assert_eq!(score.files_failed, 0);
        assert_eq!(score.skipped_output_lines, 2);

        let leak = &score.per_category["resource-leak"];
        assert_eq!(leak.counts.true_positives, 2);
        assert_eq!(leak.metrics.recall, 1.0);
        let overflow = &score.per_category["buffer-overflow"];
        assert_eq!(overflow.counts.false_negatives, 1);
        assert_eq!(overflow.metrics.recall, 0.0);
    }

    #[test]
    fn summarize_records_failures_separately() {
        let exp = vec![expected(5, "race-condition")];
        let failed = MatchResult::failed(
            PathBuf::from("t.cpp"),
            "slow-tool".into(),
            &exp,
            FailureKind::Timeout { secs: 10 },
        );
        let clean = MatchResult {
            file: PathBuf::from("u.cpp"),
            tool: "slow-tool".into(),
            true_positives: vec![],
            false_negatives: vec![],
            false_positives: vec![],
            failure: None,
            skipped_output_lines: 0,
        };

        let tools = summarize(&[failed, clean]);
        let score = &tools["slow-tool"];
        assert_eq!(score.files_analyzed, 2);
        assert_eq!(score.files_failed, 1);
        assert_eq!(score.failures["timeout after 10s"], 1);
        // The clean zero-finding file contributes nothing to the confusion.
        assert_eq!(score.counts.false_negatives, 1);
    }

    #[test]
    fn summarize_keeps_tools_separate() {
        let a = MatchResult {
            file: PathBuf::from("a.c"),
            tool: "alpha".into(),
            true_positives: vec![],
            false_negatives: vec![],
            false_positives: vec![diagnostic(Some(1), "resource-leak")],
            failure: None,
            skipped_output_lines: 0,
        };
        let b = MatchResult {
            file: PathBuf::from("a.c"),
            tool: "beta".into(),
            true_positives: vec![],
            false_negatives: vec![],
            false_positives: vec![],
            failure: None,
            skipped_output_lines: 0,
        };
        let tools = summarize(&[a, b]);
        assert_eq!(tools.len(), 2);
        assert_eq!(tools["alpha"].counts.false_positives, 1);
        assert_eq!(tools["beta"].counts.false_positives, 0);
    }
}
