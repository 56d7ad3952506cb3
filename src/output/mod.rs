//! HTML scoreboard rendering. The JSON report is the canonical interface;
//! this is the human-facing view of the same structure.

use crate::error::{Error, Result};
use crate::score::{HarnessReport, ToolScore};
use askama::Template;

#[derive(Template)]
#[template(path = "score_report.html")]
struct ScoreReport {
    generated_at: String,
    corpus_root: String,
    interrupted: bool,
    total_fixtures: usize,
    total_expectations: usize,
    warning_count: usize,
    tools: Vec<ToolView>,
}

struct ToolView {
    name: String,
    files_analyzed: usize,
    files_failed: usize,
    true_positives: usize,
    false_positives: usize,
    false_negatives: usize,
    precision_pct: String,
    recall_pct: String,
    f1_pct: String,
    f1_class: String,
    skipped_output_lines: usize,
    categories: Vec<CategoryView>,
    failures: Vec<String>,
}

struct CategoryView {
    tag: String,
    true_positives: usize,
    false_positives: usize,
    false_negatives: usize,
    precision_pct: String,
    recall_pct: String,
    f1_pct: String,
}

fn pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

fn f1_class(f1: f64) -> String {
    if f1 >= 0.8 {
        "good".into()
    } else if f1 >= 0.5 {
        "fair".into()
    } else {
        "poor".into()
    }
}

fn tool_view(name: &str, score: &ToolScore) -> ToolView {
    ToolView {
        name: name.to_string(),
        files_analyzed: score.files_analyzed,
        files_failed: score.files_failed,
        true_positives: score.counts.true_positives,
        false_positives: score.counts.false_positives,
        false_negatives: score.counts.false_negatives,
        precision_pct: pct(score.metrics.precision),
        recall_pct: pct(score.metrics.recall),
        f1_pct: pct(score.metrics.f1),
        f1_class: f1_class(score.metrics.f1),
        skipped_output_lines: score.skipped_output_lines,
        categories: score
            .per_category
            .iter()
            .map(|(tag, cat)| CategoryView {
                tag: tag.clone(),
                true_positives: cat.counts.true_positives,
                false_positives: cat.counts.false_positives,
                false_negatives: cat.counts.false_negatives,
                precision_pct: pct(cat.metrics.precision),
                recall_pct: pct(cat.metrics.recall),
                f1_pct: pct(cat.metrics.f1),
            })
            .collect(),
        failures: score
            .failures
            .iter()
            .map(|(kind, count)| format!("{kind} × {count}"))
            .collect(),
    }
}

/// Render the scoreboard for a finished run.
pub fn render_score_report(report: &HarnessReport) -> Result<String> {
    let view = ScoreReport {
        generated_at: report.generated_at.clone(),
        corpus_root: report.corpus_root.display().to_string(),
        interrupted: report.interrupted,
        total_fixtures: report.total_fixtures,
        total_expectations: report.total_expectations,
        warning_count: report.corpus_warnings.len(),
        tools: report
            .tools
            .iter()
            .map(|(name, score)| tool_view(name, score))
            .collect(),
    };
    view.render().map_err(|e| Error::Template(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_formats_one_decimal() {
        assert_eq!(pct(0.0), "0.0%");
        assert_eq!(pct(1.0), "100.0%");
        assert_eq!(pct(2.0 / 3.0), "66.7%");
    }

    #[test]
    fn f1_classes() {
        assert_eq!(f1_class(0.9), "good");
        assert_eq!(f1_class(0.6), "fair");
        assert_eq!(f1_class(0.1), "poor");
    }
}
