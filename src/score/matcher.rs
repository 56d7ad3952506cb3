//! Bipartite alignment of expectations against diagnostics for one
//! (fixture, tool) pair.
//!
//! Candidate pairs require equal category tags and a line distance within
//! tolerance; a file-level diagnostic is a candidate for any expectation of
//! its category. Ambiguity resolves by stable greedy assignment: candidates
//! sorted by (line distance, expectation order, diagnostic order), assigned
//! first-come. File-level candidates sort after every line-bearing one.

use super::{MatchResult, MatchedPair};
use crate::corpus::ExpectedIssue;
use crate::normalize::Diagnostic;
use std::collections::BTreeSet;
use std::path::Path;

/// Align one fixture's expectations with one tool's diagnostics.
pub fn match_file(
    file: &Path,
    tool: &str,
    expected: &[ExpectedIssue],
    diagnostics: &[Diagnostic],
    tolerance: u32,
    skipped_output_lines: usize,
) -> MatchResult {
    let diagnostics = dedup_per_tool(diagnostics);

    // (sort distance, expectation index, diagnostic index); file-level
    // candidates get a distance past any admissible line distance.
    let mut candidates: Vec<(u32, usize, usize)> = Vec::new();
    for (ei, exp) in expected.iter().enumerate() {
        for (di, diag) in diagnostics.iter().enumerate() {
            if exp.category != diag.category {
                continue;
            }
            match diag.line {
                Some(line) => {
                    let distance = exp.line.abs_diff(line) as u32;
                    if distance <= tolerance {
                        candidates.push((distance, ei, di));
                    }
                }
                None => candidates.push((tolerance + 1, ei, di)),
            }
        }
    }
    candidates.sort_unstable();

    let mut matched_expected: BTreeSet<usize> = BTreeSet::new();
    let mut matched_diags: BTreeSet<usize> = BTreeSet::new();
    let mut assignments: Vec<(usize, usize, u32)> = Vec::new();

    for (distance, ei, di) in candidates {
        if matched_expected.contains(&ei) || matched_diags.contains(&di) {
            continue;
        }
        matched_expected.insert(ei);
        matched_diags.insert(di);
        assignments.push((ei, di, distance));
    }

    // Present true positives in expectation order.
    assignments.sort_unstable_by_key(|&(ei, _, _)| ei);

    let tolerance_sentinel = tolerance + 1;
    let true_positives = assignments
        .iter()
        .map(|&(ei, di, distance)| MatchedPair {
            expected: expected[ei].clone(),
            diagnostic: diagnostics[di].clone(),
            line_distance: (distance < tolerance_sentinel).then_some(distance),
        })
        .collect();

    let false_negatives = expected
        .iter()
        .enumerate()
        .filter(|(ei, _)| !matched_expected.contains(ei))
        .map(|(_, e)| e.clone())
        .collect();

    let false_positives = diagnostics
        .iter()
        .enumerate()
        .filter(|(di, _)| !matched_diags.contains(di))
        .map(|(_, d)| d.clone())
        .collect();

    MatchResult {
        file: file.to_path_buf(),
        tool: tool.to_string(),
        true_positives,
        false_negatives,
        false_positives,
        failure: None,
        skipped_output_lines,
    }
}

/// Collapse diagnostics a single tool reported redundantly (identical
/// category, line and message), keeping the first occurrence. Cross-tool
/// results are never merged; each tool is scored on its own output.
fn dedup_per_tool(diagnostics: &[Diagnostic]) -> Vec<Diagnostic> {
    let mut seen: BTreeSet<(String, Option<usize>, String)> = BTreeSet::new();
    diagnostics
        .iter()
        .filter(|d| seen.insert((d.category.clone(), d.line, d.message.clone())))
        .cloned()
        .collect()
}
