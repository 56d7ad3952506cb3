//! Shared defect taxonomy: the keyword table that maps free text (marker
//! labels, tool messages) onto canonical category tags, and the canonical
//! severity scale. The Corpus Loader and the Diagnostic Normalizer both
//! classify through this module so expectations and findings compare equal.

use serde::{Deserialize, Serialize};

/// Fallback tag for text no rule matches. Never empty, never dropped.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl Severity {
    /// Normalize a tool's raw severity string. Unknown strings land on
    /// `Warning`.
    pub fn from_raw(raw: &str) -> Self {
        let s = raw.to_lowercase();
        if s.contains("critical") || s.contains("fatal") {
            Self::Critical
        } else if s.contains("error") || s.contains("high") {
            Self::Error
        } else if s.contains("warn") || s.contains("medium") {
            Self::Warning
        } else if s.contains("style")
            || s.contains("info")
            || s.contains("note")
            || s.contains("low")
            || s.contains("performance")
            || s.contains("portability")
        {
            Self::Info
        } else {
            Self::Warning
        }
    }
}

/// One keyword rule: the rule matches when any clause matches, a clause
/// matches when every token in it appears as a substring of the lowercased
/// input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub tag: String,
    pub clauses: Vec<Vec<String>>,
}

/// Ordered keyword table, first matching rule wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMap {
    pub rules: Vec<CategoryRule>,
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl CategoryMap {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// Map free text to a canonical category tag.
    pub fn classify(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        for rule in &self.rules {
            let hit = rule
                .clauses
                .iter()
                .any(|clause| clause.iter().all(|token| lowered.contains(token.as_str())));
            if hit {
                return rule.tag.clone();
            }
        }
        UNCATEGORIZED.to_string()
    }
}

fn rule(tag: &str, clauses: &[&[&str]]) -> CategoryRule {
    CategoryRule {
        tag: tag.to_string(),
        clauses: clauses
            .iter()
            .map(|c| c.iter().map(|t| t.to_string()).collect())
            .collect(),
    }
}

/// The stock table, assembled from the defect labels observed in the fixture
/// corpora this harness was calibrated against. Config can replace it
/// wholesale via `[[category_rules]]`.
pub fn default_rules() -> Vec<CategoryRule> {
    vec![
        rule("buffer-overflow", &[&["overflow"], &["bounds"]]),
        rule("null-deref", &[&["null", "deref"]]),
        rule("race-condition", &[&["race"], &["thread", "safety"]]),
        rule("resource-leak", &[&["leak"]]),
        rule("const-correctness", &[&["const"]]),
        rule("generic-type-safety", &[&["template"]]),
        rule(
            "inheritance-misuse",
            &[&["override"], &["slicing"], &["inheritance"]],
        ),
        rule(
            "type-confusion",
            &[&["function pointer"], &["type", "confusion"]],
        ),
        rule("uninitialized-read", &[&["uninitialized"]]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_buffer_overflow_by_either_token() {
        let map = CategoryMap::default();
        assert_eq!(map.classify("buffer overflow vulnerability"), "buffer-overflow");
        assert_eq!(map.classify("no bounds checking"), "buffer-overflow");
        assert_eq!(map.classify("accessing beyond array bounds"), "buffer-overflow");
    }

    #[test]
    fn classify_null_deref_needs_both_tokens() {
        let map = CategoryMap::default();
        assert_eq!(map.classify("null pointer dereference"), "null-deref");
        assert_eq!(map.classify("dereferencing null pointer"), "null-deref");
        // "null" alone is not enough
        assert_eq!(map.classify("returns null on failure"), UNCATEGORIZED);
    }

    #[test]
    fn classify_race_condition() {
        let map = CategoryMap::default();
        assert_eq!(map.classify("race condition in counter"), "race-condition");
        assert_eq!(map.classify("no mutex for thread safety"), "race-condition");
    }

    #[test]
    fn classify_is_case_insensitive() {
        let map = CategoryMap::default();
        assert_eq!(map.classify("Memory LEAK detected"), "resource-leak");
    }

    #[test]
    fn classify_first_rule_wins() {
        // "overflow" and "leak" both present: buffer-overflow is declared first.
        let map = CategoryMap::default();
        assert_eq!(map.classify("overflow causes a leak"), "buffer-overflow");
    }

    #[test]
    fn classify_inheritance_variants() {
        let map = CategoryMap::default();
        assert_eq!(map.classify("no override keyword"), "inheritance-misuse");
        assert_eq!(map.classify("slicing problem"), "inheritance-misuse");
    }

    #[test]
    fn classify_function_pointer_confusion() {
        let map = CategoryMap::default();
        assert_eq!(map.classify("function pointer misuse"), "type-confusion");
        assert_eq!(map.classify("type confusion via cast"), "type-confusion");
    }

    #[test]
    fn classify_unknown_falls_back() {
        let map = CategoryMap::default();
        assert_eq!(map.classify("division by zero"), UNCATEGORIZED);
        assert_eq!(map.classify(""), UNCATEGORIZED);
    }

    #[test]
    fn classify_empty_table_falls_back() {
        let map = CategoryMap::new(Vec::new());
        assert_eq!(map.classify("buffer overflow"), UNCATEGORIZED);
    }

    #[test]
    fn severity_from_raw_cppcheck_levels() {
        assert_eq!(Severity::from_raw("error"), Severity::Error);
        assert_eq!(Severity::from_raw("warning"), Severity::Warning);
        assert_eq!(Severity::from_raw("style"), Severity::Info);
        assert_eq!(Severity::from_raw("performance"), Severity::Info);
        assert_eq!(Severity::from_raw("portability"), Severity::Info);
        assert_eq!(Severity::from_raw("information"), Severity::Info);
    }

    #[test]
    fn severity_from_raw_generic_levels() {
        assert_eq!(Severity::from_raw("CRITICAL"), Severity::Critical);
        assert_eq!(Severity::from_raw("fatal error"), Severity::Critical);
        assert_eq!(Severity::from_raw("High"), Severity::Error);
        assert_eq!(Severity::from_raw("medium"), Severity::Warning);
        assert_eq!(Severity::from_raw("low"), Severity::Info);
    }

    #[test]
    fn severity_unknown_defaults_to_warning() {
        assert_eq!(Severity::from_raw("bizarre"), Severity::Warning);
        assert_eq!(Severity::from_raw(""), Severity::Warning);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::Error);
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
