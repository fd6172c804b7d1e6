//! Pattern-set classification of artifact content.
//!
//! Error patterns take precedence over success patterns: a log line like
//! "completed successfully despite 2 retries, no error" must not be reported
//! clean when it also carries a recognized failure token. Content matching
//! neither set stays a distinct [`Classification::Unresolved`] rather than
//! being coerced to `Error` — the downstream remediation differs (widen the
//! pattern coverage vs. investigate the job).

use serde::{Deserialize, Serialize};

/// Outcome of classifying one artifact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// A success pattern matched and no error pattern did.
    Success,
    /// An error pattern matched.
    Error,
    /// No artifact was found, or no pattern matched the content.
    Unresolved,
}

impl Classification {
    /// The tracker cell value for this classification.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Success => "success",
            Classification::Error => "error",
            Classification::Unresolved => "unresolved",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured substring sets used to classify artifact content.
///
/// Needles are lowercased once at construction; matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    success: Vec<String>,
    error: Vec<String>,
}

impl PatternSet {
    /// Build a pattern set from two lists of substrings.
    pub fn new<S: AsRef<str>>(success: &[S], error: &[S]) -> Self {
        Self {
            success: normalize(success.iter().map(AsRef::as_ref)),
            error: normalize(error.iter().map(AsRef::as_ref)),
        }
    }

    /// Parse comma-separated pattern lists, e.g. `"*** Failure,*** Error:"`.
    /// Empty entries are dropped.
    pub fn from_comma_lists(success: &str, error: &str) -> Self {
        Self {
            success: normalize(success.split(',')),
            error: normalize(error.split(',')),
        }
    }

    /// Whether both pattern lists are empty.
    pub fn is_empty(&self) -> bool {
        self.success.is_empty() && self.error.is_empty()
    }

    pub fn success_patterns(&self) -> &[String] {
        &self.success
    }

    pub fn error_patterns(&self) -> &[String] {
        &self.error
    }
}

fn normalize<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Classify one artifact's raw content against the configured pattern sets.
///
/// Pure: identical (content, patterns) pairs always yield the same result.
pub fn classify(content: &str, patterns: &PatternSet) -> Classification {
    let haystack = content.to_lowercase();

    // Error-first precedence; first match short-circuits.
    if patterns.error.iter().any(|p| haystack.contains(p.as_str())) {
        return Classification::Error;
    }
    if patterns
        .success
        .iter()
        .any(|p| haystack.contains(p.as_str()))
    {
        return Classification::Success;
    }
    Classification::Unresolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn patterns() -> PatternSet {
        PatternSet::from_comma_lists("Execution Return Code: 0", "*** Failure,*** Error:")
    }

    #[test]
    fn success_keyword_matches() {
        let content = "Some log line\nExecution Return Code: 0\n";
        assert_eq!(classify(content, &patterns()), Classification::Success);
    }

    #[test]
    fn error_keyword_matches() {
        let content = "Something happened\n  *** Error: Something bad\n";
        assert_eq!(classify(content, &patterns()), Classification::Error);
    }

    #[test]
    fn error_takes_precedence_over_success() {
        // Scenario: both a success token and an error token present.
        let patterns = PatternSet::from_comma_lists("OK", "failed,exception");
        let content = "Step 1 OK\nStep 2 failed: exception";
        assert_eq!(classify(content, &patterns), Classification::Error);
    }

    #[test]
    fn no_match_is_unresolved() {
        let content = "nothing recognizable here";
        assert_eq!(classify(content, &patterns()), Classification::Unresolved);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let patterns = PatternSet::from_comma_lists("JOB SUCCESS", "JOB ERROR");
        assert_eq!(
            classify("...\njob success\n", &patterns),
            Classification::Success
        );
        assert_eq!(
            classify("...\nJob Error\n", &patterns),
            Classification::Error
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let content = "Step 1 OK\nExecution Return Code: 0";
        let first = classify(content, &patterns());
        for _ in 0..10 {
            assert_eq!(classify(content, &patterns()), first);
        }
    }

    #[test]
    fn comma_list_parsing_drops_empty_entries() {
        let set = PatternSet::from_comma_lists(" OK , ,", "failed,");
        assert_eq!(set.success_patterns(), &["ok".to_string()]);
        assert_eq!(set.error_patterns(), &["failed".to_string()]);
    }

    #[test]
    fn empty_pattern_set_always_unresolved() {
        let set = PatternSet::from_comma_lists("", "");
        assert!(set.is_empty());
        assert_eq!(
            classify("Execution Return Code: 0", &set),
            Classification::Unresolved
        );
    }
}
