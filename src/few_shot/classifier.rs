//! Pattern Classifier
//!
//! Tags a query with the intent patterns whose trigger phrases it contains.

use super::Pattern;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern_name: String,
    pub matched_keyword: String,
}

pub struct PatternClassifier;

impl PatternClassifier {
    /// One match per pattern at most (its first keyword found in the lowercased
    /// query), returned in pattern declaration order.
    pub fn classify(query: &str, patterns: &[Pattern]) -> Vec<PatternMatch> {
        let query_lower = query.to_lowercase();

        patterns
            .iter()
            .filter_map(|pattern| {
                pattern
                    .keywords
                    .iter()
                    .find(|keyword| query_lower.contains(keyword.as_str()))
                    .map(|keyword| PatternMatch {
                        pattern_name: pattern.name.clone(),
                        matched_keyword: keyword.clone(),
                    })
            })
            .collect()
    }
}
