//! Example Retriever
//!
//! Ranks stored examples by lexical word overlap with a query.

use super::Example;
use serde::Serialize;
use std::collections::HashSet;

/// Examples must score strictly above this to be returned.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredExample {
    pub score: f64,
    pub example: Example,
}

#[derive(Debug, Clone, Copy)]
pub struct ExampleRetriever {
    threshold: f64,
}

impl Default for ExampleRetriever {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl ExampleRetriever {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `|A ∩ B| / max(|A|, |B|)` over lowercased whitespace-split word sets.
    pub fn similarity(a: &str, b: &str) -> f64 {
        overlap_score(&word_set(a), &word_set(b))
    }

    /// Scored examples above the threshold, best first. Ties keep store order.
    pub fn rank(&self, query: &str, examples: &[Example], limit: usize) -> Vec<ScoredExample> {
        let query_words = word_set(query);

        let mut scored: Vec<ScoredExample> = examples
            .iter()
            .filter_map(|example| {
                let score = overlap_score(&query_words, &word_set(&example.natural_language));
                (score > self.threshold).then(|| ScoredExample {
                    score,
                    example: example.clone(),
                })
            })
            .collect();

        // Vec::sort_by is stable.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        scored
    }

    pub fn similar(&self, query: &str, examples: &[Example], limit: usize) -> Vec<Example> {
        self.rank(query, examples, limit)
            .into_iter()
            .map(|s| s.example)
            .collect()
    }
}

fn overlap_score(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let denominator = a.len().max(b.len());
    if denominator == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / denominator as f64
}

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::few_shot::default_examples;

    #[test]
    fn test_similarity_uses_word_sets() {
        assert_eq!(ExampleRetriever::similarity("show me all users", "Show me all users"), 1.0);
        // duplicate words collapse: {a} vs {a, b}
        assert_eq!(ExampleRetriever::similarity("a a a", "a b"), 0.5);
        assert_eq!(ExampleRetriever::similarity("", ""), 0.0);
    }

    #[test]
    fn test_similar_returns_best_match_first() {
        let retriever = ExampleRetriever::default();
        let results = retriever.similar("show me all users please", &default_examples(), 3);
        assert!(!results.is_empty());
        assert!(results.len() <= 3);
        assert_eq!(results[0].sql, "SELECT * FROM users");
    }

    #[test]
    fn test_ties_preserve_store_order() {
        let examples = vec![
            Example::new("alpha orders", "SELECT * FROM a"),
            Example::new("beta orders", "SELECT * FROM b"),
            Example::new("gamma orders", "SELECT * FROM c"),
        ];
        let ranked = ExampleRetriever::default().rank("orders", &examples, 10);
        let sqls: Vec<&str> = ranked.iter().map(|s| s.example.sql.as_str()).collect();
        assert_eq!(sqls, vec!["SELECT * FROM a", "SELECT * FROM b", "SELECT * FROM c"]);
        assert!(ranked.iter().all(|s| (s.score - 0.5).abs() < f64::EPSILON));
    }

    #[test]
    fn test_threshold_is_strict() {
        // 1 shared word out of 10 -> exactly 0.1, which is excluded
        let examples = vec![Example::new(
            "users a b c d e f g h i",
            "SELECT * FROM users",
        )];
        assert!(ExampleRetriever::default().similar("users", &examples, 5).is_empty());
    }

    #[test]
    fn test_limit_zero_returns_nothing() {
        let results = ExampleRetriever::default().similar("show me all users", &default_examples(), 0);
        assert!(results.is_empty());
    }
}
