//! Example Store
//!
//! Shared, append-only collection of few-shot examples and the pattern taxonomy.
//! Readers always take a snapshot under the read lock, so they see a consistent
//! prefix of the collection and never a half-written entry.

use super::{
    format_examples_for_prompt, Example, ExampleRetriever, ExampleSet, Pattern, PatternClassifier,
    PatternMatch,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{error, info};

/// Aggregate counts over the stored examples.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExampleStats {
    pub total_examples: usize,
    pub total_patterns: usize,
    pub categories: BTreeMap<String, usize>,
    pub difficulties: BTreeMap<String, usize>,
}

#[derive(Debug)]
pub struct ExampleStore {
    inner: RwLock<ExampleSet>,
    retriever: ExampleRetriever,
}

impl Default for ExampleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExampleStore {
    /// Store seeded with the built-in examples and pattern taxonomy.
    pub fn new() -> Self {
        Self::from_set(ExampleSet::with_defaults())
    }

    pub fn empty() -> Self {
        Self::from_set(ExampleSet::default())
    }

    pub fn from_set(set: ExampleSet) -> Self {
        Self {
            inner: RwLock::new(set),
            retriever: ExampleRetriever::default(),
        }
    }

    /// Seeded store, replaced by the file's content when it loads.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let store = Self::new();
        store.load(path);
        store
    }

    pub fn with_retriever(mut self, retriever: ExampleRetriever) -> Self {
        self.retriever = retriever;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, ExampleSet> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ExampleSet> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace examples and patterns wholesale from a JSON document.
    /// On failure the current content is kept and `false` is returned.
    pub fn load(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<ExampleSet>(&raw).map_err(|e| e.to_string()));

        match parsed {
            Ok(set) => {
                let count = set.examples.len();
                *self.write() = set;
                info!("Loaded {} examples from {}", count, path.display());
                true
            }
            Err(e) => {
                error!("Failed to load examples from {}: {}", path.display(), e);
                false
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let snapshot = self.snapshot();

        let written = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| e.to_string())
            .and_then(|raw| std::fs::write(path, raw).map_err(|e| e.to_string()));

        match written {
            Ok(()) => {
                info!("Saved {} examples to {}", snapshot.examples.len(), path.display());
                true
            }
            Err(e) => {
                error!("Failed to save examples to {}: {}", path.display(), e);
                false
            }
        }
    }

    pub fn add_example(&self, example: Example) {
        info!("Added new example: {}", example.natural_language);
        self.write().examples.push(example);
    }

    pub fn snapshot(&self) -> ExampleSet {
        self.read().clone()
    }

    pub fn examples(&self) -> Vec<Example> {
        self.read().examples.clone()
    }

    pub fn patterns(&self) -> Vec<Pattern> {
        self.read().patterns.clone()
    }

    pub fn len(&self) -> usize {
        self.read().examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn examples_by_category(&self, category: &str) -> Vec<Example> {
        self.read()
            .examples
            .iter()
            .filter(|e| e.category == category)
            .cloned()
            .collect()
    }

    pub fn examples_by_difficulty(&self, difficulty: &str) -> Vec<Example> {
        self.read()
            .examples
            .iter()
            .filter(|e| e.difficulty == difficulty)
            .cloned()
            .collect()
    }

    /// Up to `limit` stored examples most similar to `query`.
    pub fn similar(&self, query: &str, limit: usize) -> Vec<Example> {
        self.retriever.similar(query, &self.read().examples, limit)
    }

    pub fn patterns_for_query(&self, query: &str) -> Vec<PatternMatch> {
        PatternClassifier::classify(query, &self.read().patterns)
    }

    pub fn format_for_prompt(&self, examples: &[Example]) -> String {
        format_examples_for_prompt(examples)
    }

    /// Parallel lists of questions and SQL, in store order.
    pub fn training_data(&self) -> (Vec<String>, Vec<String>) {
        self.read()
            .examples
            .iter()
            .map(|e| (e.natural_language.clone(), e.sql.clone()))
            .unzip()
    }

    pub fn statistics(&self) -> ExampleStats {
        let set = self.read();
        let mut stats = ExampleStats {
            total_examples: set.examples.len(),
            total_patterns: set.patterns.len(),
            ..ExampleStats::default()
        };
        for example in &set.examples {
            *stats.categories.entry(example.category.clone()).or_insert(0) += 1;
            *stats.difficulties.entry(example.difficulty.clone()).or_insert(0) += 1;
        }
        stats
    }
}
