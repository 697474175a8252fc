//! Few-Shot Learning
//!
//! Natural-language/SQL example pairs and the intent pattern taxonomy used to
//! steer SQL generation, together with their JSON persistence format:
//!
//! ```json
//! {"examples": [{"natural_language": "...", "sql": "...", "category": "...", "difficulty": "..."}],
//!  "patterns": {"count": {"keywords": ["count"], "sql_template": "...", "description": "..."}}}
//! ```

pub mod classifier;
pub mod defaults;
pub mod retriever;
pub mod store;

pub use classifier::{PatternClassifier, PatternMatch};
pub use defaults::{default_examples, default_patterns};
pub use retriever::{ExampleRetriever, ScoredExample};
pub use store::{ExampleStats, ExampleStore};

use serde::{Deserialize, Serialize};

fn default_category() -> String {
    "custom".to_string()
}

fn default_difficulty() -> String {
    "medium".to_string()
}

/// A stored natural-language/SQL pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub natural_language: String,
    pub sql: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

impl Example {
    pub fn new(natural_language: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            natural_language: natural_language.into(),
            sql: sql.into(),
            category: default_category(),
            difficulty: default_difficulty(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = difficulty.into();
        self
    }

    pub fn is_well_formed(&self) -> bool {
        validate_example(&self.natural_language, &self.sql)
    }
}

/// Named intent pattern: trigger phrases plus the SQL shape they usually map to.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub name: String,
    /// Checked in declared order; the first hit wins.
    pub keywords: Vec<String>,
    pub sql_template: String,
    pub description: String,
}

impl Pattern {
    pub fn new(name: &str, keywords: &[&str], sql_template: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            sql_template: sql_template.to_string(),
            description: description.to_string(),
        }
    }
}

/// On-disk body of a pattern (the name is the map key).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PatternSpec {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    sql_template: String,
    #[serde(default)]
    description: String,
}

/// Everything the example store holds; also the persistence document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExampleSet {
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default, with = "pattern_map")]
    pub patterns: Vec<Pattern>,
}

impl ExampleSet {
    pub fn with_defaults() -> Self {
        Self {
            examples: default_examples(),
            patterns: default_patterns(),
        }
    }
}

/// Serializes the ordered pattern list as a JSON object, reading it back in
/// document order so the taxonomy keeps its declared order.
mod pattern_map {
    use super::{Pattern, PatternSpec};
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(patterns: &[Pattern], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(patterns.len()))?;
        for pattern in patterns {
            let spec = PatternSpec {
                keywords: pattern.keywords.clone(),
                sql_template: pattern.sql_template.clone(),
                description: pattern.description.clone(),
            };
            map.serialize_entry(&pattern.name, &spec)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Pattern>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PatternMapVisitor;

        impl<'de> Visitor<'de> for PatternMapVisitor {
            type Value = Vec<Pattern>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of pattern name to pattern definition")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut patterns: Vec<Pattern> = Vec::new();
                while let Some((name, spec)) = access.next_entry::<String, PatternSpec>()? {
                    let pattern = Pattern {
                        name,
                        keywords: spec.keywords,
                        sql_template: spec.sql_template,
                        description: spec.description,
                    };
                    // Repeated keys replace the earlier definition in place.
                    match patterns.iter_mut().find(|p| p.name == pattern.name) {
                        Some(existing) => *existing = pattern,
                        None => patterns.push(pattern),
                    }
                }
                Ok(patterns)
            }
        }

        deserializer.deserialize_map(PatternMapVisitor)
    }
}

/// An example is well-formed when both sides are non-empty and the SQL carries
/// both a SELECT and a FROM keyword.
pub fn validate_example(natural_language: &str, sql: &str) -> bool {
    if natural_language.trim().is_empty() || sql.trim().is_empty() {
        return false;
    }
    let sql_upper = sql.to_uppercase();
    sql_upper.contains("SELECT") && sql_upper.contains("FROM")
}

/// Render examples as a few-shot block for a generation prompt.
pub fn format_examples_for_prompt(examples: &[Example]) -> String {
    if examples.is_empty() {
        return String::new();
    }

    let mut formatted = String::from("Example queries:\n\n");
    for (i, example) in examples.iter().enumerate() {
        formatted.push_str(&format!("Example {}:\n", i + 1));
        formatted.push_str(&format!("Natural Language: {}\n", example.natural_language));
        formatted.push_str(&format!("SQL: {}\n\n", example.sql));
    }
    formatted
}
