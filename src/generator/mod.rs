//! SQL Generation
//!
//! Pluggable producers of candidate SQL. The rule-based generator is always
//! available; the LLM generator is enabled by configuration. Output of either
//! is untrusted until it passes the validator.

pub mod llm;
pub mod prompt;
pub mod rule_based;

pub use llm::{LlmGenerator, ModelParameters};
pub use prompt::{build_prompt, clean_generated_sql};
pub use rule_based::RuleBasedGenerator;

use crate::error::Result;
use crate::few_shot::Example;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    RuleBased,
    Llm,
}

/// Everything a generator may draw on for one question.
#[derive(Debug, Clone, Default)]
pub struct GenerationContext {
    pub query: String,
    pub tables: Vec<String>,
    /// Catalog rendered for a prompt.
    pub schema_text: String,
    /// Few-shot examples retrieved for this question.
    pub examples: Vec<Example>,
}

#[async_trait]
pub trait SqlGenerator: Send + Sync {
    fn kind(&self) -> GeneratorKind;

    async fn generate(&self, ctx: &GenerationContext) -> Result<String>;
}
