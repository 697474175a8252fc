pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod few_shot;
pub mod generator;
pub mod helpers;
pub mod pattern_matcher;
pub mod schema;
pub mod service;
pub mod validator;

pub use config::{AppConfig, LlmConfig};
pub use error::{Nl2SqlError, Result};
pub use executor::{ExecutionOutcome, QueryExecutor};
pub use few_shot::{
    Example, ExampleRetriever, ExampleStore, Pattern, PatternClassifier, PatternMatch,
};
pub use generator::{GeneratorKind, LlmGenerator, RuleBasedGenerator, SqlGenerator};
pub use pattern_matcher::{Intent, PatternMatcher};
pub use schema::SchemaCatalog;
pub use service::{GenerateOptions, GenerationOutcome, Nl2SqlService};
pub use validator::{ColumnRef, QueryType, QueryValidator, ValidationResult};
