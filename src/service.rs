//! NL2SQL Service
//!
//! Orchestrates one request end to end: retrieve examples, classify intent,
//! generate a candidate, validate it against the current catalog snapshot and,
//! on request, execute it. Shared by the HTTP API and the CLI.

use crate::config::AppConfig;
use crate::error::{Nl2SqlError, Result};
use crate::executor::{ExecutionOutcome, QueryExecutor};
use crate::few_shot::{validate_example, Example, ExampleStats, ExampleStore, PatternMatch};
use crate::generator::{
    GenerationContext, GeneratorKind, LlmGenerator, ModelParameters, RuleBasedGenerator,
    SqlGenerator,
};
use crate::helpers::format_sql;
use crate::schema::{self, SchemaCatalog, SchemaSummary};
use crate::validator::{QueryValidator, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

pub const DEFAULT_MAX_EXAMPLES: usize = 3;
const CONFIDENCE_VALID: f64 = 0.8;
const CONFIDENCE_INVALID: f64 = 0.3;

fn default_true() -> bool {
    true
}

fn default_max_examples() -> usize {
    DEFAULT_MAX_EXAMPLES
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(default = "default_true")]
    pub include_examples: bool,
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            include_examples: true,
            max_examples: DEFAULT_MAX_EXAMPLES,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub query_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub natural_language_query: String,
    pub generated_sql: String,
    pub formatted_sql: String,
    pub generator: GeneratorKind,
    pub confidence: f64,
    pub complexity_score: u8,
    pub examples_used: usize,
    pub matched_patterns: Vec<PatternMatch>,
    pub validation: ValidationResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateAndExecuteOutcome {
    pub generation: GenerationOutcome,
    pub execution: Option<ExecutionOutcome>,
    pub execution_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub query: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExampleFilter {
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub generator: GeneratorKind,
    pub model_name: Option<String>,
    pub parameters: Option<ModelParameters>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationRuleStats {
    pub dangerous_keywords: usize,
    pub read_only_keywords: usize,
    pub forbidden_patterns: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatistics {
    pub model_info: ModelInfo,
    pub schema_info: SchemaSummary,
    pub few_shot_learning: ExampleStats,
    pub validation_rules: ValidationRuleStats,
    pub database_connected: bool,
}

pub struct Nl2SqlService {
    catalog: RwLock<Arc<SchemaCatalog>>,
    examples: ExampleStore,
    validator: QueryValidator,
    rule_based: RuleBasedGenerator,
    llm: Option<LlmGenerator>,
    executor: Option<QueryExecutor>,
}

impl Nl2SqlService {
    pub fn new(catalog: SchemaCatalog, examples: ExampleStore) -> Self {
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            examples,
            validator: QueryValidator::new(),
            rule_based: RuleBasedGenerator::default(),
            llm: None,
            executor: None,
        }
    }

    pub fn with_llm(mut self, llm: LlmGenerator) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_executor(mut self, executor: QueryExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_validator(mut self, validator: QueryValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Wire up the service from configuration.
    ///
    /// A database that cannot be reached is logged and leaves the service
    /// without execution; the catalog then comes from `SCHEMA_FILE`, if set.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let examples = match &config.examples_file {
            Some(path) => ExampleStore::from_file(path),
            None => ExampleStore::new(),
        };

        let mut executor = None;
        if let Some(url) = &config.database_url {
            match QueryExecutor::connect(url, config.max_result_rows).await {
                Ok(connected) => executor = Some(connected),
                Err(e) => error!("Failed to connect to database: {}", e),
            }
        }

        let catalog = match (&executor, &config.schema_file) {
            (Some(executor), _) => schema::introspect(executor.pool()).await?,
            (None, Some(path)) => SchemaCatalog::load_json(path)?,
            (None, None) => {
                warn!("No database or schema file configured; schema checks are disabled");
                SchemaCatalog::default()
            }
        };

        let mut service = Self::new(catalog, examples);
        if let Some(executor) = executor {
            service = service.with_executor(executor);
        }
        if let Some(llm_config) = &config.llm {
            info!("LLM generator enabled: {}", llm_config.model);
            service = service.with_llm(LlmGenerator::new(llm_config));
        }
        Ok(service)
    }

    /// Current catalog snapshot.
    pub fn schema(&self) -> Arc<SchemaCatalog> {
        Arc::clone(&self.catalog.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn replace_schema(&self, catalog: SchemaCatalog) {
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
    }

    /// Re-introspect the connected database and swap the snapshot.
    pub async fn refresh_schema(&self) -> Result<Arc<SchemaCatalog>> {
        let executor = self.executor()?;
        let catalog = schema::introspect(executor.pool()).await?;
        self.replace_schema(catalog);
        Ok(self.schema())
    }

    pub fn is_connected(&self) -> bool {
        self.executor.is_some()
    }

    fn executor(&self) -> Result<&QueryExecutor> {
        self.executor
            .as_ref()
            .ok_or_else(|| Nl2SqlError::NotConnected("Database not connected".to_string()))
    }

    pub fn validator(&self) -> &QueryValidator {
        &self.validator
    }

    pub fn example_store(&self) -> &ExampleStore {
        &self.examples
    }

    /// Validate against the current snapshot; an empty catalog skips the schema phase.
    pub fn validate(&self, sql: &str) -> ValidationResult {
        let catalog = self.schema();
        let schema = (!catalog.is_empty()).then_some(catalog.as_ref());
        self.validator.validate(sql, schema)
    }

    pub async fn generate(&self, query: &str, options: &GenerateOptions) -> Result<GenerationOutcome> {
        let query_id = Uuid::new_v4();
        let catalog = self.schema();

        let examples = if options.include_examples {
            self.examples.similar(query, options.max_examples)
        } else {
            Vec::new()
        };
        let matched_patterns = self.examples.patterns_for_query(query);

        let ctx = GenerationContext {
            query: query.to_string(),
            tables: catalog.table_names(),
            schema_text: catalog.format_for_prompt(),
            examples,
        };
        let (generator, generated_sql) = self.run_generators(&ctx).await?;
        let validation = self.validate(&generated_sql);

        info!(
            "Query {} generated by {:?}: valid={}",
            query_id, generator, validation.is_valid
        );

        Ok(GenerationOutcome {
            query_id,
            generated_at: Utc::now(),
            natural_language_query: query.to_string(),
            formatted_sql: format_sql(&generated_sql),
            complexity_score: QueryValidator::complexity_score(&generated_sql),
            confidence: if validation.is_valid {
                CONFIDENCE_VALID
            } else {
                CONFIDENCE_INVALID
            },
            generated_sql,
            generator,
            examples_used: ctx.examples.len(),
            matched_patterns,
            validation,
        })
    }

    /// LLM first when configured, the rule cascade otherwise or on LLM failure.
    async fn run_generators(&self, ctx: &GenerationContext) -> Result<(GeneratorKind, String)> {
        if let Some(llm) = &self.llm {
            match llm.generate(ctx).await {
                Ok(sql) => return Ok((llm.kind(), sql)),
                Err(e) => warn!("LLM generation failed, using rule-based generator: {}", e),
            }
        }
        let sql = self.rule_based.generate(ctx).await?;
        Ok((self.rule_based.kind(), sql))
    }

    /// Validate, then run on the connected database.
    pub async fn execute(&self, sql: &str) -> Result<ExecutionOutcome> {
        let executor = self.executor()?;
        let validation = self.validate(sql);
        if !validation.is_valid {
            return Err(Nl2SqlError::Validation(validation.errors));
        }
        executor.execute(sql).await
    }

    pub async fn generate_and_execute(
        &self,
        query: &str,
        options: &GenerateOptions,
        execute: bool,
    ) -> Result<GenerateAndExecuteOutcome> {
        let generation = self.generate(query, options).await?;

        let (execution, execution_error) = if execute && generation.validation.is_valid {
            match self.execute(&generation.generated_sql).await {
                Ok(outcome) => (Some(outcome), None),
                Err(e) => (None, Some(e.to_string())),
            }
        } else {
            (None, None)
        };

        Ok(GenerateAndExecuteOutcome {
            generation,
            execution,
            execution_error,
        })
    }

    /// One item per query, in order; a failing query does not stop the batch.
    pub async fn batch_generate(&self, queries: &[String], options: &GenerateOptions) -> Vec<BatchItem> {
        let mut items = Vec::with_capacity(queries.len());
        for query in queries {
            let item = match self.generate(query, options).await {
                Ok(outcome) => BatchItem {
                    query: query.clone(),
                    success: true,
                    result: Some(outcome),
                    error: None,
                },
                Err(e) => BatchItem {
                    query: query.clone(),
                    success: false,
                    result: None,
                    error: Some(e.to_string()),
                },
            };
            items.push(item);
        }
        items
    }

    pub fn examples(&self, filter: &ExampleFilter) -> Vec<Example> {
        let mut examples = match &filter.category {
            Some(category) => self.examples.examples_by_category(category),
            None => self.examples.examples(),
        };
        if let Some(difficulty) = &filter.difficulty {
            examples.retain(|e| &e.difficulty == difficulty);
        }
        examples
    }

    pub fn add_example(&self, example: Example) -> Result<()> {
        if !validate_example(&example.natural_language, &example.sql) {
            return Err(Nl2SqlError::InvalidInput(
                "Example must have a question and a SELECT ... FROM statement".to_string(),
            ));
        }
        self.examples.add_example(example);
        Ok(())
    }

    /// Returns the parameters now in effect, or `None` without an LLM generator.
    pub fn update_model_parameters(
        &self,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Option<ModelParameters> {
        self.llm
            .as_ref()
            .map(|llm| llm.update_parameters(max_tokens, temperature))
    }

    pub fn statistics(&self) -> ServiceStatistics {
        let rules = self.validator.rules();
        let model_info = match &self.llm {
            Some(llm) => ModelInfo {
                generator: GeneratorKind::Llm,
                model_name: Some(llm.model().to_string()),
                parameters: Some(llm.parameters()),
            },
            None => ModelInfo {
                generator: GeneratorKind::RuleBased,
                model_name: None,
                parameters: None,
            },
        };

        ServiceStatistics {
            model_info,
            schema_info: self.schema().summary.clone(),
            few_shot_learning: self.examples.statistics(),
            validation_rules: ValidationRuleStats {
                dangerous_keywords: rules.dangerous_keywords.len(),
                read_only_keywords: rules.read_only_keywords.len(),
                forbidden_patterns: rules.forbidden_patterns.len(),
            },
            database_connected: self.is_connected(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::commerce_catalog;

    fn service() -> Nl2SqlService {
        Nl2SqlService::new(commerce_catalog(), ExampleStore::new())
    }

    #[tokio::test]
    async fn test_generate_with_rule_based_generator() {
        let outcome = service()
            .generate("Show me all users", &GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.generated_sql, "SELECT * FROM users");
        assert_eq!(outcome.generator, GeneratorKind::RuleBased);
        assert!(outcome.validation.is_valid);
        assert_eq!(outcome.confidence, CONFIDENCE_VALID);
        assert!(outcome.examples_used > 0 && outcome.examples_used <= DEFAULT_MAX_EXAMPLES);
    }

    #[tokio::test]
    async fn test_generate_without_examples() {
        let options = GenerateOptions {
            include_examples: false,
            max_examples: 3,
        };
        let outcome = service().generate("How many orders", &options).await.unwrap();
        assert_eq!(outcome.examples_used, 0);
        assert_eq!(outcome.generated_sql, "SELECT COUNT(*) FROM orders");
        assert_eq!(outcome.matched_patterns[0].pattern_name, "count");
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back() {
        let llm = LlmGenerator::new(&crate::config::LlmConfig {
            api_key: "test-key".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: "http://127.0.0.1:1".to_string(),
            max_tokens: 512,
            temperature: 0.7,
        });
        let outcome = service()
            .with_llm(llm)
            .generate("Show me all users", &GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.generator, GeneratorKind::RuleBased);
        assert_eq!(outcome.generated_sql, "SELECT * FROM users");
    }

    #[tokio::test]
    async fn test_execute_requires_connection() {
        let err = service().execute("SELECT * FROM users").await.unwrap_err();
        assert!(matches!(err, Nl2SqlError::NotConnected(_)));
    }

    #[test]
    fn test_add_example_rejects_malformed() {
        let service = service();
        assert!(service.add_example(Example::new("Drop it", "DROP TABLE users")).is_err());
        assert!(service
            .add_example(Example::new("List products", "SELECT * FROM products").with_category("basic_select"))
            .is_ok());
        let filter = ExampleFilter {
            category: Some("basic_select".to_string()),
            difficulty: Some("medium".to_string()),
        };
        assert_eq!(service.examples(&filter).len(), 1);
    }

    #[test]
    fn test_validate_skips_schema_for_empty_catalog() {
        let service = Nl2SqlService::new(SchemaCatalog::default(), ExampleStore::new());
        assert!(service.validate("SELECT * FROM anything").is_valid);

        service.replace_schema(commerce_catalog());
        assert!(!service.validate("SELECT * FROM anything").is_valid);
    }

    #[test]
    fn test_statistics_and_model_parameters() {
        let service = service();
        assert!(service.update_model_parameters(Some(10), None).is_none());
        let stats = service.statistics();
        assert_eq!(stats.model_info.generator, GeneratorKind::RuleBased);
        assert_eq!(stats.schema_info.total_tables, 4);
        assert_eq!(stats.few_shot_learning.total_examples, 10);
        assert_eq!(stats.validation_rules.dangerous_keywords, 11);
        assert!(!stats.database_connected);
    }
}
