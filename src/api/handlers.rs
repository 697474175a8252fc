use super::types::{
    ApiError, ApiResult, AppState, ExampleRequest, MessageResponse, ModelUpdateRequest,
    QueryRequest, QueryResponse, SqlRequest,
};
use crate::executor::ExecutionOutcome;
use crate::few_shot::Example;
use crate::helpers::validate_natural_language_query;
use crate::schema::SchemaCatalog;
use crate::service::{ExampleFilter, GenerateOptions, ServiceStatistics};
use crate::validator::ValidationResult;
use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value as JsonValue};
use tracing::{error, info};

pub const API_VERSION: &str = "1.0.0";

pub async fn root_handler() -> Json<JsonValue> {
    Json(json!({
        "message": "NL2SQL Query Generator API",
        "version": API_VERSION,
        "docs": "/docs",
        "status": "running",
    }))
}

pub async fn health_handler(State(state): State<AppState>) -> Json<JsonValue> {
    Json(json!({
        "status": "healthy",
        "generator_initialized": true,
        "database_connected": state.service.is_connected(),
    }))
}

pub async fn generate_sql_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<QueryResponse> {
    validate_natural_language_query(&request.natural_language_query)
        .map_err(ApiError::bad_request)?;

    let outcome = state
        .service
        .generate_and_execute(
            &request.natural_language_query,
            &request.options(),
            request.execute_query && state.service.is_connected(),
        )
        .await?;
    let generation = outcome.generation;

    let error = match (&outcome.execution_error, generation.validation.is_valid) {
        (Some(e), _) => Some(e.clone()),
        (None, false) => Some(generation.validation.errors.join("; ")),
        (None, true) => None,
    };

    Ok(Json(QueryResponse {
        query_id: generation.query_id,
        natural_language_query: generation.natural_language_query,
        generated_sql: generation.generated_sql,
        formatted_sql: generation.formatted_sql,
        generator: generation.generator,
        confidence: generation.confidence,
        complexity_score: generation.complexity_score,
        validation: generation.validation,
        execution_results: outcome.execution,
        error,
    }))
}

pub async fn execute_sql_handler(
    State(state): State<AppState>,
    Json(request): Json<SqlRequest>,
) -> ApiResult<ExecutionOutcome> {
    let outcome = state.service.execute(&request.sql_query).await?;
    Ok(Json(outcome))
}

pub async fn validate_query_handler(
    State(state): State<AppState>,
    Query(params): Query<SqlRequest>,
) -> Json<ValidationResult> {
    Json(state.service.validate(&params.sql_query))
}

pub async fn schema_handler(State(state): State<AppState>) -> Json<SchemaCatalog> {
    Json(state.service.schema().as_ref().clone())
}

pub async fn refresh_schema_handler(
    State(state): State<AppState>,
) -> ApiResult<JsonValue> {
    let catalog = state.service.refresh_schema().await.map_err(|e| {
        error!("Schema refresh failed: {}", e);
        ApiError::from(e)
    })?;
    info!("Schema refreshed: {} tables", catalog.summary.total_tables);
    Ok(Json(json!({
        "message": "Schema refreshed successfully",
        "schema_summary": catalog.summary,
    })))
}

pub async fn examples_handler(
    State(state): State<AppState>,
    Query(filter): Query<ExampleFilter>,
) -> Json<JsonValue> {
    Json(json!({ "examples": state.service.examples(&filter) }))
}

pub async fn add_example_handler(
    State(state): State<AppState>,
    Json(request): Json<ExampleRequest>,
) -> ApiResult<MessageResponse> {
    let example = Example::new(request.natural_language, request.sql)
        .with_category(request.category)
        .with_difficulty(request.difficulty);
    state.service.add_example(example)?;
    Ok(Json(MessageResponse::new("Example added successfully")))
}

pub async fn batch_generate_handler(
    State(state): State<AppState>,
    Json(queries): Json<Vec<String>>,
) -> Json<JsonValue> {
    let results = state
        .service
        .batch_generate(&queries, &GenerateOptions::default())
        .await;
    Json(json!({ "results": results }))
}

pub async fn statistics_handler(State(state): State<AppState>) -> Json<ServiceStatistics> {
    Json(state.service.statistics())
}

pub async fn update_model_handler(
    State(state): State<AppState>,
    Json(request): Json<ModelUpdateRequest>,
) -> ApiResult<JsonValue> {
    let parameters = state
        .service
        .update_model_parameters(request.max_tokens, request.temperature)
        .ok_or_else(|| ApiError::bad_request("No LLM generator configured"))?;
    Ok(Json(json!({
        "message": "Model parameters updated successfully",
        "max_tokens": parameters.max_tokens,
        "temperature": parameters.temperature,
    })))
}
