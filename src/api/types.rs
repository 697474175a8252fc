use crate::error::Nl2SqlError;
use crate::executor::ExecutionOutcome;
use crate::generator::GeneratorKind;
use crate::service::{GenerateOptions, Nl2SqlService, DEFAULT_MAX_EXAMPLES};
use crate::validator::ValidationResult;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<Nl2SqlService>,
}

impl AppState {
    pub fn new(service: Nl2SqlService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_examples() -> usize {
    DEFAULT_MAX_EXAMPLES
}

fn default_category() -> String {
    "custom".to_string()
}

fn default_difficulty() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub natural_language_query: String,
    #[serde(default = "default_true")]
    pub include_examples: bool,
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
    #[serde(default = "default_true")]
    pub execute_query: bool,
}

impl QueryRequest {
    pub fn options(&self) -> GenerateOptions {
        GenerateOptions {
            include_examples: self.include_examples,
            max_examples: self.max_examples,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub query_id: Uuid,
    pub natural_language_query: String,
    pub generated_sql: String,
    pub formatted_sql: String,
    pub generator: GeneratorKind,
    pub confidence: f64,
    pub complexity_score: u8,
    pub validation: ValidationResult,
    pub execution_results: Option<ExecutionOutcome>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqlRequest {
    pub sql_query: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExampleRequest {
    pub natural_language: String,
    pub sql: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelUpdateRequest {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// Error half of every handler's return type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: message.into(),
                details: Vec::new(),
            },
        }
    }
}

impl From<Nl2SqlError> for ApiError {
    fn from(err: Nl2SqlError) -> Self {
        let status = match &err {
            Nl2SqlError::InvalidInput(_) | Nl2SqlError::Validation(_) => StatusCode::BAD_REQUEST,
            Nl2SqlError::NotConnected(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let details = match &err {
            Nl2SqlError::Validation(errors) => errors.clone(),
            _ => Vec::new(),
        };
        Self {
            status,
            body: ErrorBody {
                error: err.to_string(),
                details,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<Json<T>, ApiError>;
