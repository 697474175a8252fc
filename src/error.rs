use thiserror::Error;

#[derive(Error, Debug)]
pub enum Nl2SqlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("LLM error: {0}")]
    Llm(String),

    /// Statement rejected by the validator; carries every validator error.
    #[error("Query validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<sqlx::Error> for Nl2SqlError {
    fn from(err: sqlx::Error) -> Self {
        Nl2SqlError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for Nl2SqlError {
    fn from(err: reqwest::Error) -> Self {
        Nl2SqlError::Llm(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Nl2SqlError>;
