use super::handlers;
use super::types::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub fn create_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root_handler))
        .route("/health", get(handlers::health_handler))
        .route("/generate-sql", post(handlers::generate_sql_handler))
        .route("/execute-sql", post(handlers::execute_sql_handler))
        .route("/validate-query", get(handlers::validate_query_handler))
        .route("/schema", get(handlers::schema_handler))
        .route("/refresh-schema", post(handlers::refresh_schema_handler))
        .route("/examples", get(handlers::examples_handler))
        .route("/add-example", post(handlers::add_example_handler))
        .route("/batch-generate", post(handlers::batch_generate_handler))
        .route("/statistics", get(handlers::statistics_handler))
        .route("/update-model", post(handlers::update_model_handler))
        .layer(cors)
        .with_state(app_state)
}
