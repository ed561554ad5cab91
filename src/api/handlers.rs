use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::{SearchRequest, SearchResponse, MATCH_TYPE};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use validator::Validate;

/// Root endpoint
pub async fn welcome() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Execute an aggregated search across the requested categories
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    request.validate()?;

    let response = state.service.search(&request).await?;
    Ok(Json(response))
}

/// List the public category names this deployment recognizes
pub async fn categories(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "categories": state.service.categories() }))
}

/// Describe the request and response shape of the search endpoint
pub async fn schema(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "request": {
            "teamId": "string, required - tenant identifier",
            "query": "string, required - search text",
            "categories": "array of strings, required - public category names",
            "limit": "integer, optional - maximum results (1-100, default 50)",
        },
        "response": {
            "teamId": "string - tenant identifier searched",
            "query": "string - the original query",
            "results": [{
                "id": "string - document identifier",
                "category": "string - public category name",
                "score": "number - relevance score",
                "match_type": MATCH_TYPE,
                "highlights": "object, optional - match highlight spans",
            }],
            "total": "integer - aggregate match count, capped at limit",
            "categories_searched": "array of strings",
            "search_time_ms": "number - elapsed wall time",
        },
        "available_categories": state.service.categories(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LogLevelRequest {
    pub level: String,
}

/// Change the process log filter without a restart
pub async fn update_log_level(
    State(state): State<AppState>,
    Json(request): Json<LogLevelRequest>,
) -> Result<Json<Value>> {
    let level = request.level.to_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        return Err(AppError::Validation(format!(
            "Invalid log level '{}': expected trace, debug, info, warn or error",
            request.level
        )));
    }

    let Some(reload) = &state.reload else {
        return Err(AppError::Configuration(
            "Log level reloading is not enabled".to_string(),
        ));
    };

    let filter = EnvFilter::try_new(&level)
        .map_err(|e| AppError::Configuration(format!("Failed to build log filter: {e}")))?;
    reload
        .reload(filter)
        .map_err(|e| AppError::Internal(format!("Failed to apply log filter: {e}")))?;

    tracing::info!(level = %level, "Log level updated");
    Ok(Json(json!({ "status": "ok", "level": level })))
}
