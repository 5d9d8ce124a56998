//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. They validate the
//! query string and delegate to the [`CacheManager`].

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::manager::CacheManager;
use crate::models::{
    GetResponse, HealthResponse, InvalidateQuery, InvalidateResponse, InvalidateTarget, KeyQuery,
    SetQuery, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<CacheManager>,
}

impl AppState {
    pub fn new(manager: Arc<CacheManager>) -> Self {
        Self { manager }
    }

    /// Starts a cache manager from configuration.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(CacheManager::start(config.cache.clone())?))
    }
}

/// Handler for GET /cache/get?key=
pub async fn get_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<GetResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let (shard, value) = state.manager.get_with_owner(&query.key)?;
    let value = value.ok_or_else(|| CacheError::NotFound(query.key.clone()))?;

    Ok(Json(GetResponse::new(query.key, value, shard)))
}

/// Handler for PUT|POST /cache/set?key=&value=
pub async fn set_handler(
    State(state): State<AppState>,
    Query(query): Query<SetQuery>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let shard = state
        .manager
        .set_with_owner(query.key.clone(), query.value)?;

    Ok(Json(SetResponse::new(query.key, shard)))
}

/// Handler for DELETE /cache/invalidate?key= or ?value=
///
/// Answers 202 because the owning shards remove entries asynchronously.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Query(query): Query<InvalidateQuery>,
) -> Result<(StatusCode, Json<InvalidateResponse>)> {
    let target = query.target().map_err(CacheError::InvalidRequest)?;

    let (label, outcome) = match target {
        InvalidateTarget::Key(key) => {
            let outcome = state.manager.invalidate_key(&key)?;
            (format!("key '{}'", key), outcome)
        }
        InvalidateTarget::Value(value) => {
            let outcome = state.manager.invalidate_value(&value);
            (format!("value '{}'", value), outcome)
        }
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(InvalidateResponse::new(
            &label,
            outcome.delivered,
            outcome.dropped,
        )),
    ))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.manager.stats()))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.manager.shard_count()))
}
