//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::models::{GetReply, HealthResponse, RpcRequest, RpcResponse, StatsResponse, GET_METHOD};
use crate::service::CacheService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CacheService>,
}

impl AppState {
    /// Creates a new AppState around the given service.
    pub fn new(service: CacheService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Handler for POST /rpc
///
/// Dispatches JSON-RPC calls. Method failures (not found, admission timeout,
/// storage fault) come back as 200 with the `error` field set; an unknown
/// method or malformed params is a 400.
pub async fn rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<RpcRequest>,
) -> (StatusCode, Json<RpcResponse>) {
    if req.method != GET_METHOD {
        let msg = format!("rpc: can't find method \"{}\"", req.method);
        return (StatusCode::BAD_REQUEST, Json(RpcResponse::failure(req.id, msg)));
    }

    let args = match req.get_args() {
        Ok(args) => args,
        Err(msg) => {
            return (StatusCode::BAD_REQUEST, Json(RpcResponse::failure(req.id, msg)));
        }
    };

    let response = match state.service.get(args.key.as_bytes()).await {
        Ok(value) => RpcResponse::success(req.id, GetReply::from_bytes(&value)),
        Err(err) => RpcResponse::failure(req.id, err.to_string()),
    };
    (StatusCode::OK, Json(response))
}

/// Handler for GET /stats
///
/// Returns cache counters and admission pool usage.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.service.stats().into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
