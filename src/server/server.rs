use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::ledger_store::{
    LedgerStore, LedgerStoreError, NewInterval, NewPlayer, NewSession, SessionPatch,
};

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use super::state::*;
use super::{log_requests, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub project: &'static str,
    pub uptime: String,
}

#[derive(Serialize)]
struct HealthResponse {
    pub status: &'static str,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

/// Maps typed store failures onto HTTP statuses: NotFound -> 404,
/// DuplicateEmail -> 409, Invalid -> 422, anything else -> 500.
fn store_error_response(err: LedgerStoreError) -> Response {
    match err {
        LedgerStoreError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        LedgerStoreError::DuplicateEmail(_) => (StatusCode::CONFLICT, err.to_string()),
        LedgerStoreError::Invalid(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        LedgerStoreError::Sqlite(_) => {
            error!("Store failure: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            )
        }
    }
    .into_response()
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        project: "Poker Profit Manager",
        uptime: format_uptime(state.start_time.elapsed()),
    };
    Json(stats)
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

async fn post_player(
    State(store): State<GuardedLedgerStore>,
    Json(body): Json<NewPlayer>,
) -> Response {
    match store.create_player(body) {
        Ok(player) => (StatusCode::CREATED, Json(player)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn get_players(State(store): State<GuardedLedgerStore>) -> Response {
    match store.list_players() {
        Ok(players) => Json(players).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn delete_player(State(store): State<GuardedLedgerStore>, Path(id): Path<i64>) -> Response {
    match store.delete_player(id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn post_session(
    State(store): State<GuardedLedgerStore>,
    Path(player_id): Path<i64>,
    Json(body): Json<NewSession>,
) -> Response {
    match store.create_session(player_id, body) {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn get_sessions(State(store): State<GuardedLedgerStore>) -> Response {
    match store.list_sessions() {
        Ok(sessions) => Json(sessions).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn put_session(
    State(store): State<GuardedLedgerStore>,
    Path(id): Path<i64>,
    Json(body): Json<SessionPatch>,
) -> Response {
    match store.update_session(id, body) {
        Ok(session) => Json(session).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn delete_session(State(store): State<GuardedLedgerStore>, Path(id): Path<i64>) -> Response {
    match store.delete_session(id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn post_interval(
    State(store): State<GuardedLedgerStore>,
    Path(session_id): Path<i64>,
    Json(body): Json<NewInterval>,
) -> Response {
    match store.create_interval(session_id, body) {
        Ok(interval) => (StatusCode::CREATED, Json(interval)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn get_intervals(State(store): State<GuardedLedgerStore>) -> Response {
    match store.list_intervals() {
        Ok(intervals) => Json(intervals).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn delete_interval(State(store): State<GuardedLedgerStore>, Path(id): Path<i64>) -> Response {
    match store.delete_interval(id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => store_error_response(err),
    }
}

fn make_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn make_app(config: ServerConfig, ledger_store: Arc<dyn LedgerStore>) -> Result<Router> {
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        ledger_store,
    };

    let app = Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/player", post(post_player))
        .route("/players", get(get_players))
        .route("/player/{id}", delete(delete_player))
        .route("/player/{id}/session", post(post_session))
        .route("/sessions", get(get_sessions))
        .route("/session/{id}", put(put_session))
        .route("/session/{id}", delete(delete_session))
        .route("/session/{id}/interval", post(post_interval))
        .route("/intervals", get(get_intervals))
        .route("/interval/{id}", delete(delete_interval))
        .layer(make_cors_layer(&config))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state);

    Ok(app)
}

pub async fn run_server(config: ServerConfig, ledger_store: Arc<dyn LedgerStore>) -> Result<()> {
    let port = config.port;
    let app = make_app(config, ledger_store)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
