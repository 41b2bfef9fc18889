//! Health check endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serenity::prelude::TypeMapKey;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;

use crate::lock::Disposition;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub bot_username: Option<String>,
    pub guild_count: u64,
    pub locks_completed: u64,
    pub locks_failed: u64,
    pub uptime_secs: u64,
}

/// Shared application state for health checks
#[derive(Clone)]
pub struct AppState {
    pub start_time: SystemTime,
    pub bot_username: Arc<RwLock<Option<String>>>,
    pub guild_count: Arc<AtomicU64>,
    pub locks_completed: Arc<AtomicU64>,
    pub locks_failed: Arc<AtomicU64>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            start_time: SystemTime::now(),
            bot_username: Arc::new(RwLock::new(None)),
            guild_count: Arc::new(AtomicU64::new(0)),
            locks_completed: Arc::new(AtomicU64::new(0)),
            locks_failed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record the identity learnt from the gateway `ready` event
    pub async fn set_ready(&self, username: String, guild_count: usize) {
        *self.bot_username.write().await = Some(username);
        self.guild_count.store(guild_count as u64, Ordering::Relaxed);
    }

    /// Count the result of one handled message
    pub fn record(&self, disposition: Disposition) {
        match disposition {
            Disposition::Locked => {
                self.locks_completed.fetch_add(1, Ordering::Relaxed);
            }
            Disposition::Failed => {
                self.locks_failed.fetch_add(1, Ordering::Relaxed);
            }
            Disposition::Ignored => {}
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeMapKey for AppState {
    type Value = AppState;
}

async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let uptime = state.start_time.elapsed().unwrap_or_default().as_secs();
    let bot_username = state.bot_username.read().await.clone();

    // Not ready until the gateway has identified us
    let (code, status) = if bot_username.is_some() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "starting")
    };

    (
        code,
        Json(HealthStatus {
            status: status.to_string(),
            bot_username,
            guild_count: state.guild_count.load(Ordering::Relaxed),
            locks_completed: state.locks_completed.load(Ordering::Relaxed),
            locks_failed: state.locks_failed.load(Ordering::Relaxed),
            uptime_secs: uptime,
        }),
    )
}

async fn live_handler() -> StatusCode {
    StatusCode::OK
}

/// Create the health check router
pub fn create_health_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/live", get(live_handler))
        .with_state(state)
}

/// Start the health check server
pub async fn start_health_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_health_router(state);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Health check server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
