//! Webhook endpoint.
//!
//! `POST /` takes the raw notification body and answers 200 with a short
//! text on success or no-op, 500 with a generic text when dispatch fails.
//! A failed notification is logged with its payload and, when a dump file
//! is configured, written there for replay.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::engine::Dispatcher;
use crate::error::{Error, truncate};

/// Payload characters kept in the error log line.
const LOGGED_PAYLOAD_CHARS: usize = 2048;

#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher>,
    last_error_file: Option<Arc<PathBuf>>,
}

/// Creates the webhook router.
///
/// `last_error_file`, when set, is overwritten with the error and full
/// payload of every notification that fails dispatch.
pub fn router(dispatcher: Arc<Dispatcher>, last_error_file: Option<PathBuf>) -> Router {
    let state = AppState {
        dispatcher,
        last_error_file: last_error_file.map(Arc::new),
    };
    Router::new()
        .route("/", post(handle_notification))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_notification(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    match state.dispatcher.dispatch(&body).await {
        Ok(ack) => {
            if let Some(report) = ack.report() {
                info!(
                    dispatch_id = %report.dispatch_id,
                    issue_id = %report.issue_id,
                    rules = report.runs.len(),
                    failed = report.failures().count(),
                    writes = report.writes(),
                    "notification handled"
                );
            }
            (StatusCode::OK, ack.message())
        }
        Err(e) => {
            let payload = String::from_utf8_lossy(&body);
            error!(
                error = %e,
                body_len = body.len(),
                payload = %truncate(&payload, LOGGED_PAYLOAD_CHARS),
                "notification dispatch failed"
            );
            if let Some(path) = state.last_error_file.as_deref() {
                dump_last_error(path, &e, &payload).await;
            }
            (StatusCode::INTERNAL_SERVER_ERROR, "Error occurred")
        }
    }
}

async fn dump_last_error(path: &Path, e: &Error, payload: &str) {
    let content = format!("Error: {e}\nWebhook data: {payload}\n");
    if let Err(io) = tokio::fs::write(path, content).await {
        warn!(path = %path.display(), error = %io, "cannot write last error file");
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Serve the router on `addr` until ctrl-c.
pub async fn serve(
    dispatcher: Arc<Dispatcher>,
    addr: &str,
    last_error_file: Option<PathBuf>,
) -> crate::error::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "webhook server listening");
    axum::serve(listener, router(dispatcher, last_error_file))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("webhook server shutting down");
        })
        .await?;
    Ok(())
}
