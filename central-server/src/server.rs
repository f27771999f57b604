//! HTTP surface of the central server.
//!
//! | Route | Purpose |
//! |---|---|
//! | `POST /receive` | the remote call: one relayed [`Message`] per request |
//! | `GET /health` | liveness, used by field units at startup |
//! | `GET /reports` | recent completed batch reports |

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use relay_types::rpc::{ANONYMOUS_SENDER, HEALTH_PATH, RECEIVE_PATH, REPORTS_PATH, SENDER_HEADER};
use relay_types::Message;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::aggregator::{run_aggregator, Inbound, ReportLog, SenderReport};
use crate::config::CentralConfig;

// ─── Shared State ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    inbound: mpsc::Sender<Inbound>,
    reports: ReportLog,
}

/// Spawn the aggregator task and build the router that feeds it.
pub fn build(config: &CentralConfig) -> (Router, ReportLog) {
    let (tx, rx) = mpsc::channel(config.queue_depth.max(1));
    let reports = ReportLog::new(config.report_history);
    tokio::spawn(run_aggregator(rx, reports.clone()));

    let state = AppState {
        inbound: tx,
        reports: reports.clone(),
    };
    (router(state), reports)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(RECEIVE_PATH, post(receive))
        .route(HEALTH_PATH, get(|| async { "central-server ok" }))
        .route(REPORTS_PATH, get(reports))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, config: &CentralConfig) -> std::io::Result<()> {
    let (app, _reports) = build(config);
    info!("🚀 Central Server ready on {}", listener.local_addr()?);
    axum::serve(listener, app).await
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(msg): Json<Message>,
) -> StatusCode {
    let sender = headers
        .get(SENDER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ANONYMOUS_SENDER)
        .to_string();

    let inbound = Inbound {
        sender,
        msg,
        at: Utc::now(),
    };
    match state.inbound.send(inbound).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => {
            error!("[Central Server] Aggregator is gone; dropping message {}", msg.sequence_number);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn reports(State(state): State<AppState>) -> Json<Vec<SenderReport>> {
    Json(state.reports.snapshot().await)
}
