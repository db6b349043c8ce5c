use axum::{
    extract::State,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use crate::fetch::CycleError;
use crate::types::{ConnectionStatus, TournamentSnapshot};

/// What the status endpoint publishes. A failed cycle updates the indicator
/// and error message but keeps the last-known-good snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub status: ConnectionStatus,
    pub last_update: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub snapshot: Option<TournamentSnapshot>,
}

impl Default for MonitorStatus {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            last_update: None,
            last_error: None,
            snapshot: None,
        }
    }
}

#[derive(Clone, Default)]
pub struct AppState {
    shared: Arc<Mutex<MonitorStatus>>,
}

impl AppState {
    pub fn publish(&self, snapshot: TournamentSnapshot) {
        let mut shared = self.shared.lock().unwrap();
        shared.status = ConnectionStatus::Connected;
        shared.last_update = Some(snapshot.fetched_at);
        shared.last_error = None;
        shared.snapshot = Some(snapshot);
    }

    pub fn record_failure(&self, error: &CycleError) {
        let mut shared = self.shared.lock().unwrap();
        shared.status = error.status();
        shared.last_error = Some(error.to_string());
    }

    pub fn current(&self) -> MonitorStatus {
        self.shared.lock().unwrap().clone()
    }
}

#[axum::debug_handler]
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let status = state.current();
    let name = status
        .snapshot
        .as_ref()
        .map(|s| s.tournament_name.clone())
        .unwrap_or_else(|| "no data yet".to_string());
    let games = status.snapshot.as_ref().map(|s| s.games.len()).unwrap_or(0);
    Html(format!(
        "<!DOCTYPE html><html><head><title>FFE Round Monitor</title></head>\
         <body><h1>FFE Round Monitor</h1>\
         <p>Tournament: {}</p><p>Status: {:?}</p><p>Games: {}</p>\
         <p>See <a href=\"/snapshot\">/snapshot</a> and <a href=\"/status\">/status</a>.</p>\
         </body></html>",
        name, status.status, games
    ))
}

#[axum::debug_handler]
async fn snapshot_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.current().snapshot)
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: ConnectionStatus,
    last_update: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

#[axum::debug_handler]
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.current();
    Json(StatusBody {
        status: current.status,
        last_update: current.last_update,
        last_error: current.last_error,
    })
}

/// Spawn the status endpoint on localhost. Snapshot publication is push-based
/// from the polling loop; readers only ever see the latest state.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/snapshot", get(snapshot_handler))
        .route("/status", get(status_handler))
        .with_state(state);

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("status endpoint available at http://{}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("status endpoint failed: {}", e);
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn failure_keeps_the_last_snapshot() {
        let state = AppState::default();
        state.publish(TournamentSnapshot {
            tournament_name: "Open de Test".to_string(),
            games: vec![],
            players: vec![],
            fetched_at: Utc::now(),
        });
        state.record_failure(&CycleError::HttpStatus(reqwest::StatusCode::BAD_GATEWAY));

        let current = state.current();
        assert_eq!(current.status, ConnectionStatus::HttpError);
        assert!(current.snapshot.is_some());
        assert!(current.last_error.is_some());
    }
}
