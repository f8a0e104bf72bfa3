use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{error, info};

use crate::{dto::HealthDto, state::AppState};

pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let network = state.network.snapshot();
    Json(HealthDto {
        ready: state.network.is_ready(),
        degraded: state.is_degraded(),
        routes: network.routes().len(),
        vehicles: state.fleet.len(),
        observers: state.hub.observers(),
        published: state.hub.published(),
        delivered: state.hub.delivered(),
    })
    .into_response()
}

/// Rebuilds the route snapshot from the store. The store is the source of
/// truth; the index is a derived cache and swapping it never interrupts
/// readers.
pub async fn reload(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let started = Utc::now();
    match state.reload_network() {
        Ok(count) => {
            info!(
                "reloaded {count} routes in {}ms",
                (Utc::now() - started).num_milliseconds()
            );
            Ok(().into_response())
        }
        Err(err) => {
            error!("reload failed, keeping previous snapshot: {err}");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
