mod api;
mod dto;
mod hub;
mod state;

use crate::state::AppState;
use axum::routing::{get, post};
use buswatch::store::RouteStore;
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};

const PORT: u16 = 5000;
const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    info!("Starting server...");
    let args: Vec<_> = std::env::args().collect();
    if args.len() < 2 {
        error!("Missing route data directory");
        std::process::exit(1);
    }
    let store = RouteStore::new(&args[1]);
    let state = Arc::new(AppState::new(store));

    match state.reload_network() {
        Ok(count) => info!("Indexed {count} routes"),
        // Serve with an empty snapshot until a reload succeeds.
        Err(err) => warn!("Starting without route data: {err}"),
    }

    tokio::spawn(sweep_loop(state.clone()));

    let app = axum::Router::new()
        .route("/routes", get(api::routes::list))
        .route("/routes/search", get(api::routes::search))
        .route("/routes/near", get(api::routes::near))
        .route("/routes/{number}", get(api::routes::detail))
        .route("/routes/{number}/stops", get(api::routes::stops))
        .route("/vehicles", get(api::vehicles::list))
        .route("/vehicles/{id}", get(api::vehicles::detail))
        .route("/positions", post(api::vehicles::report))
        .route("/live", get(api::live::live))
        .route("/health", get(api::admin::health))
        .route("/reload", post(api::admin::reload))
        .with_state(state);

    let port = std::env::var("BUSWATCH_PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(PORT);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .unwrap();
    info!("Listening to port {port}");
    axum::serve(listener, app).await.unwrap();
}

/// The only periodic background task: flag silent vehicles stale and evict
/// long-gone entries, on a fixed cadence independent of request load.
async fn sweep_loop(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        state.fleet.sweep(Utc::now());
    }
}
