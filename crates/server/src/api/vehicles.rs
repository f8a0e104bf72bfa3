use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use buswatch::{
    fleet::PositionReport,
    shared::geo::Coordinate,
};
use chrono::Utc;

use crate::{
    api::{error_status, routes::parse_or},
    dto::{AckDto, PositionReportDto, VehicleDto},
    state::AppState,
};

pub async fn list(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let route = params.get("routeId").map(String::as_str);
    let active_only: bool = parse_or(&params, "activeOnly", false)?;

    let vehicles: Vec<_> = state
        .fleet
        .snapshot(route, active_only, Utc::now())
        .iter()
        .map(VehicleDto::from)
        .collect();
    Ok(Json(vehicles).into_response())
}

pub async fn detail(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let vehicle = state.fleet.vehicle(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(VehicleDto::from(&vehicle)).into_response())
}

/// Ingest endpoint. Every applied report fans out exactly one live update;
/// stale or duplicate reports are acknowledged without a broadcast.
pub async fn report(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PositionReportDto>,
) -> Result<Response, StatusCode> {
    let report = PositionReport {
        vehicle: body.vehicle_id.into(),
        position: Coordinate::new(body.lat, body.lng),
        timestamp: body.timestamp.unwrap_or_else(Utc::now),
        route: body.route_id.map(|route| route.into()),
        status: body.status,
    };

    let ack = state.fleet.report(report).map_err(|err| error_status(&err))?;
    if let Some(event) = &ack.event {
        state.hub.publish(event);
    }
    Ok(Json(AckDto::from(&ack)).into_response())
}
