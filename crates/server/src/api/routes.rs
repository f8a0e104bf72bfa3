use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use buswatch::shared::geo::{Coordinate, Distance};

use crate::{
    api::error_status,
    dto::{NearbyRouteDto, RouteDto, RouteSummaryDto, StopDto},
    state::AppState,
};

const DEFAULT_LIMIT: usize = 10;
const DEFAULT_RADIUS_METERS: f64 = 5000.0;

pub async fn list(State(state): State<Arc<AppState>>) -> Response {
    let network = state.network.snapshot();
    let routes: Vec<_> = network.routes().iter().map(RouteSummaryDto::from).collect();
    Json(routes).into_response()
}

pub async fn detail(
    Path(number): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let network = state.network.snapshot();
    let route = network
        .route_by_number(&number)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(RouteDto::from(route)).into_response())
}

pub async fn search(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let query = params.get("query").map(String::as_str).unwrap_or("");
    let limit = parse_or(&params, "limit", DEFAULT_LIMIT)?;

    let network = state.network.snapshot();
    let routes: Vec<_> = network
        .search_routes_by_text(query, limit)
        .map_err(|err| error_status(&err))?
        .into_iter()
        .map(RouteSummaryDto::from)
        .collect();
    Ok(Json(routes).into_response())
}

pub async fn stops(
    Path(number): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let network = state.network.snapshot();
    let stops: Vec<_> = network
        .stops_on_route(&number, params.get("query").map(String::as_str))
        .map_err(|err| error_status(&err))?
        .into_iter()
        .map(StopDto::from)
        .collect();
    Ok(Json(stops).into_response())
}

pub async fn near(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let lat: f64 = parse_required(&params, "lat")?;
    let lng: f64 = parse_required(&params, "lng")?;
    let radius = parse_or(&params, "radiusMeters", DEFAULT_RADIUS_METERS)?;
    let limit = parse_or(&params, "limit", DEFAULT_LIMIT)?;

    let network = state.network.snapshot();
    let routes: Vec<_> = network
        .search_near(
            &Coordinate::new(lat, lng),
            Distance::from_meters(radius),
            limit,
        )
        .map_err(|err| error_status(&err))?
        .into_iter()
        .map(|(route, distance)| NearbyRouteDto::from(route, distance))
        .collect();
    Ok(Json(routes).into_response())
}

pub(crate) fn parse_required<T: std::str::FromStr>(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<T, StatusCode> {
    params
        .get(key)
        .ok_or(StatusCode::BAD_REQUEST)?
        .parse()
        .map_err(|_| StatusCode::BAD_REQUEST)
}

pub(crate) fn parse_or<T: std::str::FromStr>(
    params: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, StatusCode> {
    match params.get(key) {
        Some(value) => value.parse().map_err(|_| StatusCode::BAD_REQUEST),
        None => Ok(default),
    }
}
