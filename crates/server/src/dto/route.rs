use buswatch::{
    network::{Route, Stop},
    shared::geo::Distance,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummaryDto {
    pub route_number: String,
    pub name: String,
    pub active: bool,
}

impl RouteSummaryDto {
    pub fn from(route: &Route) -> Self {
        Self {
            route_number: route.number.to_string(),
            name: route.name.to_string(),
            active: route.active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDto {
    pub route_number: String,
    pub name: String,
    pub active: bool,
    pub stops: Vec<StopDto>,
    /// Path vertices as [longitude, latitude] pairs.
    pub path: Vec<[f64; 2]>,
}

impl RouteDto {
    pub fn from(route: &Route) -> Self {
        Self {
            route_number: route.number.to_string(),
            name: route.name.to_string(),
            active: route.active,
            stops: route.stops.iter().map(StopDto::from).collect(),
            path: route
                .path
                .iter()
                .map(|vertex| [vertex.longitude, vertex.latitude])
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopDto {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub arrival_time: Option<String>,
}

impl StopDto {
    pub fn from(stop: &Stop) -> Self {
        Self {
            name: stop.name.to_string(),
            lat: stop.coordinate.latitude,
            lng: stop.coordinate.longitude,
            arrival_time: stop.arrival_label.as_ref().map(|label| label.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRouteDto {
    pub route_number: String,
    pub name: String,
    pub distance_meters: f64,
}

impl NearbyRouteDto {
    pub fn from(route: &Route, distance: Distance) -> Self {
        Self {
            route_number: route.number.to_string(),
            name: route.name.to_string(),
            distance_meters: distance.as_meters(),
        }
    }
}
