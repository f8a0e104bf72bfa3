use serde::Deserialize;

use crate::shared::geo::Coordinate;

/// Row of `routes.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvRoute {
    pub route_number: String,
    pub name: String,
    /// 0 disables the route; anything else (or a missing column) is active.
    pub active: Option<u8>,
}

/// Row of `stops.csv`. `sequence` orders the stops along the route.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvStop {
    pub route_number: String,
    pub sequence: u32,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub arrival_time: Option<String>,
}

/// Row of `shapes.csv`, one path vertex per row.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvShapePoint {
    pub route_number: String,
    pub sequence: u32,
    pub lat: f64,
    pub lon: f64,
}

/// A fully assembled route as handed to the network builder.
#[derive(Debug, Default, Clone)]
pub struct RouteRecord {
    pub number: String,
    pub name: String,
    pub active: bool,
    pub stops: Vec<StopRecord>,
    pub path: Vec<Coordinate>,
}

#[derive(Debug, Default, Clone)]
pub struct StopRecord {
    pub name: String,
    pub coordinate: Coordinate,
    pub arrival_label: Option<String>,
}
