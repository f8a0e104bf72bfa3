use buswatch::fleet::{Ack, Vehicle, VehicleStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDto {
    pub vehicle_id: String,
    pub route_id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub status: VehicleStatus,
    pub stale: bool,
    pub updated_at: DateTime<Utc>,
}

impl VehicleDto {
    pub fn from(vehicle: &Vehicle) -> Self {
        Self {
            vehicle_id: vehicle.id.to_string(),
            route_id: vehicle.route.as_ref().map(|route| route.to_string()),
            lat: vehicle.position.latitude,
            lng: vehicle.position.longitude,
            status: vehicle.status,
            stale: vehicle.stale,
            updated_at: vehicle.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionReportDto {
    pub vehicle_id: String,
    pub lat: f64,
    pub lng: f64,
    /// Producer-supplied; the server stamps arrival time when absent.
    pub timestamp: Option<DateTime<Utc>>,
    pub route_id: Option<String>,
    /// Optional status change (active/inactive/maintenance).
    pub status: Option<VehicleStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckDto {
    pub applied: bool,
}

impl AckDto {
    pub fn from(ack: &Ack) -> Self {
        Self {
            applied: ack.applied,
        }
    }
}
