use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::geo::Coordinate;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    #[default]
    Active,
    Inactive,
    Maintenance,
}

/// Last-known state of one tracked vehicle. Lives only in the fleet's
/// working set; created on the first report and overwritten per report.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: Arc<str>,
    pub route: Option<Arc<str>>,
    pub position: Coordinate,
    pub updated_at: DateTime<Utc>,
    pub status: VehicleStatus,
    /// Set once the vehicle has been silent past the staleness window.
    /// Stale vehicles are hidden from active views, not deleted, so a late
    /// report revives them.
    pub stale: bool,
}

/// One incoming position report. Transient, nothing past the latest
/// per-vehicle snapshot is kept.
#[derive(Debug, Clone)]
pub struct PositionReport {
    pub vehicle: Arc<str>,
    pub position: Coordinate,
    pub timestamp: DateTime<Utc>,
    pub route: Option<Arc<str>>,
    /// Operational status change riding along with the report. Absent
    /// means no change (a brand new vehicle starts active).
    pub status: Option<VehicleStatus>,
}

/// The broadcastable delta produced by an accepted report.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionEvent {
    pub vehicle: Arc<str>,
    pub position: Coordinate,
    pub route: Option<Arc<str>>,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of a report. `applied: false` means the report was valid but
/// older than (or identical to) the stored state, the documented
/// out-of-order guard. `event` is present exactly when the report applied.
#[derive(Debug, Clone)]
pub struct Ack {
    pub applied: bool,
    pub event: Option<PositionEvent>,
}
