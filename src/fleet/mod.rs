use std::{
    collections::HashMap,
    hash::{DefaultHasher, Hash, Hasher},
    sync::{Arc, PoisonError, RwLock},
};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

mod models;
pub use models::*;

use crate::Error;

#[derive(Debug, Clone)]
pub struct Config {
    /// Silence window after which a vehicle is flagged stale.
    pub stale_after: TimeDelta,
    /// Much longer silence window after which the entry is evicted outright.
    pub evict_after: TimeDelta,
    pub shards: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stale_after: TimeDelta::seconds(30),
            evict_after: TimeDelta::minutes(10),
            shards: 16,
        }
    }
}

type Shard = RwLock<HashMap<Arc<str>, Vehicle>>;

/// Working set of vehicle state. Reports from different vehicles land on
/// independent shards, so ingest never funnels through a single lock.
pub struct Fleet {
    config: Config,
    shards: Box<[Shard]>,
}

impl Default for Fleet {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Fleet {
    pub fn new(config: Config) -> Self {
        let shards = (0..config.shards.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self { config, shards }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ingests one position report. Validation failures are errors; a
    /// report at or before the stored timestamp is acknowledged without
    /// being applied, which makes duplicate and out-of-order delivery
    /// harmless. Exactly one event comes out of every applied report.
    pub fn report(&self, report: PositionReport) -> Result<Ack, Error> {
        if report.vehicle.trim().is_empty() {
            return Err(Error::InvalidArgument("empty vehicle id".into()));
        }
        if !report.position.in_range() {
            return Err(Error::InvalidArgument(format!(
                "position out of range ({})",
                report.position
            )));
        }

        let mut shard = self.shard_for(&report.vehicle).write().unwrap_or_else(PoisonError::into_inner);
        let vehicle = shard
            .entry(report.vehicle.clone())
            .or_insert_with(|| Vehicle {
                id: report.vehicle.clone(),
                route: None,
                position: report.position,
                // A fresh entry must never win the timestamp comparison.
                updated_at: DateTime::<Utc>::MIN_UTC,
                status: VehicleStatus::default(),
                stale: false,
            });

        if report.timestamp <= vehicle.updated_at {
            return Ok(Ack {
                applied: false,
                event: None,
            });
        }

        vehicle.position = report.position;
        vehicle.updated_at = report.timestamp;
        vehicle.stale = false;
        if let Some(route) = report.route {
            vehicle.route = Some(route);
        }
        if let Some(status) = report.status {
            vehicle.status = status;
        }

        let event = PositionEvent {
            vehicle: vehicle.id.clone(),
            position: vehicle.position,
            route: vehicle.route.clone(),
            timestamp: vehicle.updated_at,
        };
        Ok(Ack {
            applied: true,
            event: Some(event),
        })
    }

    pub fn vehicle(&self, id: &str) -> Option<Vehicle> {
        self.shard_for(id)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Current state of the fleet, id-ordered. `active_only` hides vehicles
    /// that are flagged stale, have gone silent past the staleness window,
    /// or are not operationally active.
    pub fn snapshot(
        &self,
        route: Option<&str>,
        active_only: bool,
        now: DateTime<Utc>,
    ) -> Vec<Vehicle> {
        let mut vehicles: Vec<Vehicle> = self
            .shards
            .iter()
            .flat_map(|shard| {
                shard
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .values()
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .filter(|vehicle| match route {
                Some(route) => vehicle.route.as_deref() == Some(route),
                None => true,
            })
            .filter(|vehicle| {
                !active_only
                    || (vehicle.status == VehicleStatus::Active
                        && !self.silent(vehicle, now))
            })
            .collect();
        vehicles.sort_by(|a, b| a.id.cmp(&b.id));
        vehicles
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Periodic maintenance pass: flags vehicles silent past the staleness
    /// window and evicts entries silent past the retention window. Returns
    /// (flagged, evicted).
    pub fn sweep(&self, now: DateTime<Utc>) -> (usize, usize) {
        let mut flagged = 0;
        let mut evicted = 0;
        for shard in self.shards.iter() {
            let mut shard = shard.write().unwrap_or_else(PoisonError::into_inner);
            shard.retain(|_, vehicle| {
                if now - vehicle.updated_at > self.config.evict_after {
                    evicted += 1;
                    return false;
                }
                if !vehicle.stale && self.silent(vehicle, now) {
                    vehicle.stale = true;
                    flagged += 1;
                }
                true
            });
        }
        if flagged + evicted > 0 {
            debug!("sweep flagged {flagged} stale and evicted {evicted}");
        }
        (flagged, evicted)
    }

    fn silent(&self, vehicle: &Vehicle, now: DateTime<Utc>) -> bool {
        vehicle.stale || now - vehicle.updated_at > self.config.stale_after
    }

    fn shard_for(&self, id: &str) -> &Shard {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % self.shards.len()]
    }
}
