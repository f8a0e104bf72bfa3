use std::{
    collections::HashMap,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

mod models;
pub use models::*;
use tracing::debug;

use crate::{
    Error,
    shared::{
        self,
        geo::{Coordinate, Distance},
    },
    spatial::SpatialIndex,
    store::RouteRecord,
};

pub const MAX_SEARCH_RADIUS: Distance = Distance::from_kilometers(50.0);

type IdToIndex = HashMap<Arc<str>, usize>;

/// Immutable snapshot of the route network: the routes themselves, a number
/// lookup, and the spatial index derived from their geometry. Built once
/// from store records and shared behind an Arc; a data change means
/// building a fresh Network and swapping it in via [`NetworkHandle`].
#[derive(Debug, Clone, Default)]
pub struct Network {
    routes: Box<[Route]>,
    route_lookup: Arc<IdToIndex>,
    index: SpatialIndex,
}

impl Network {
    pub fn new() -> Self {
        Default::default()
    }

    /// Builds the snapshot from store records. Routes are kept sorted by
    /// number so every browse and search result comes out in a stable
    /// order. Enforces the network invariants: unique route numbers, sane
    /// coordinates, and at least two vertices for any path geometry.
    pub fn from_records(mut records: Vec<RouteRecord>) -> Result<Self, Error> {
        records.sort_by(|a, b| a.number.cmp(&b.number));

        let mut route_lookup: IdToIndex = HashMap::new();
        let mut routes: Vec<Route> = Vec::with_capacity(records.len());
        for record in records {
            if record.number.trim().is_empty() {
                return Err(Error::InvalidArgument("empty route number".into()));
            }
            if record.path.len() == 1 {
                return Err(Error::InvalidArgument(format!(
                    "route {} has a single-vertex path",
                    record.number
                )));
            }
            for vertex in &record.path {
                if !vertex.in_range() {
                    return Err(Error::InvalidArgument(format!(
                        "route {} has an out-of-range path vertex ({vertex})",
                        record.number
                    )));
                }
            }

            let stops: Box<[Stop]> = record
                .stops
                .into_iter()
                .map(|stop| {
                    if !stop.coordinate.in_range() {
                        return Err(Error::InvalidArgument(format!(
                            "stop {} on route {} is out of range ({})",
                            stop.name, record.number, stop.coordinate
                        )));
                    }
                    Ok(Stop {
                        normalized_name: stop.name.to_lowercase().into(),
                        name: stop.name.into(),
                        coordinate: stop.coordinate,
                        arrival_label: stop.arrival_label.map(|label| label.into()),
                    })
                })
                .collect::<Result<_, Error>>()?;

            let index = routes.len();
            let route = Route {
                index: index as u32,
                number: record.number.clone().into(),
                normalized_name: record.name.to_lowercase().into(),
                name: record.name.into(),
                stops,
                path: record.path.into(),
                active: record.active,
            };
            if route_lookup.insert(route.number.clone(), index).is_some() {
                return Err(Error::InvalidArgument(format!(
                    "duplicate route number {}",
                    route.number
                )));
            }
            routes.push(route);
        }

        let routes: Box<[Route]> = routes.into();
        let index = SpatialIndex::build(&routes);
        debug!(
            "indexed {} routes ({} geometry points)",
            routes.len(),
            index.len()
        );
        Ok(Self {
            routes,
            route_lookup: route_lookup.into(),
            index,
        })
    }

    /// All routes in number order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route_by_number(&self, number: &str) -> Option<&Route> {
        let index = self.route_lookup.get(number)?;
        Some(&self.routes[*index])
    }

    /// Case-insensitive substring search on route name or number. An empty
    /// query browses all routes. Results come back in number order, capped
    /// at `limit`.
    pub fn search_routes_by_text(&self, query: &str, limit: usize) -> Result<Vec<&Route>, Error> {
        validate_limit(limit)?;
        Ok(shared::search(query, &self.routes)
            .into_iter()
            .take(limit)
            .collect())
    }

    /// Stops on a route, optionally filtered by a substring match on the
    /// stop name. Unknown routes are an error, unlike an empty match.
    pub fn stops_on_route(&self, number: &str, query: Option<&str>) -> Result<Vec<&Stop>, Error> {
        let route = self
            .route_by_number(number)
            .ok_or_else(|| Error::NotFound(format!("route {number}")))?;
        let needle = query.map(|q| q.trim().to_lowercase()).unwrap_or_default();
        Ok(route
            .stops
            .iter()
            .filter(|stop| needle.is_empty() || stop.normalized_name.contains(&needle))
            .collect())
    }

    /// Stops within `radius` of `origin` across the whole network, closest
    /// first, with their owning route.
    pub fn stops_near(
        &self,
        origin: &Coordinate,
        radius: Distance,
    ) -> Result<Vec<(&Route, &Stop, Distance)>, Error> {
        validate_origin(origin)?;
        validate_radius(radius)?;
        Ok(self
            .index
            .query_radius(origin, radius)
            .into_iter()
            .map(|hit| {
                let route = &self.routes[hit.route as usize];
                (route, &route.stops[hit.stop as usize], hit.distance)
            })
            .collect())
    }

    /// Routes whose geometry comes within `radius` of `origin`. Path
    /// vertices count for membership, but the ranking distance is the
    /// closest stop on the route, so a route whose path merely brushes the
    /// origin ranks behind one with a stop actually nearby. Stopless routes
    /// fall back to their closest path vertex. Routes are stored in number
    /// order, so equal distances tie-break on route number ascending.
    pub fn search_near(
        &self,
        origin: &Coordinate,
        radius: Distance,
        limit: usize,
    ) -> Result<Vec<(&Route, Distance)>, Error> {
        validate_origin(origin)?;
        validate_radius(radius)?;
        validate_limit(limit)?;
        let mut ranked: Vec<(&Route, Distance)> = self
            .index
            .query_route_proximity(origin, radius)
            .into_iter()
            .map(|hit| {
                let route = &self.routes[hit.route as usize];
                let distance = route
                    .stops
                    .iter()
                    .map(|stop| origin.distance(&stop.coordinate))
                    .min_by(|a, b| a.total_cmp(b))
                    .unwrap_or(hit.distance);
                (route, distance)
            })
            .collect();
        ranked.sort_by(|(a, dist_a), (b, dist_b)| {
            dist_a.total_cmp(dist_b).then(a.index.cmp(&b.index))
        });
        Ok(ranked.into_iter().take(limit).collect())
    }
}

fn validate_radius(radius: Distance) -> Result<(), Error> {
    if !radius.as_meters().is_finite() || radius.as_meters() <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "radius must be positive, got {}m",
            radius.as_meters()
        )));
    }
    // No silent clamping, an oversized radius is the caller's bug.
    if radius > MAX_SEARCH_RADIUS {
        return Err(Error::InvalidArgument(format!(
            "radius {}m exceeds the {}m cap",
            radius.as_meters(),
            MAX_SEARCH_RADIUS.as_meters()
        )));
    }
    Ok(())
}

fn validate_origin(origin: &Coordinate) -> Result<(), Error> {
    if !origin.in_range() {
        return Err(Error::InvalidArgument(format!(
            "coordinate out of range ({origin})"
        )));
    }
    Ok(())
}

fn validate_limit(limit: usize) -> Result<(), Error> {
    if limit == 0 {
        return Err(Error::InvalidArgument("limit must be at least 1".into()));
    }
    Ok(())
}

/// Copy-and-swap holder for the active [`Network`]. Readers grab the
/// current Arc and run every query against that snapshot; a rebuild swaps
/// the pointer without ever blocking them or exposing a half-built index.
/// Before the first successful load the handle serves an empty network and
/// reports not ready.
#[derive(Debug, Default)]
pub struct NetworkHandle {
    current: RwLock<Arc<Network>>,
    ready: AtomicBool,
}

impl NetworkHandle {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn snapshot(&self) -> Arc<Network> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, network: Network) {
        let network = Arc::new(network);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = network;
        self.ready.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
