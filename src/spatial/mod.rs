use std::collections::HashMap;

use rayon::prelude::*;

use crate::{
    network::Route,
    shared::geo::{CELL_SIZE, Coordinate, Distance},
};

/// A point pulled out of route geometry. `stop` carries the stop index for
/// stop points and is None for path vertices.
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    route: u32,
    stop: Option<u32>,
    coordinate: Coordinate,
}

/// Grid-bucket index over every stop point and path vertex in the network.
/// Built once per route data set and never mutated; swapping in a rebuilt
/// index is the caller's job. Query cost is the cells covered by the radius
/// plus the matches, independent of total point count.
#[derive(Debug, Default, Clone)]
pub struct SpatialIndex {
    cells: HashMap<(i32, i32), Box<[IndexedPoint]>>,
    points: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct StopHit {
    pub route: u32,
    pub stop: u32,
    pub distance: Distance,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteHit {
    pub route: u32,
    pub distance: Distance,
}

impl SpatialIndex {
    pub fn build(routes: &[Route]) -> Self {
        let mut cells: HashMap<(i32, i32), Vec<IndexedPoint>> = HashMap::new();
        let mut points = 0;
        let mut push = |point: IndexedPoint| {
            cells
                .entry(point.coordinate.to_grid())
                .or_default()
                .push(point);
        };
        for (route_idx, route) in routes.iter().enumerate() {
            for (stop_idx, stop) in route.stops.iter().enumerate() {
                push(IndexedPoint {
                    route: route_idx as u32,
                    stop: Some(stop_idx as u32),
                    coordinate: stop.coordinate,
                });
                points += 1;
            }
            for vertex in route.path.iter() {
                push(IndexedPoint {
                    route: route_idx as u32,
                    stop: None,
                    coordinate: *vertex,
                });
                points += 1;
            }
        }
        let cells = cells
            .into_iter()
            .map(|(cell, bucket)| (cell, bucket.into()))
            .collect();
        Self { cells, points }
    }

    pub fn len(&self) -> usize {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points == 0
    }

    /// Stops within `radius` of `origin`, closest first. Candidate cells are
    /// walked from the grid, then filtered by exact great-circle distance.
    pub fn query_radius(&self, origin: &Coordinate, radius: Distance) -> Vec<StopHit> {
        let mut hits: Vec<StopHit> = self
            .candidates(origin, radius)
            .filter_map(|point| {
                let stop = point.stop?;
                let distance = origin.distance(&point.coordinate);
                (distance <= radius).then_some(StopHit {
                    route: point.route,
                    stop,
                    distance,
                })
            })
            .collect();
        hits.par_sort_unstable_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Routes whose stops or path vertices come within `radius`, each with
    /// its closest indexed point distance. This decides membership only;
    /// user-facing ranking happens over stop distances at the network
    /// layer. Ordered by point distance, route index breaking ties.
    pub fn query_route_proximity(&self, origin: &Coordinate, radius: Distance) -> Vec<RouteHit> {
        let mut nearest: HashMap<u32, Distance> = HashMap::new();
        for point in self.candidates(origin, radius) {
            let distance = origin.distance(&point.coordinate);
            if distance > radius {
                continue;
            }
            nearest
                .entry(point.route)
                .and_modify(|best| {
                    if distance < *best {
                        *best = distance;
                    }
                })
                .or_insert(distance);
        }
        let mut hits: Vec<RouteHit> = nearest
            .into_iter()
            .map(|(route, distance)| RouteHit { route, distance })
            .collect();
        hits.par_sort_unstable_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.route.cmp(&b.route))
        });
        hits
    }

    fn candidates(
        &self,
        origin: &Coordinate,
        radius: Distance,
    ) -> impl Iterator<Item = &IndexedPoint> {
        let reach = (radius / CELL_SIZE).as_meters().ceil().abs() as i32;
        let (origin_x, origin_y) = origin.to_grid();
        (-reach..=reach).flat_map(move |x| {
            (-reach..=reach)
                .filter_map(move |y| self.cells.get(&(origin_x + x, origin_y + y)))
                .flat_map(|bucket| bucket.iter())
        })
    }
}
