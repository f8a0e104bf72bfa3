use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

use csv::Reader;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

mod models;
pub use models::*;

use crate::shared::geo::Coordinate;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Could not find file: {0}")]
    FileNotFound(PathBuf),
    #[error("{0} references unknown route {1}")]
    UnknownRoute(String, String),
}

pub struct Config {
    pub routes_file_name: String,
    pub stops_file_name: String,
    pub shapes_file_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            routes_file_name: "routes.csv".into(),
            stops_file_name: "stops.csv".into(),
            shapes_file_name: "shapes.csv".into(),
        }
    }
}

/// File-backed route store: a directory of CSV files is the collaborator
/// that owns route data. The engine only ever reads the full set and
/// rebuilds its snapshot from it.
pub struct RouteStore {
    dir: PathBuf,
    config: Config,
}

impl RouteStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            config: Config::default(),
        }
    }

    pub fn with_config<P: AsRef<Path>>(dir: P, config: Config) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            config,
        }
    }

    /// Reads and assembles the full route set. `routes.csv` and `stops.csv`
    /// are required, `shapes.csv` is optional. Stops and path vertices are
    /// ordered by their sequence column.
    pub fn load_all_routes(&self) -> Result<Vec<RouteRecord>, Error> {
        let routes: Vec<CsvRoute> = read_csv(&self.dir.join(&self.config.routes_file_name))?;
        let stops: Vec<CsvStop> = read_csv(&self.dir.join(&self.config.stops_file_name))?;

        let shapes_path = self.dir.join(&self.config.shapes_file_name);
        let shapes: Vec<CsvShapePoint> = if shapes_path.exists() {
            read_csv(&shapes_path)?
        } else {
            debug!("no {} in {:?}", self.config.shapes_file_name, self.dir);
            Vec::new()
        };

        let mut records: Vec<RouteRecord> = Vec::with_capacity(routes.len());
        let mut lookup: HashMap<String, usize> = HashMap::new();
        for route in routes {
            lookup.insert(route.route_number.clone(), records.len());
            records.push(RouteRecord {
                number: route.route_number,
                name: route.name,
                active: route.active.is_none_or(|flag| flag != 0),
                stops: Vec::new(),
                path: Vec::new(),
            });
        }

        let mut stop_rows: Vec<(u32, usize, StopRecord)> = Vec::with_capacity(stops.len());
        for stop in stops {
            let index = *lookup.get(&stop.route_number).ok_or_else(|| {
                Error::UnknownRoute(self.config.stops_file_name.clone(), stop.route_number.clone())
            })?;
            stop_rows.push((
                stop.sequence,
                index,
                StopRecord {
                    name: stop.name,
                    coordinate: Coordinate::new(stop.lat, stop.lon),
                    arrival_label: stop.arrival_time,
                },
            ));
        }
        stop_rows.sort_by_key(|(sequence, _, _)| *sequence);
        for (_, index, stop) in stop_rows {
            records[index].stops.push(stop);
        }

        let mut shape_rows: Vec<(u32, usize, Coordinate)> = Vec::with_capacity(shapes.len());
        for point in shapes {
            let index = *lookup.get(&point.route_number).ok_or_else(|| {
                Error::UnknownRoute(
                    self.config.shapes_file_name.clone(),
                    point.route_number.clone(),
                )
            })?;
            shape_rows.push((point.sequence, index, Coordinate::new(point.lat, point.lon)));
        }
        shape_rows.sort_by_key(|(sequence, _, _)| *sequence);
        for (_, index, vertex) in shape_rows {
            records[index].path.push(vertex);
        }

        debug!("loaded {} routes from {:?}", records.len(), self.dir);
        Ok(records)
    }
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, Error> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let mut reader = Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
