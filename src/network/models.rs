use std::sync::Arc;

use crate::shared::{Identifiable, geo::Coordinate};

#[derive(Debug, Default, Clone)]
pub struct Stop {
    pub name: Arc<str>,
    pub normalized_name: Arc<str>,
    pub coordinate: Coordinate,
    pub arrival_label: Option<Arc<str>>,
}

#[derive(Debug, Default, Clone)]
pub struct Route {
    pub index: u32,
    /// Route number, unique across the network. Doubles as the identifier.
    pub number: Arc<str>,
    pub name: Arc<str>,
    pub normalized_name: Arc<str>,
    pub stops: Box<[Stop]>,
    pub path: Box<[Coordinate]>,
    pub active: bool,
}

impl Identifiable for Route {
    fn id(&self) -> &str {
        &self.number
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn normalized_name(&self) -> &str {
        &self.normalized_name
    }
}
