use std::sync::atomic::{AtomicBool, Ordering};

use buswatch::{
    fleet::{self, Fleet},
    network::{Network, NetworkHandle},
    store::RouteStore,
};

use crate::hub::Hub;

pub struct AppState {
    pub network: NetworkHandle,
    pub fleet: Fleet,
    pub hub: Hub,
    pub store: RouteStore,
    degraded: AtomicBool,
}

impl AppState {
    pub fn new(store: RouteStore) -> Self {
        Self {
            network: NetworkHandle::new(),
            fleet: Fleet::new(fleet::Config::default()),
            hub: Hub::new(),
            store,
            degraded: AtomicBool::new(false),
        }
    }

    /// Loads the full route set from the store, builds a fresh snapshot off
    /// to the side and swaps it in. On failure the last-known-good snapshot
    /// keeps serving and the health endpoint reports degraded.
    pub fn reload_network(&self) -> Result<usize, buswatch::Error> {
        let result = self
            .store
            .load_all_routes()
            .map_err(buswatch::Error::from)
            .and_then(Network::from_records);
        match result {
            Ok(network) => {
                let count = network.routes().len();
                self.network.replace(network);
                self.degraded.store(false, Ordering::Relaxed);
                Ok(count)
            }
            Err(err) => {
                self.degraded.store(true, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }
}
