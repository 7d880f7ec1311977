// 🏁 Parking Lot - wires store, repository, rate table and ledger together

use crate::config::Config;
use crate::error::Result;
use crate::ledger::{Ledger, UnknownTypePolicy};
use crate::rates::RateTable;
use crate::repository::ParkingRepository;
use crate::store::{KeyValueStore, SqliteStore};
use log::info;
use std::sync::Arc;

#[derive(Clone)]
pub struct ParkingLot {
    pub rates: RateTable,
    pub ledger: Ledger,
}

impl ParkingLot {
    /// Open the configured SQLite store and seed rates on first run
    pub fn open(config: &Config) -> Result<Self> {
        let store = SqliteStore::open(&config.db_path)?;
        info!("Opened parking store at {}", config.db_path.display());
        Self::with_store(Arc::new(store), config.unknown_type_policy)
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>, policy: UnknownTypePolicy) -> Result<Self> {
        let repo = ParkingRepository::new(store);
        let rates = RateTable::new(repo.clone());
        rates.initialize()?;
        let ledger = Ledger::new(repo, rates.clone(), policy);
        Ok(ParkingLot { rates, ledger })
    }
}
