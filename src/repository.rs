// 📦 Parking Repository - typed access to the persisted layout
//
// parkingRates  → JSON array of { icon, name, rate }
// vehicles      → JSON array of { type, number, time, checkedInAt? }
// totalRevenue  → plain decimal string, not JSON-wrapped
// loggedInUser  → written by the login flow, only read here

use crate::error::{ParkingError, Result};
use crate::ledger::ParkedVehicle;
use crate::rates::RateEntry;
use crate::store::KeyValueStore;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub const RATES_KEY: &str = "parkingRates";
pub const VEHICLES_KEY: &str = "vehicles";
pub const REVENUE_KEY: &str = "totalRevenue";
pub const LOGGED_IN_USER_KEY: &str = "loggedInUser";

#[derive(Clone)]
pub struct ParkingRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ParkingRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        ParkingRepository { store }
    }

    // ========================================================================
    // RATE TABLE
    // ========================================================================

    /// `None` until the table has been seeded
    pub fn load_rates(&self) -> Result<Option<Vec<RateEntry>>> {
        match self.store.get(RATES_KEY)? {
            Some(json) => Ok(Some(decode_json(RATES_KEY, &json)?)),
            None => Ok(None),
        }
    }

    pub fn save_rates(&self, rates: &[RateEntry]) -> Result<()> {
        let json = serde_json::to_string(rates).map_err(anyhow::Error::from)?;
        self.store.set(RATES_KEY, &json)?;
        Ok(())
    }

    // ========================================================================
    // LEDGER
    // ========================================================================

    pub fn load_vehicles(&self) -> Result<Vec<ParkedVehicle>> {
        match self.store.get(VEHICLES_KEY)? {
            Some(json) => decode_json(VEHICLES_KEY, &json),
            None => Ok(Vec::new()),
        }
    }

    pub fn save_vehicles(&self, vehicles: &[ParkedVehicle]) -> Result<()> {
        let json = serde_json::to_string(vehicles).map_err(anyhow::Error::from)?;
        self.store.set(VEHICLES_KEY, &json)?;
        Ok(())
    }

    pub fn load_revenue(&self) -> Result<f64> {
        match self.store.get(REVENUE_KEY)? {
            Some(text) => parse_revenue(&text),
            None => Ok(0.0),
        }
    }

    pub fn save_revenue(&self, revenue: f64) -> Result<()> {
        self.store.set(REVENUE_KEY, &format_revenue(revenue))?;
        Ok(())
    }

    /// Vehicle list and revenue counter in one atomic write
    pub fn save_ledger(&self, vehicles: &[ParkedVehicle], revenue: f64) -> Result<()> {
        let json = serde_json::to_string(vehicles).map_err(anyhow::Error::from)?;
        self.store.set_many(&[
            (VEHICLES_KEY, json),
            (REVENUE_KEY, format_revenue(revenue)),
        ])?;
        Ok(())
    }

    // ========================================================================
    // SESSION
    // ========================================================================

    pub fn logged_in_user(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(LOGGED_IN_USER_KEY)?
            .map(|user| user.trim().to_string())
            .filter(|user| !user.is_empty()))
    }
}

fn decode_json<T: DeserializeOwned>(key: &str, json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| ParkingError::CorruptRecord {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Shortest decimal form: 75.0 → "75", 75.5 → "75.5"
pub fn format_revenue(revenue: f64) -> String {
    format!("{}", revenue)
}

pub fn parse_revenue(text: &str) -> Result<f64> {
    let corrupt = |reason: &str| ParkingError::CorruptRecord {
        key: REVENUE_KEY.to_string(),
        reason: reason.to_string(),
    };

    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| corrupt(&format!("{:?} is not a number", text)))?;

    if !value.is_finite() || value < 0.0 {
        return Err(corrupt(&format!("{:?} is not a non-negative amount", text)));
    }

    Ok(value)
}
