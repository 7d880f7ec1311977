// 💰 Rate Table Manager - hourly rate per vehicle type
//
// The vehicle type name doubles as its identifier. Entries are seeded once,
// their rates edited afterwards, never deleted.

use crate::error::{ParkingError, Result};
use crate::repository::ParkingRepository;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    /// Icon name shown next to the type (FontAwesome naming)
    pub icon: String,

    /// Vehicle type identifier and display name
    pub name: String,

    /// Charge per hour, never negative
    pub rate: f64,
}

impl RateEntry {
    pub fn new(icon: &str, name: &str, rate: f64) -> Self {
        RateEntry {
            icon: icon.to_string(),
            name: name.to_string(),
            rate,
        }
    }
}

/// The six vehicle types seeded on first run
pub fn default_rates() -> Vec<RateEntry> {
    vec![
        RateEntry::new("motorcycle", "Motor Bike", 20.0),
        RateEntry::new("taxi", "Three Wheel", 30.0),
        RateEntry::new("car", "Motor Car", 50.0),
        RateEntry::new("truck", "Dual Purpose", 70.0),
        RateEntry::new("bus", "Heavy Vehicle", 100.0),
        RateEntry::new("bicycle", "Foot Bikes", 0.0),
    ]
}

/// Parse operator input into a rate: finite and non-negative
pub fn parse_rate(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    let rate: f64 = trimmed
        .parse()
        .map_err(|_| ParkingError::InvalidRateInput(input.to_string()))?;
    validate_rate(rate).map_err(|_| ParkingError::InvalidRateInput(input.to_string()))
}

fn validate_rate(rate: f64) -> Result<f64> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(ParkingError::InvalidRateInput(rate.to_string()));
    }
    // -0.0 passes the sign check; store it as 0
    Ok(rate.abs())
}

#[derive(Clone)]
pub struct RateTable {
    repo: ParkingRepository,
}

impl RateTable {
    pub fn new(repo: ParkingRepository) -> Self {
        RateTable { repo }
    }

    /// Seed the defaults when no table is stored; an existing table is left untouched
    pub fn initialize(&self) -> Result<Vec<RateEntry>> {
        if let Some(existing) = self.repo.load_rates()? {
            debug!("Rate table already present ({} entries)", existing.len());
            return Ok(existing);
        }

        let defaults = default_rates();
        self.repo.save_rates(&defaults)?;
        info!("Seeded rate table with {} default vehicle types", defaults.len());
        Ok(defaults)
    }

    /// Entries in stored order; empty before `initialize`
    pub fn get_all(&self) -> Result<Vec<RateEntry>> {
        Ok(self.repo.load_rates()?.unwrap_or_default())
    }

    pub fn find(&self, vehicle_type: &str) -> Result<Option<RateEntry>> {
        Ok(self
            .get_all()?
            .into_iter()
            .find(|entry| entry.name == vehicle_type))
    }

    pub fn rate_for(&self, vehicle_type: &str) -> Result<f64> {
        self.find(vehicle_type)?
            .map(|entry| entry.rate)
            .ok_or_else(|| ParkingError::UnknownVehicleType(vehicle_type.to_string()))
    }

    /// Update from operator text; nothing is written when the input is rejected
    pub fn update_rate(&self, vehicle_type: &str, input: &str) -> Result<RateEntry> {
        let rate = match parse_rate(input) {
            Ok(rate) => rate,
            Err(e) => {
                warn!("Rejected rate {:?} for {}", input, vehicle_type);
                return Err(e);
            }
        };
        self.set_rate(vehicle_type, rate)
    }

    /// Replace one entry's rate and persist the whole table
    pub fn set_rate(&self, vehicle_type: &str, rate: f64) -> Result<RateEntry> {
        let rate = validate_rate(rate)?;

        let mut rates = self.get_all()?;
        let entry = rates
            .iter_mut()
            .find(|entry| entry.name == vehicle_type)
            .ok_or_else(|| ParkingError::UnknownVehicleType(vehicle_type.to_string()))?;

        let previous = entry.rate;
        entry.rate = rate;
        let updated = entry.clone();

        self.repo.save_rates(&rates)?;
        info!("Rate for {} changed {} → {}", vehicle_type, previous, rate);
        Ok(updated)
    }
}
