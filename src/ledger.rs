// 🅿️ Parking Ledger - parked vehicles + daily revenue counter
//
// Lifecycle of one record:
//   absent → parked (check_in) → [fee quoted, held by the caller] → absent (check_out)
//
// Only parked records and the revenue counter are persisted. A fee quote is
// transient. Checkout removes the record and books the fee in one atomic write.

use crate::error::{ParkingError, Result};
use crate::fee::{duration_minutes, fee_for, minutes_between, round2, TimeOfDay};
use crate::rates::RateTable;
use crate::repository::ParkingRepository;
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::Write;

// ============================================================================
// RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkedVehicle {
    /// Vehicle type name, must match a rate table entry
    #[serde(rename = "type")]
    pub vehicle_type: String,

    /// Plate as entered (trimmed), case preserved
    #[serde(rename = "number")]
    pub plate_number: String,

    /// Check-in time of day, `HH:MM:SS`
    pub time: String,

    /// Full check-in instant; absent on records from older clients
    #[serde(
        rename = "checkedInAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub checked_in_at: Option<DateTime<Local>>,
}

/// What to do when a record's vehicle type has no rate entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTypePolicy {
    /// Refuse with `UnknownVehicleType`
    #[default]
    Reject,

    /// Charge nothing (legacy behaviour)
    ZeroRate,
}

/// How the leaving moment is expressed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Leaving {
    /// Clock time on the day of entry; earlier than entry means zero minutes
    TimeOfDay(TimeOfDay),

    /// Exact instant; multi-day stays are charged in full
    At(DateTime<Local>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeeQuote {
    pub vehicle: ParkedVehicle,
    pub rate: f64,
    pub minutes: i64,
    pub fee: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    pub vehicle: ParkedVehicle,
    pub fee: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub attendant: Option<String>,
    pub parked: usize,
    pub revenue: f64,
}

impl DailySummary {
    pub fn attendant_name(&self) -> &str {
        self.attendant.as_deref().unwrap_or("Guest")
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "type")]
    vehicle_type: &'a str,
    number: &'a str,
    time: &'a str,
    checked_in_at: String,
}

// ============================================================================
// LEDGER
// ============================================================================

#[derive(Clone)]
pub struct Ledger {
    repo: ParkingRepository,
    rates: RateTable,
    policy: UnknownTypePolicy,
}

impl Ledger {
    pub fn new(repo: ParkingRepository, rates: RateTable, policy: UnknownTypePolicy) -> Self {
        Ledger {
            repo,
            rates,
            policy,
        }
    }

    /// Park a vehicle now
    pub fn check_in(&self, vehicle_type: &str, plate_number: &str) -> Result<ParkedVehicle> {
        self.check_in_at(vehicle_type, plate_number, Local::now())
    }

    pub fn check_in_at(
        &self,
        vehicle_type: &str,
        plate_number: &str,
        now: DateTime<Local>,
    ) -> Result<ParkedVehicle> {
        let vehicle_type = vehicle_type.trim();
        if vehicle_type.is_empty() {
            return Err(ParkingError::MissingVehicleType);
        }

        let plate = plate_number.trim();
        if plate.is_empty() {
            return Err(ParkingError::MissingPlateNumber);
        }

        if self.policy == UnknownTypePolicy::Reject {
            self.rates.rate_for(vehicle_type)?;
        }

        let mut vehicles = self.repo.load_vehicles()?;
        if vehicles.iter().any(|v| v.plate_number == plate) {
            warn!("Check-in refused: {} is already parked", plate);
            return Err(ParkingError::DuplicatePlate(plate.to_string()));
        }

        let record = ParkedVehicle {
            vehicle_type: vehicle_type.to_string(),
            plate_number: plate.to_string(),
            time: now.format("%H:%M:%S").to_string(),
            checked_in_at: Some(now),
        };

        vehicles.push(record.clone());
        self.repo.save_vehicles(&vehicles)?;

        info!(
            "Checked in {} ({}) at {}",
            record.plate_number, record.vehicle_type, record.time
        );
        Ok(record)
    }

    /// Currently parked vehicles in check-in order
    pub fn parked(&self) -> Result<Vec<ParkedVehicle>> {
        self.repo.load_vehicles()
    }

    /// First record whose plate equals the trimmed query (case-sensitive)
    pub fn find_by_plate(&self, plate_number: &str) -> Result<ParkedVehicle> {
        let query = plate_number.trim();
        debug!("Looking up plate {:?}", query);

        self.repo
            .load_vehicles()?
            .into_iter()
            .find(|v| v.plate_number == query)
            .ok_or_else(|| ParkingError::VehicleNotFound(query.to_string()))
    }

    /// Fee for leaving at a clock time (`HH:MM`, seconds ignored)
    pub fn compute_fee(&self, record: &ParkedVehicle, leaving_time_of_day: &str) -> Result<f64> {
        let leaving = TimeOfDay::parse(leaving_time_of_day)?;
        Ok(self.quote(record, Leaving::TimeOfDay(leaving))?.fee)
    }

    /// Fee for leaving at an exact instant
    pub fn compute_fee_at(&self, record: &ParkedVehicle, leaving: DateTime<Local>) -> Result<f64> {
        Ok(self.quote(record, Leaving::At(leaving))?.fee)
    }

    /// Rate, billed minutes and fee; no persistence side effect
    pub fn quote(&self, record: &ParkedVehicle, leaving: Leaving) -> Result<FeeQuote> {
        let minutes = match (leaving, record.checked_in_at) {
            (Leaving::At(end), Some(start)) => minutes_between(&start, &end),
            (Leaving::At(end), None) => {
                duration_minutes(TimeOfDay::parse(&record.time)?, TimeOfDay::from_datetime(&end))
            }
            (Leaving::TimeOfDay(end), _) => duration_minutes(TimeOfDay::parse(&record.time)?, end),
        };

        let rate = self.effective_rate(&record.vehicle_type)?;
        let fee = fee_for(rate, minutes);
        if !fee.is_finite() {
            warn!(
                "Fee for {} overflowed: {} min at {}/h",
                record.plate_number, minutes, rate
            );
            return Err(ParkingError::InvalidFee(fee));
        }
        debug!(
            "Quote for {}: {} min at {}/h = {:.2}",
            record.plate_number, minutes, rate, fee
        );

        Ok(FeeQuote {
            vehicle: record.clone(),
            rate,
            minutes,
            fee,
        })
    }

    fn effective_rate(&self, vehicle_type: &str) -> Result<f64> {
        match self.rates.rate_for(vehicle_type) {
            Err(ParkingError::UnknownVehicleType(name))
                if self.policy == UnknownTypePolicy::ZeroRate =>
            {
                warn!("No rate for vehicle type {:?}; charging 0", name);
                Ok(0.0)
            }
            other => other,
        }
    }

    /// Book the fee and remove the record, both or neither
    pub fn check_out(&self, record: &ParkedVehicle, fee: f64) -> Result<CheckoutReceipt> {
        if !fee.is_finite() || fee < 0.0 {
            return Err(ParkingError::InvalidFee(fee));
        }

        let plate = record.plate_number.trim();
        let mut vehicles = self.repo.load_vehicles()?;
        let index = vehicles
            .iter()
            .position(|v| v.plate_number == plate)
            .ok_or_else(|| {
                warn!("Checkout refused: {} is not parked", plate);
                ParkingError::VehicleNotFound(plate.to_string())
            })?;

        let vehicle = vehicles.remove(index);
        let total_revenue = round2(self.repo.load_revenue()? + fee);
        if !total_revenue.is_finite() {
            return Err(ParkingError::InvalidFee(fee));
        }
        self.repo.save_ledger(&vehicles, total_revenue)?;

        info!(
            "Checked out {} for {:.2}; revenue now {:.2}",
            vehicle.plate_number, fee, total_revenue
        );
        Ok(CheckoutReceipt {
            vehicle,
            fee,
            total_revenue,
        })
    }

    pub fn revenue(&self) -> Result<f64> {
        self.repo.load_revenue()
    }

    /// Zero the counter; the caller is responsible for operator confirmation
    pub fn reset_revenue(&self) -> Result<()> {
        self.repo.save_revenue(0.0)?;
        info!("Daily revenue reset");
        Ok(())
    }

    pub fn summary(&self) -> Result<DailySummary> {
        Ok(DailySummary {
            attendant: self.repo.logged_in_user()?,
            parked: self.repo.load_vehicles()?.len(),
            revenue: self.repo.load_revenue()?,
        })
    }

    /// Write parked vehicles as CSV, returns the number of rows
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let vehicles = self.repo.load_vehicles()?;
        let mut wtr = csv::Writer::from_writer(writer);

        for v in &vehicles {
            wtr.serialize(CsvRow {
                vehicle_type: &v.vehicle_type,
                number: &v.plate_number,
                time: &v.time,
                checked_in_at: v
                    .checked_in_at
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_default(),
            })
            .map_err(anyhow::Error::from)?;
        }

        wtr.flush().map_err(anyhow::Error::from)?;
        Ok(vehicles.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{REVENUE_KEY, VEHICLES_KEY};
    use crate::store::{KeyValueStore, MemoryStore};
    use anyhow::anyhow;
    use chrono::TimeZone;
    use std::sync::Arc;

    /// Helper: ledger over a fresh memory store with default rates
    fn setup(policy: UnknownTypePolicy) -> (MemoryStore, Ledger) {
        let store = MemoryStore::new();
        let repo = ParkingRepository::new(Arc::new(store.clone()));
        let rates = RateTable::new(repo.clone());
        rates.initialize().unwrap();
        (store, Ledger::new(repo, rates, policy))
    }

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 5, 14, hour, minute, second)
            .unwrap()
    }

    fn legacy(vehicle_type: &str, plate: &str, time: &str) -> ParkedVehicle {
        ParkedVehicle {
            vehicle_type: vehicle_type.to_string(),
            plate_number: plate.to_string(),
            time: time.to_string(),
            checked_in_at: None,
        }
    }

    #[test]
    fn test_check_in_then_find() {
        let (_, ledger) = setup(UnknownTypePolicy::Reject);

        let record = ledger
            .check_in_at("Motor Car", "  WP CAB-1234 ", at(9, 0, 0))
            .unwrap();
        assert_eq!(record.plate_number, "WP CAB-1234");
        assert_eq!(record.time, "09:00:00");

        let found = ledger.find_by_plate("WP CAB-1234").unwrap();
        assert_eq!(found.vehicle_type, "Motor Car");
        assert_eq!(found.plate_number, "WP CAB-1234");
        assert_eq!(found, record);

        // Query is trimmed as well
        assert!(ledger.find_by_plate(" WP CAB-1234\t").is_ok());
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let (_, ledger) = setup(UnknownTypePolicy::Reject);
        ledger.check_in_at("Motor Bike", "bae-2211", at(8, 0, 0)).unwrap();

        assert!(matches!(
            ledger.find_by_plate("BAE-2211"),
            Err(ParkingError::VehicleNotFound(_))
        ));
    }

    #[test]
    fn test_check_in_validation_writes_nothing() {
        let (store, ledger) = setup(UnknownTypePolicy::Reject);

        assert!(matches!(
            ledger.check_in("", "ABC-1"),
            Err(ParkingError::MissingVehicleType)
        ));
        assert!(matches!(
            ledger.check_in("Motor Car", "   "),
            Err(ParkingError::MissingPlateNumber)
        ));
        assert!(matches!(
            ledger.check_in("Hovercraft", "ABC-1"),
            Err(ParkingError::UnknownVehicleType(_))
        ));

        assert_eq!(store.get(VEHICLES_KEY).unwrap(), None);
    }

    #[test]
    fn test_duplicate_plate_rejected_while_parked() {
        let (_, ledger) = setup(UnknownTypePolicy::Reject);
        ledger.check_in_at("Motor Car", "CAR-1", at(9, 0, 0)).unwrap();

        assert!(matches!(
            ledger.check_in_at("Motor Bike", "CAR-1", at(9, 30, 0)),
            Err(ParkingError::DuplicatePlate(_))
        ));
        assert_eq!(ledger.parked().unwrap().len(), 1);

        // Once it leaves, the same plate may enter again
        let record = ledger.find_by_plate("CAR-1").unwrap();
        ledger.check_out(&record, 0.0).unwrap();
        assert!(ledger.check_in_at("Motor Car", "CAR-1", at(11, 0, 0)).is_ok());
    }

    #[test]
    fn test_compute_fee_examples() {
        let (_, ledger) = setup(UnknownTypePolicy::Reject);
        let record = ledger.check_in_at("Motor Car", "CAR-1", at(9, 0, 42)).unwrap();

        assert_eq!(ledger.compute_fee(&record, "10:30").unwrap(), 75.0);
        assert_eq!(ledger.compute_fee(&record, "10:30:59").unwrap(), 75.0);
        assert_eq!(ledger.compute_fee(&record, "08:30").unwrap(), 0.0);
        assert_eq!(ledger.compute_fee(&record, "09:00").unwrap(), 0.0);

        assert!(matches!(
            ledger.compute_fee(&record, "half past ten"),
            Err(ParkingError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_compute_fee_has_no_side_effect() {
        let (store, ledger) = setup(UnknownTypePolicy::Reject);
        let record = ledger.check_in_at("Heavy Vehicle", "BUS-7", at(6, 0, 0)).unwrap();
        let before = store.get(VEHICLES_KEY).unwrap();

        assert_eq!(ledger.compute_fee(&record, "07:15").unwrap(), 125.0);
        assert_eq!(store.get(VEHICLES_KEY).unwrap(), before);
        assert_eq!(store.get(REVENUE_KEY).unwrap(), None);
    }

    #[test]
    fn test_compute_fee_uses_current_rate() {
        let (store, ledger) = setup(UnknownTypePolicy::Reject);
        let record = ledger.check_in_at("Three Wheel", "TW-5", at(10, 0, 0)).unwrap();

        let rates = RateTable::new(ParkingRepository::new(Arc::new(store)));
        rates.set_rate("Three Wheel", 60.0).unwrap();

        assert_eq!(ledger.compute_fee(&record, "10:30").unwrap(), 30.0);
    }

    #[test]
    fn test_compute_fee_at_spans_midnight() {
        let (_, ledger) = setup(UnknownTypePolicy::Reject);
        let entered = Local.with_ymd_and_hms(2026, 5, 14, 22, 0, 0).unwrap();
        let left = Local.with_ymd_and_hms(2026, 5, 16, 0, 30, 0).unwrap();
        let record = ledger.check_in_at("Motor Bike", "MB-9", entered).unwrap();

        // 26h30m at 20/h
        assert_eq!(ledger.compute_fee_at(&record, left).unwrap(), 530.0);
        // the clock-face variant clamps instead
        assert_eq!(ledger.compute_fee(&record, "00:30").unwrap(), 0.0);

        let quote = ledger.quote(&record, Leaving::At(left)).unwrap();
        assert_eq!(quote.minutes, 26 * 60 + 30);
        assert_eq!(quote.rate, 20.0);
    }

    #[test]
    fn test_compute_fee_at_legacy_record_uses_clock_face() {
        let (_, ledger) = setup(UnknownTypePolicy::Reject);
        let record = legacy("Motor Car", "OLD-1", "9:00:00 AM");

        assert_eq!(ledger.compute_fee_at(&record, at(10, 30, 0)).unwrap(), 75.0);
    }

    #[test]
    fn test_unknown_type_policies() {
        let record = legacy("Tractor", "TR-1", "09:00:00");

        let (_, strict) = setup(UnknownTypePolicy::Reject);
        assert!(matches!(
            strict.compute_fee(&record, "10:00"),
            Err(ParkingError::UnknownVehicleType(_))
        ));

        let (_, lenient) = setup(UnknownTypePolicy::ZeroRate);
        assert_eq!(lenient.compute_fee(&record, "10:00").unwrap(), 0.0);
        assert!(lenient.check_in("Tractor", "TR-2").is_ok());
    }

    #[test]
    fn test_check_out_books_fee_and_removes_one_record() {
        let (_, ledger) = setup(UnknownTypePolicy::Reject);
        ledger.check_in_at("Motor Car", "CAR-1", at(9, 0, 0)).unwrap();
        ledger.check_in_at("Motor Bike", "MB-2", at(9, 10, 0)).unwrap();

        let record = ledger.find_by_plate("CAR-1").unwrap();
        let fee = ledger.compute_fee(&record, "10:30").unwrap();
        let receipt = ledger.check_out(&record, fee).unwrap();

        assert_eq!(receipt.fee, 75.0);
        assert_eq!(receipt.total_revenue, 75.0);
        assert_eq!(ledger.revenue().unwrap(), 75.0);

        let parked = ledger.parked().unwrap();
        assert_eq!(parked.len(), 1);
        assert_eq!(parked[0].plate_number, "MB-2");

        // Second checkout of the same plate changes nothing
        assert!(matches!(
            ledger.check_out(&record, fee),
            Err(ParkingError::VehicleNotFound(_))
        ));
        assert!(matches!(
            ledger.find_by_plate("CAR-1"),
            Err(ParkingError::VehicleNotFound(_))
        ));
        assert_eq!(ledger.revenue().unwrap(), 75.0);
        assert_eq!(ledger.parked().unwrap().len(), 1);
    }

    #[test]
    fn test_revenue_accumulates_in_cents() {
        let (store, ledger) = setup(UnknownTypePolicy::Reject);
        for (i, fee) in [0.1, 0.2, 12.35].iter().enumerate() {
            let record = ledger
                .check_in_at("Motor Car", &format!("C-{}", i), at(9, 0, 0))
                .unwrap();
            ledger.check_out(&record, *fee).unwrap();
        }

        assert_eq!(ledger.revenue().unwrap(), 12.65);
        assert_eq!(store.get(REVENUE_KEY).unwrap().as_deref(), Some("12.65"));
    }

    #[test]
    fn test_check_out_rejects_bad_fee() {
        let (_, ledger) = setup(UnknownTypePolicy::Reject);
        let record = ledger.check_in("Motor Car", "CAR-1").unwrap();

        for fee in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                ledger.check_out(&record, fee),
                Err(ParkingError::InvalidFee(_))
            ));
        }
        assert_eq!(ledger.parked().unwrap().len(), 1);
        assert_eq!(ledger.revenue().unwrap(), 0.0);
    }

    /// Store whose batch writes always fail
    struct FailingBatchStore(MemoryStore);

    impl KeyValueStore for FailingBatchStore {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.0.set(key, value)
        }

        fn set_many(&self, _entries: &[(&str, String)]) -> anyhow::Result<()> {
            Err(anyhow!("disk full"))
        }
    }

    #[test]
    fn test_failed_checkout_leaves_ledger_untouched() {
        let inner = MemoryStore::new();
        let repo = ParkingRepository::new(Arc::new(FailingBatchStore(inner.clone())));
        let rates = RateTable::new(repo.clone());
        rates.initialize().unwrap();
        let ledger = Ledger::new(repo, rates, UnknownTypePolicy::Reject);

        let record = ledger.check_in_at("Motor Car", "CAR-1", at(9, 0, 0)).unwrap();
        let result = ledger.check_out(&record, 75.0);

        assert!(matches!(result, Err(ParkingError::PersistenceFailure(_))));
        assert_eq!(ledger.revenue().unwrap(), 0.0);
        assert_eq!(ledger.find_by_plate("CAR-1").unwrap(), record);
    }

    #[test]
    fn test_reset_revenue_is_idempotent() {
        let (store, ledger) = setup(UnknownTypePolicy::Reject);
        let record = ledger.check_in_at("Dual Purpose", "DP-1", at(9, 0, 0)).unwrap();
        ledger.check_out(&record, 140.0).unwrap();

        ledger.reset_revenue().unwrap();
        assert_eq!(ledger.revenue().unwrap(), 0.0);
        assert_eq!(store.get(REVENUE_KEY).unwrap().as_deref(), Some("0"));

        ledger.reset_revenue().unwrap();
        assert_eq!(ledger.revenue().unwrap(), 0.0);
    }

    #[test]
    fn test_summary() {
        let (store, ledger) = setup(UnknownTypePolicy::Reject);
        let summary = ledger.summary().unwrap();
        assert_eq!(summary.attendant_name(), "Guest");
        assert_eq!(summary.parked, 0);

        store.set("loggedInUser", "Nimal").unwrap();
        ledger.check_in("Motor Car", "CAR-1").unwrap();
        let record = ledger.check_in("Motor Bike", "MB-1").unwrap();
        ledger.check_out(&record, 20.0).unwrap();

        let summary = ledger.summary().unwrap();
        assert_eq!(summary.attendant_name(), "Nimal");
        assert_eq!(summary.parked, 1);
        assert_eq!(summary.revenue, 20.0);
    }

    #[test]
    fn test_export_csv() {
        let (_, ledger) = setup(UnknownTypePolicy::Reject);
        ledger.check_in_at("Motor Car", "WP CAB-1234", at(9, 0, 0)).unwrap();
        ledger.check_in_at("Motor Bike", "BAE-22", at(9, 15, 30)).unwrap();

        let mut out = Vec::new();
        let rows = ledger.export_csv(&mut out).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "type,number,time,checked_in_at");
        assert!(lines[1].starts_with("Motor Car,WP CAB-1234,09:00:00,"));
        assert!(lines[2].starts_with("Motor Bike,BAE-22,09:15:30,"));
    }

    #[test]
    fn test_overflowing_fee_is_refused_before_checkout() {
        let (store, ledger) = setup(UnknownTypePolicy::Reject);
        ledger.rates.set_rate("Motor Car", 1e308).unwrap();
        let record = ledger.check_in_at("Motor Car", "HUGE-1", at(8, 0, 0)).unwrap();

        let result = ledger.compute_fee_at(&record, at(18, 0, 0));
        assert!(matches!(result, Err(ParkingError::InvalidFee(f)) if f.is_infinite()));

        // Record stays parked and can still leave once the rate is fixed
        assert_eq!(ledger.parked().unwrap().len(), 1);
        ledger.rates.set_rate("Motor Car", 50.0).unwrap();
        let fee = ledger.compute_fee_at(&record, at(18, 0, 0)).unwrap();
        assert_eq!(fee, 500.0);
        ledger.check_out(&record, fee).unwrap();
        assert!(ledger.parked().unwrap().is_empty());
        assert_eq!(store.get(REVENUE_KEY).unwrap().unwrap(), "500");
    }
}
