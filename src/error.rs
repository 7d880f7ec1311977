// ⚠️ Error kinds for the parking core
// Validation errors are raised before any mutation; persistence errors wrap the store failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParkingError {
    #[error("invalid rate input: {0:?} (expected a non-negative number)")]
    InvalidRateInput(String),

    #[error("please select a vehicle type")]
    MissingVehicleType,

    #[error("please enter a vehicle number")]
    MissingPlateNumber,

    #[error("vehicle not found: {0}")]
    VehicleNotFound(String),

    #[error("unknown vehicle type: {0}")]
    UnknownVehicleType(String),

    #[error("vehicle {0} is already parked")]
    DuplicatePlate(String),

    #[error("invalid time {0:?} (expected HH:MM)")]
    InvalidTime(String),

    #[error("invalid fee: {0}")]
    InvalidFee(f64),

    #[error("stored value for {key:?} is unreadable: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("persistence failure: {0:#}")]
    PersistenceFailure(#[from] anyhow::Error),
}

impl ParkingError {
    /// True for errors caused by operator input rather than storage
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ParkingError::InvalidRateInput(_)
                | ParkingError::MissingVehicleType
                | ParkingError::MissingPlateNumber
                | ParkingError::UnknownVehicleType(_)
                | ParkingError::InvalidTime(_)
                | ParkingError::InvalidFee(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ParkingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(ParkingError::MissingPlateNumber.is_validation());
        assert!(ParkingError::InvalidTime("25:00".to_string()).is_validation());
        assert!(!ParkingError::VehicleNotFound("ABC".to_string()).is_validation());
        assert!(!ParkingError::PersistenceFailure(anyhow::anyhow!("disk full")).is_validation());
    }

    #[test]
    fn test_persistence_message_keeps_cause() {
        let err: ParkingError = anyhow::anyhow!("database is locked").into();
        assert!(err.to_string().contains("database is locked"));
    }
}
