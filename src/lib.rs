// Park and Ride - Core Library
// Rate table + parking ledger over a key-value store, shared by the console and the API server

pub mod config;
pub mod error;
pub mod store;
pub mod repository;
pub mod fee;
pub mod rates;
pub mod ledger;
pub mod lot;

// Re-export commonly used types
pub use config::Config;
pub use error::{ParkingError, Result};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use repository::ParkingRepository;
pub use fee::{fee_for, TimeOfDay};
pub use rates::{default_rates, RateEntry, RateTable};
pub use ledger::{
    CheckoutReceipt, DailySummary, FeeQuote, Leaving, Ledger, ParkedVehicle, UnknownTypePolicy,
};
pub use lot::ParkingLot;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
