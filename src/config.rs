// ⚙️ Configuration - environment variables with sensible defaults
//
// PARKING_DB_PATH       SQLite file backing the key-value store
// PARKING_BIND_ADDR     address for the API server
// PARKING_CURRENCY      label printed before amounts
// PARKING_LOT_NAME      shown on the profile summary
// PARKING_UNKNOWN_TYPE  "reject" (default) or "zero"

use crate::error::{ParkingError, Result};
use crate::ledger::UnknownTypePolicy;
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "parking.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_CURRENCY: &str = "Rs.";
pub const DEFAULT_LOT_NAME: &str = "Park and Ride Kadawatha";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub bind_addr: String,
    pub currency: String,
    pub lot_name: String,
    pub unknown_type_policy: UnknownTypePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            lot_name: DEFAULT_LOT_NAME.to_string(),
            unknown_type_policy: UnknownTypePolicy::Reject,
        }
    }
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with("PARKING_"))
            .collect();
        Self::from_vars(&vars)
    }

    /// Build from an explicit variable map (keeps tests away from the real environment)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = non_empty(vars, "PARKING_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(addr) = non_empty(vars, "PARKING_BIND_ADDR") {
            config.bind_addr = addr.to_string();
        }
        if let Some(currency) = non_empty(vars, "PARKING_CURRENCY") {
            config.currency = currency.to_string();
        }
        if let Some(name) = non_empty(vars, "PARKING_LOT_NAME") {
            config.lot_name = name.to_string();
        }
        if let Some(policy) = non_empty(vars, "PARKING_UNKNOWN_TYPE") {
            config.unknown_type_policy = match policy.to_lowercase().as_str() {
                "reject" | "strict" => UnknownTypePolicy::Reject,
                "zero" | "zero-rate" | "lenient" => UnknownTypePolicy::ZeroRate,
                other => {
                    return Err(ParkingError::Config(format!(
                        "PARKING_UNKNOWN_TYPE must be 'reject' or 'zero', got {:?}",
                        other
                    )))
                }
            };
        }

        Ok(config)
    }

    /// Format an amount with the configured currency label, two decimals
    pub fn money(&self, amount: f64) -> String {
        format!("{} {:.2}", self.currency, amount)
    }
}

fn non_empty<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_environment_empty() {
        let config = Config::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.db_path, PathBuf::from("parking.db"));
        assert_eq!(config.unknown_type_policy, UnknownTypePolicy::Reject);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(&vars(&[
            ("PARKING_DB_PATH", "/tmp/lot.db"),
            ("PARKING_BIND_ADDR", "127.0.0.1:8080"),
            ("PARKING_CURRENCY", "LKR"),
            ("PARKING_UNKNOWN_TYPE", "zero"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/lot.db"));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.currency, "LKR");
        assert_eq!(config.lot_name, DEFAULT_LOT_NAME);
        assert_eq!(config.unknown_type_policy, UnknownTypePolicy::ZeroRate);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = Config::from_vars(&vars(&[("PARKING_DB_PATH", "   ")])).unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn test_bad_policy_rejected() {
        let result = Config::from_vars(&vars(&[("PARKING_UNKNOWN_TYPE", "maybe")]));
        assert!(matches!(result, Err(ParkingError::Config(_))));
    }

    #[test]
    fn test_money_format() {
        let config = Config::default();
        assert_eq!(config.money(75.0), "Rs. 75.00");
        assert_eq!(config.money(12.5), "Rs. 12.50");
        assert_eq!(config.money(0.0), "Rs. 0.00");
    }
}
