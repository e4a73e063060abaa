//! Garage configuration
//!
//! Loaded from a JSON file and/or environment variables:
//!
//! ```json
//! {
//!   "central": {
//!     "host": "127.0.0.1",
//!     "port": 8080,
//!     "rate_per_minute": 0.15,
//!     "minimum_fee": 2.0,
//!     "journal_dir": "./garage-journal"
//!   },
//!   "lanes": {
//!     "min_confidence": 0.8,
//!     "total_slots": 8,
//!     "slot_policy": "plate_bound",
//!     "mode": "simulation"
//!   }
//! }
//! ```
//!
//! Every field is optional. Environment variables override the file:
//!
//! | Variable | Field |
//! |---|---|
//! | `CENTRAL_HOST` | `central.host` |
//! | `CENTRAL_PORT` | `central.port` |
//! | `DB_PATH` | `central.journal_dir` |
//! | `PRECO_POR_MINUTO` | `central.rate_per_minute` |
//! | `VALOR_MINIMO` | `central.minimum_fee` |
//! | `LPR_CONFIDENCE_MIN` | `lanes.min_confidence` |
//! | `TOTAL_VAGAS` | `lanes.total_slots` |
//! | `MODE` | `lanes.mode` |

use garage_core::{BillingConfig, DEFAULT_FLOOR, Floor, Money};
use garage_gateway::ClientConfig;
use garage_lane::{LaneConfig, SlotPolicy};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Root configuration shared by both binaries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GarageConfig {
    #[serde(default)]
    pub central: CentralConfig,
    #[serde(default)]
    pub lanes: LanesConfig,
}

/// Central authority settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralConfig {
    /// Address the server binds and the lanes connect to
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(
        default = "default_rate_per_minute",
        with = "rust_decimal::serde::float"
    )]
    pub rate_per_minute: Money,
    #[serde(default = "default_minimum_fee", with = "rust_decimal::serde::float")]
    pub minimum_fee: Money,
    /// Floor targeted by the block/unblock commands
    #[serde(default = "default_floor")]
    pub blocked_floor: Floor,
    /// Journal directory; the in-memory store is used when absent
    #[serde(default)]
    pub journal_dir: Option<PathBuf>,
    /// Period of the stats log line
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
    /// Silence allowed on a connection before its request line
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// Where the lane devices come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMode {
    /// Randomized simulated devices
    #[default]
    Simulation,
    /// Register-mapped devices on a field bus
    Hardware,
}

impl FromStr for DeviceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulation" => Ok(DeviceMode::Simulation),
            "hardware" => Ok(DeviceMode::Hardware),
            other => Err(ConfigError::InvalidValue {
                key: "MODE".to_string(),
                reason: format!("unknown mode '{other}' (expected simulation or hardware)"),
            }),
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceMode::Simulation => write!(f, "simulation"),
            DeviceMode::Hardware => write!(f, "hardware"),
        }
    }
}

/// Ground-floor lane settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanesConfig {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_passage_timeout_ms")]
    pub passage_timeout_ms: u64,
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_floor")]
    pub floor: Floor,
    #[serde(default = "default_total_slots")]
    pub total_slots: usize,
    #[serde(default)]
    pub slot_policy: SlotPolicy,
    #[serde(default)]
    pub mode: DeviceMode,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_rate_per_minute() -> Money {
    BillingConfig::default().rate_per_minute
}

fn default_minimum_fee() -> Money {
    BillingConfig::default().minimum_fee
}

fn default_floor() -> Floor {
    DEFAULT_FLOOR.to_string()
}

fn default_stats_interval_secs() -> u64 {
    300
}

fn default_read_timeout_ms() -> u64 {
    5_000
}

fn default_min_confidence() -> f64 {
    0.8
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_passage_timeout_ms() -> u64 {
    10_000
}

fn default_error_backoff_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_total_slots() -> usize {
    8
}

impl Default for CentralConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rate_per_minute: default_rate_per_minute(),
            minimum_fee: default_minimum_fee(),
            blocked_floor: default_floor(),
            journal_dir: None,
            stats_interval_secs: default_stats_interval_secs(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Default for LanesConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            request_timeout_ms: default_request_timeout_ms(),
            passage_timeout_ms: default_passage_timeout_ms(),
            error_backoff_ms: default_error_backoff_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            floor: default_floor(),
            total_slots: default_total_slots(),
            slot_policy: SlotPolicy::default(),
            mode: DeviceMode::default(),
        }
    }
}

impl GarageConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string(),
            error: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally `std::env::var`)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("CENTRAL_HOST") {
            self.central.host = host;
        }
        if let Some(port) = lookup("CENTRAL_PORT") {
            self.central.port = parse_var("CENTRAL_PORT", &port)?;
        }
        if let Some(dir) = lookup("DB_PATH") {
            self.central.journal_dir = Some(PathBuf::from(dir));
        }
        if let Some(rate) = lookup("PRECO_POR_MINUTO") {
            self.central.rate_per_minute = parse_var::<Decimal>("PRECO_POR_MINUTO", &rate)?;
        }
        if let Some(minimum) = lookup("VALOR_MINIMO") {
            self.central.minimum_fee = parse_var::<Decimal>("VALOR_MINIMO", &minimum)?;
        }
        if let Some(confidence) = lookup("LPR_CONFIDENCE_MIN") {
            self.lanes.min_confidence = parse_var("LPR_CONFIDENCE_MIN", &confidence)?;
        }
        if let Some(total) = lookup("TOTAL_VAGAS") {
            self.lanes.total_slots = parse_var("TOTAL_VAGAS", &total)?;
        }
        if let Some(mode) = lookup("MODE") {
            self.lanes.mode = mode.parse()?;
        }
        self.validate()
    }

    /// Reject values the components cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.lanes.min_confidence) {
            return Err(ConfigError::InvalidValue {
                key: "lanes.min_confidence".to_string(),
                reason: format!("{} is outside 0..=1", self.lanes.min_confidence),
            });
        }
        if self.lanes.total_slots == 0 {
            return Err(ConfigError::InvalidValue {
                key: "lanes.total_slots".to_string(),
                reason: "the garage needs at least one slot".to_string(),
            });
        }
        if self.central.rate_per_minute.is_sign_negative()
            || self.central.minimum_fee.is_sign_negative()
        {
            return Err(ConfigError::InvalidValue {
                key: "central.rate_per_minute".to_string(),
                reason: "tariff values must not be negative".to_string(),
            });
        }
        if self.central.stats_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "central.stats_interval_secs".to_string(),
                reason: "interval must be positive".to_string(),
            });
        }
        if self.central.read_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "central.read_timeout_ms".to_string(),
                reason: "timeout must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn billing(&self) -> BillingConfig {
        BillingConfig::new(self.central.rate_per_minute, self.central.minimum_fee)
    }

    /// Address the central server binds
    pub fn central_address(&self) -> String {
        format!("{}:{}", self.central.host, self.central.port)
    }

    /// Client settings the lanes use to reach the central server
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.central.host.clone(), self.central.port)
            .with_timeout(Duration::from_millis(self.lanes.request_timeout_ms))
    }

    pub fn lane_config(&self) -> LaneConfig {
        LaneConfig {
            min_confidence: self.lanes.min_confidence,
            request_timeout: Duration::from_millis(self.lanes.request_timeout_ms),
            passage_timeout: Duration::from_millis(self.lanes.passage_timeout_ms),
            error_backoff: Duration::from_millis(self.lanes.error_backoff_ms),
            poll_interval: Duration::from_millis(self.lanes.poll_interval_ms),
            floor: self.lanes.floor.clone(),
            slot_policy: self.lanes.slot_policy,
        }
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.central.stats_interval_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.central.read_timeout_ms)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: format!("'{raw}': {e}"),
    })
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = GarageConfig::from_json("{}").unwrap();

        assert_eq!(config, GarageConfig::default());
        assert_eq!(config.central.port, 8080);
        assert_eq!(config.central.rate_per_minute, dec!(0.15));
        assert_eq!(config.central.minimum_fee, dec!(2.00));
        assert_eq!(config.central.stats_interval_secs, 300);
        assert!(config.central.journal_dir.is_none());
        assert_eq!(config.lanes.total_slots, 8);
        assert_eq!(config.lanes.mode, DeviceMode::Simulation);
        assert_eq!(config.lanes.slot_policy, SlotPolicy::FirstOccupied);
    }

    #[test]
    fn test_parse_partial_config() {
        let json = r#"{
            "central": { "port": 9000, "rate_per_minute": 0.25, "journal_dir": "/tmp/garage" },
            "lanes": { "total_slots": 20, "slot_policy": "plate_bound", "mode": "hardware" }
        }"#;

        let config = GarageConfig::from_json(json).unwrap();

        assert_eq!(config.central.port, 9000);
        assert_eq!(config.central.host, "127.0.0.1");
        assert_eq!(config.central.rate_per_minute, dec!(0.25));
        assert_eq!(config.central.minimum_fee, dec!(2.00));
        assert_eq!(config.central.journal_dir, Some(PathBuf::from("/tmp/garage")));
        assert_eq!(config.lanes.total_slots, 20);
        assert_eq!(config.lanes.slot_policy, SlotPolicy::PlateBound);
        assert_eq!(config.lanes.mode, DeviceMode::Hardware);
        assert_eq!(config.lanes.min_confidence, 0.8);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result = GarageConfig::from_json("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = GarageConfig::from_file("/nonexistent/garage.json");
        match result {
            Err(ConfigError::Io { path, .. }) => assert_eq!(path, "/nonexistent/garage.json"),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_file_values_validated() {
        let result = GarageConfig::from_json(r#"{ "lanes": { "total_slots": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = GarageConfig::from_json(r#"{ "lanes": { "min_confidence": 1.5 } }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = GarageConfig::from_json(r#"{ "central": { "read_timeout_ms": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { key, .. }) if key == "central.read_timeout_ms"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GarageConfig::default();
        config
            .apply_env(env(&[
                ("CENTRAL_HOST", "10.0.0.5"),
                ("CENTRAL_PORT", "9100"),
                ("DB_PATH", "/var/lib/garage"),
                ("PRECO_POR_MINUTO", "0.20"),
                ("VALOR_MINIMO", "3.50"),
                ("LPR_CONFIDENCE_MIN", "0.9"),
                ("TOTAL_VAGAS", "12"),
                ("MODE", "hardware"),
            ]))
            .unwrap();

        assert_eq!(config.central.host, "10.0.0.5");
        assert_eq!(config.central.port, 9100);
        assert_eq!(config.central.journal_dir, Some(PathBuf::from("/var/lib/garage")));
        assert_eq!(config.central.rate_per_minute, dec!(0.20));
        assert_eq!(config.central.minimum_fee, dec!(3.50));
        assert_eq!(config.lanes.min_confidence, 0.9);
        assert_eq!(config.lanes.total_slots, 12);
        assert_eq!(config.lanes.mode, DeviceMode::Hardware);
        assert_eq!(config.central_address(), "10.0.0.5:9100");
    }

    #[test]
    fn test_env_absent_keeps_values() {
        let mut config = GarageConfig::from_json(r#"{ "central": { "port": 7000 } }"#).unwrap();
        config.apply_env(env(&[])).unwrap();
        assert_eq!(config.central.port, 7000);
    }

    #[test]
    fn test_env_invalid_values() {
        let mut config = GarageConfig::default();
        let err = config.apply_env(env(&[("CENTRAL_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "CENTRAL_PORT"));

        let mut config = GarageConfig::default();
        let err = config.apply_env(env(&[("MODE", "turbo")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MODE"));

        let mut config = GarageConfig::default();
        let err = config.apply_env(env(&[("TOTAL_VAGAS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_derived_component_configs() {
        let config = GarageConfig::from_json(
            r#"{ "lanes": { "request_timeout_ms": 750, "poll_interval_ms": 200, "floor": "subsolo" } }"#,
        )
        .unwrap();

        let lane = config.lane_config();
        assert_eq!(lane.request_timeout, Duration::from_millis(750));
        assert_eq!(lane.poll_interval, Duration::from_millis(200));
        assert_eq!(lane.passage_timeout, Duration::from_secs(10));
        assert_eq!(lane.floor, "subsolo");

        let client = config.client_config();
        assert_eq!(client.address(), "127.0.0.1:8080");
        assert_eq!(client.timeout, Duration::from_millis(750));

        let billing = config.billing();
        assert_eq!(billing.fee_for(30), dec!(4.50));
        assert_eq!(config.stats_interval(), Duration::from_secs(300));
        assert_eq!(config.read_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Simulation".parse::<DeviceMode>().unwrap(), DeviceMode::Simulation);
        assert_eq!(" hardware ".parse::<DeviceMode>().unwrap(), DeviceMode::Hardware);
        assert_eq!(DeviceMode::Hardware.to_string(), "hardware");
    }
}
