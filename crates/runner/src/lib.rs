//! Garage Runner - configuration and process wiring
//!
//! Two processes make up a garage:
//!
//! ```text
//!   garage-ground-floor                          garage-central
//! ┌──────────────────────────────┐          ┌──────────────────────────┐
//! │  Entry lane     Exit lane    │   TCP    │  CentralServer           │
//! │  (devices)      (devices)    │  JSON    │        │                 │
//! │      │              │        │  lines   │        ▼                 │
//! │      └──── TcpRequester ─────┼─────────▶│  CentralActor            │
//! │              │               │          │  (CentralAuthority)      │
//! │          SlotBoard           │          │        │                 │
//! │              │               │          │        ▼                 │
//! │       DisplayRefresher       │          │  Journal / memory store  │
//! └──────────────────────────────┘          └──────────────────────────┘
//! ```
//!
//! - **Config**: JSON file plus environment overrides
//! - **Bootstrap**: builds and spawns each side from a [`GarageConfig`]

pub mod bootstrap;
pub mod config;

pub use bootstrap::{
    BootstrapError, CentralNode, GroundFloor, GroundFloorTasks, open_store, shutdown_on_ctrl_c,
};
pub use config::{CentralConfig, ConfigError, DeviceMode, GarageConfig, LanesConfig};

/// Parse `--config <path>` / `--help` and load the configuration
///
/// Without a file the defaults are used. Environment overrides apply in both
/// cases. `Ok(None)` means help was printed.
pub fn load_config(args: &[String], usage: &str) -> Result<Option<GarageConfig>, ConfigError> {
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                eprintln!("{usage}");
                return Ok(None);
            }
            "--config" | "-c" => {
                i += 1;
                let path = args.get(i).ok_or_else(|| ConfigError::InvalidValue {
                    key: "--config".to_string(),
                    reason: "requires a path argument".to_string(),
                })?;
                config_path = Some(path.clone());
            }
            arg => {
                return Err(ConfigError::InvalidValue {
                    key: arg.to_string(),
                    reason: "unknown argument".to_string(),
                });
            }
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            GarageConfig::from_file(&path)?
        }
        None => GarageConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(Some(config))
}

/// Install `env_logger` with `info` as the default filter
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
