//! Configuration Module
//!
//! YAML configuration loading for the gateway binary.

mod settings;

pub use settings::{
    CONFIG_PATH_ENV, ConfigError, Credentials, DEFAULT_CONFIG_PATH, DiscoverySettings,
    GatewayConfig, HealthSettings, MarketDataSettings, OrderSettings, SessionSettings,
    config_path, load_config, load_config_from_string,
};
