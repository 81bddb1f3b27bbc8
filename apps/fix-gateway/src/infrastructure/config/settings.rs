//! Gateway Configuration Settings
//!
//! YAML configuration with `${VAR}` / `${VAR:-default}` environment
//! interpolation. Validation failures are fatal at startup.
//!
//! # Example
//!
//! ```yaml
//! credentials:
//!   username: ${FXCM_USERNAME}
//!   password: ${FXCM_PASSWORD}
//! sessions:
//!   - sender_comp_id: D123456789_client1
//!     target_comp_id: FXCM
//!     target_sub_id: U100D1
//!   - sender_comp_id: MD_D123456789_client1
//!     target_comp_id: FXCM
//!     target_sub_id: U100D1
//!     role: market_data
//! ```

use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::application::services::{GatewaySettings, OutboundDecorator};
use crate::domain::requests::{MarketOrderParams, OrderSide};
use crate::domain::session::{SessionId, SessionRole};
use crate::domain::subscription::TokenPolicy;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "FIX_GATEWAY_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "gateway.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

// =============================================================================
// Sections
// =============================================================================

/// Logon credentials sent on the Logon message.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    #[must_use]
    pub const fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    /// Get the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// One engine session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Protocol version.
    #[serde(default = "default_begin_string")]
    pub begin_string: String,
    /// Our comp id.
    pub sender_comp_id: String,
    /// Counterparty comp id.
    pub target_comp_id: String,
    /// Optional session qualifier.
    #[serde(default)]
    pub qualifier: Option<String>,
    /// TargetSubID routed on every outbound message of this session.
    pub target_sub_id: String,
    /// Explicit role; derived from the identifier when absent.
    #[serde(default)]
    pub role: Option<SessionRole>,
}

impl SessionSettings {
    /// Session identifier.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        let id = SessionId::new(
            self.begin_string.clone(),
            self.sender_comp_id.clone(),
            self.target_comp_id.clone(),
        );
        match &self.qualifier {
            Some(qualifier) => id.with_qualifier(qualifier.clone()),
            None => id,
        }
    }

    /// Configured role, or the one derived from the identifier.
    #[must_use]
    pub fn effective_role(&self) -> SessionRole {
        self.role
            .unwrap_or_else(|| SessionRole::derive(&self.session_id()))
    }
}

fn default_begin_string() -> String {
    "FIX.4.4".to_string()
}

/// Market data settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketDataSettings {
    /// Symbols subscribed by default.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Correlation token policy.
    #[serde(default)]
    pub token_policy: TokenPolicy,
}

impl Default for MarketDataSettings {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            token_policy: TokenPolicy::default(),
        }
    }
}

fn default_symbols() -> Vec<String> {
    vec![
        "EUR/USD".to_string(),
        "EUR/JPY".to_string(),
        "EUR/GBP".to_string(),
    ]
}

/// Default market order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderSettings {
    /// Symbol.
    #[serde(default = "default_order_symbol")]
    pub symbol: String,
    /// Quantity.
    #[serde(default = "default_order_quantity")]
    pub quantity: Decimal,
    /// Side.
    #[serde(default = "default_order_side")]
    pub side: OrderSide,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            symbol: default_order_symbol(),
            quantity: default_order_quantity(),
            side: default_order_side(),
        }
    }
}

fn default_order_symbol() -> String {
    "EUR/USD".to_string()
}

fn default_order_quantity() -> Decimal {
    Decimal::from(10_000)
}

const fn default_order_side() -> OrderSide {
    OrderSide::Buy
}

/// Discovery settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    /// Seconds after the accounts request before discovery is marked
    /// complete (0 = only on operator command).
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            settle_secs: default_settle_secs(),
        }
    }
}

impl DiscoverySettings {
    /// Settle delay, if automatic completion is enabled.
    #[must_use]
    pub const fn settle_delay(&self) -> Option<Duration> {
        if self.settle_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.settle_secs))
        }
    }
}

const fn default_settle_secs() -> u64 {
    10
}

/// Health endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthSettings {
    /// HTTP port (0 = disabled).
    #[serde(default = "default_health_port")]
    pub port: u16,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            port: default_health_port(),
        }
    }
}

const fn default_health_port() -> u16 {
    8083
}

// =============================================================================
// Root Configuration
// =============================================================================

/// Root gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Logon credentials.
    pub credentials: Credentials,
    /// TradingSessionID (336) for trading requests.
    #[serde(default = "default_trading_session_id")]
    pub trading_session_id: String,
    /// Engine sessions.
    #[serde(default)]
    pub sessions: Vec<SessionSettings>,
    /// Market data settings.
    #[serde(default)]
    pub market_data: MarketDataSettings,
    /// Default market order.
    #[serde(default)]
    pub orders: OrderSettings,
    /// Discovery settings.
    #[serde(default)]
    pub discovery: DiscoverySettings,
    /// Health endpoint settings.
    #[serde(default)]
    pub health: HealthSettings,
}

fn default_trading_session_id() -> String {
    "FXCM".to_string()
}

impl GatewayConfig {
    /// Orchestrator settings.
    #[must_use]
    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            trading_session_id: self.trading_session_id.clone(),
            default_symbols: self.market_data.symbols.clone(),
            token_policy: self.market_data.token_policy,
            default_order: MarketOrderParams {
                symbol: self.orders.symbol.clone(),
                side: self.orders.side,
                quantity: self.orders.quantity,
            },
        }
    }

    /// Outbound decorator with credentials and per-session routing.
    #[must_use]
    pub fn decorator(&self) -> OutboundDecorator {
        self.sessions.iter().fold(
            OutboundDecorator::new(self.credentials.username(), self.credentials.password()),
            |decorator, session| {
                decorator.with_target_sub_id(session.session_id(), session.target_sub_id.clone())
            },
        )
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Config path from [`CONFIG_PATH_ENV`], or [`DEFAULT_CONFIG_PATH`].
#[must_use]
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

/// Load configuration from a YAML file with environment variable
/// interpolation.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: &str) -> Result<GatewayConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;
    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<GatewayConfig, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: GatewayConfig = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate `${VAR}` and `${VAR:-default}` references.
#[allow(clippy::expect_used)] // constant pattern
fn interpolate_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Validate configuration values.
fn validate_config(config: &GatewayConfig) -> Result<(), ConfigError> {
    if config.credentials.username().trim().is_empty() {
        return Err(validation("credentials.username must not be empty"));
    }
    if config.credentials.password().is_empty() {
        return Err(validation("credentials.password must not be empty"));
    }
    if config.trading_session_id.trim().is_empty() {
        return Err(validation("trading_session_id must not be empty"));
    }
    if config.sessions.is_empty() {
        return Err(validation("at least one session must be configured"));
    }

    let mut ids = HashSet::new();
    let mut roles = HashSet::new();
    for (index, session) in config.sessions.iter().enumerate() {
        for (field, value) in [
            ("begin_string", &session.begin_string),
            ("sender_comp_id", &session.sender_comp_id),
            ("target_comp_id", &session.target_comp_id),
            ("target_sub_id", &session.target_sub_id),
        ] {
            if value.trim().is_empty() {
                return Err(validation(format!("sessions[{index}].{field} must not be empty")));
            }
        }

        let id = session.session_id();
        if !ids.insert(id.clone()) {
            return Err(validation(format!("duplicate session {id}")));
        }
        let role = session.effective_role();
        if !roles.insert(role) {
            return Err(validation(format!("more than one {role} session configured")));
        }
    }

    if config.market_data.symbols.is_empty()
        || config.market_data.symbols.iter().any(|s| s.trim().is_empty())
    {
        return Err(validation("market_data.symbols must be a non-empty list of symbols"));
    }
    if config.orders.symbol.trim().is_empty() {
        return Err(validation("orders.symbol must not be empty"));
    }
    if config.orders.quantity <= Decimal::ZERO {
        return Err(validation("orders.quantity must be positive"));
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rust_decimal_macros::dec;

    use super::*;

    const MINIMAL: &str = r"
credentials:
  username: trader
  password: secret
sessions:
  - sender_comp_id: D1
    target_comp_id: FXCM
    target_sub_id: U100D1
  - sender_comp_id: MD_D1
    target_comp_id: FXCM
    target_sub_id: U100D1
";

    fn load_err(yaml: &str) -> String {
        match load_config_from_string(yaml) {
            Ok(_) => panic!("expected validation error"),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = load_config_from_string(MINIMAL).unwrap();

        assert_eq!(config.trading_session_id, "FXCM");
        assert_eq!(config.market_data.symbols, vec!["EUR/USD", "EUR/JPY", "EUR/GBP"]);
        assert_eq!(config.market_data.token_policy, TokenPolicy::Fresh);
        assert_eq!(config.orders.quantity, dec!(10000));
        assert_eq!(config.orders.side, OrderSide::Buy);
        assert_eq!(config.discovery.settle_delay(), Some(Duration::from_secs(10)));
        assert_eq!(config.health.port, 8083);
        assert_eq!(config.sessions[0].begin_string, "FIX.4.4");
    }

    #[test]
    fn roles_derived_or_explicit() {
        let config = load_config_from_string(MINIMAL).unwrap();
        assert_eq!(config.sessions[0].effective_role(), SessionRole::Trading);
        assert_eq!(config.sessions[1].effective_role(), SessionRole::MarketData);

        let explicit = MINIMAL.replace(
            "  - sender_comp_id: MD_D1",
            "  - role: market_data\n    sender_comp_id: PRICES",
        );
        let config = load_config_from_string(&explicit).unwrap();
        assert_eq!(config.sessions[1].role, Some(SessionRole::MarketData));
    }

    #[test]
    fn full_config_parses() {
        let yaml = format!(
            "{MINIMAL}
trading_session_id: FXCM_DEMO
market_data:
  symbols: [USD/JPY]
  token_policy: per_symbol
orders:
  symbol: EUR/GBP
  quantity: 2500.5
  side: sell
discovery:
  settle_secs: 0
health:
  port: 0
"
        );
        let config = load_config_from_string(&yaml).unwrap();

        assert_eq!(config.trading_session_id, "FXCM_DEMO");
        assert_eq!(config.market_data.token_policy, TokenPolicy::PerSymbol);
        assert_eq!(config.orders.quantity, dec!(2500.5));
        assert_eq!(config.orders.side, OrderSide::Sell);
        assert!(config.discovery.settle_delay().is_none());
        assert_eq!(config.health.port, 0);

        let settings = config.gateway_settings();
        assert_eq!(settings.default_symbols, vec!["USD/JPY"]);
        assert_eq!(settings.default_order.symbol, "EUR/GBP");
    }

    #[test]
    fn decorator_routes_every_session() {
        let config = load_config_from_string(MINIMAL).unwrap();
        let decorator = config.decorator();
        for session in &config.sessions {
            assert_eq!(decorator.target_sub_id(&session.session_id()), Some("U100D1"));
        }
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let config = load_config_from_string(MINIMAL).unwrap();
        let debug = format!("{:?}", config.credentials);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn rejects_empty_password() {
        let err = load_err(&MINIMAL.replace("password: secret", "password: \"\""));
        assert!(err.contains("credentials.password"));
    }

    #[test]
    fn rejects_missing_sessions() {
        let yaml = "credentials:\n  username: trader\n  password: secret\n";
        assert!(load_err(yaml).contains("at least one session"));
    }

    #[test]
    fn rejects_empty_target_sub_id() {
        let yaml = MINIMAL.replacen("target_sub_id: U100D1", "target_sub_id: \"\"", 1);
        assert!(load_err(&yaml).contains("sessions[0].target_sub_id"));
    }

    #[test]
    fn rejects_duplicate_sessions() {
        let yaml = MINIMAL.replace("MD_D1", "D1");
        assert!(load_err(&yaml).contains("duplicate session"));
    }

    #[test]
    fn rejects_two_sessions_with_same_role() {
        let yaml = MINIMAL.replace("MD_D1", "D2");
        assert!(load_err(&yaml).contains("more than one trading session"));
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let yaml = format!("{MINIMAL}orders:\n  quantity: 0\n");
        assert!(load_err(&yaml).contains("orders.quantity"));
    }

    #[test]
    fn rejects_empty_symbols() {
        let yaml = format!("{MINIMAL}market_data:\n  symbols: []\n");
        assert!(load_err(&yaml).contains("market_data.symbols"));
    }

    #[test]
    fn env_var_with_default_when_missing() {
        let input = "username: ${FIX_GATEWAY_TEST_NONEXISTENT_VAR:-fallback}";
        assert_eq!(interpolate_env_vars(input), "username: fallback");
    }

    #[test]
    fn env_var_without_default_becomes_empty() {
        let input = "password: ${FIX_GATEWAY_TEST_UNLIKELY_TO_EXIST}";
        assert_eq!(interpolate_env_vars(input), "password: ");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)]
    fn env_var_uses_existing_value() {
        let result = interpolate_env_vars("path: ${PATH:-default}");
        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.sessions.len(), 2);
    }

    #[test]
    fn shipped_sample_config_is_valid() {
        let yaml = include_str!("../../../gateway.yaml")
            .replace("${FXCM_USERNAME}", "trader")
            .replace("${FXCM_PASSWORD}", "secret");
        let config = load_config_from_string(&yaml).unwrap();

        assert_eq!(config.sessions.len(), 2);
        assert_eq!(config.sessions[1].effective_role(), SessionRole::MarketData);
        assert!(config.sessions[1].sender_comp_id.starts_with("MD_"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_config("/nonexistent/gateway.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = load_config_from_string("credentials: [").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
