#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! FIX Gateway - Trading Session Orchestrator
//!
//! Sits on top of a FIX 4.4 protocol engine connected to FXCM. Discovers
//! the trading session and accounts after logon, then issues positions,
//! market data and market order requests on operator command, routing each
//! request to the session that serves its role.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: Message model and gateway state
//!   - `fix`: Tag/value messages and repeating groups
//!   - `session`: Session identity, roles and registry
//!   - `request_id`: Wrapping request id allocator
//!   - `account`: Discovered account ledger
//!   - `subscription`: Market data subscription tracking
//!   - `discovery`: Post-logon discovery state machine
//!   - `requests`: Outbound request builders
//!   - `inbound`: Typed views over inbound messages
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Session engine interface
//!   - `metrics`: Gateway counters and gauges
//!   - `services`: Orchestrator, dispatcher, decoration, commands
//!
//! - **Infrastructure**: Adapters and process concerns
//!   - `config`: YAML configuration
//!   - `engine`: Dry-run engine adapter
//!   - `health`: Health check HTTP endpoint
//!   - `metrics`: Prometheus recorder
//!   - `telemetry`: Logging and OpenTelemetry
//!
//! # Data Flow
//!
//! ```text
//!                    +-------------------+
//! operator cmd ----->|                   |---- send ----> SessionEngine --> FXCM
//!                    |      Gateway      |                      |
//! engine callbacks ->|   Orchestrator    |<-- on_*_inbound -----+
//!                    |                   |
//!                    +-------------------+
//!                      | ids | sessions | accounts | subscriptions | discovery
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Message model and gateway state with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::fix::{FieldMap, FixMessage, MsgType, Tag};
pub use domain::session::{SessionId, SessionRole};
pub use domain::subscription::{Subscription, SubscriptionState, TokenPolicy};

// Application
pub use application::ports::{EngineError, RecordingEngine, SentMessage, SessionEngine};
pub use application::services::{
    Command, CommandError, GatewayError, GatewayOrchestrator, GatewaySettings, GatewaySnapshot,
    OutboundDecorator,
};

// Infrastructure config
pub use infrastructure::config::{ConfigError, GatewayConfig, load_config};

// Engine adapter
pub use infrastructure::engine::DryRunEngine;

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
