//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the gateway services and the port interface that
//! defines how the core talks to the protocol engine.

/// Gateway counters and gauges.
pub mod metrics;

/// Port interfaces for the protocol engine.
pub mod ports;

/// Orchestration, dispatch, decoration and command services.
pub mod services;
