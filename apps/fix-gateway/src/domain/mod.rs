//! Domain Layer - FIX gateway state and message model.
//!
//! Pure types and state holders with no I/O: the message model, session
//! roles, correlation ids, discovered accounts, subscriptions, the
//! discovery state machine, request builders and inbound views.

/// FIX message model and tag constants.
pub mod fix;

/// Session identifiers, roles and the session registry.
pub mod session;

/// Correlation id allocation.
pub mod request_id;

/// Discovered account ledger.
pub mod account;

/// Market data subscription tracking.
pub mod subscription;

/// Discovery state machine.
pub mod discovery;

/// Outbound request builders.
pub mod requests;

/// Typed inbound message views.
pub mod inbound;
