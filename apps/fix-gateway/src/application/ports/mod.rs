//! Port Interfaces
//!
//! Contracts between the orchestration core and the protocol engine,
//! following the Hexagonal Architecture pattern.
//!
//! ## Driven Ports (Outbound)
//!
//! - `SessionEngine`: hands a fully built message to the engine for a session
//!
//! ## Driver Ports (Inbound)
//!
//! - `InboundHandler` (see `services::dispatcher`): typed callbacks the
//!   dispatcher routes inbound messages to

mod session_engine;

pub use session_engine::{EngineError, RecordingEngine, SentMessage, SessionEngine};
