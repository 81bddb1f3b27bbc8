//! Application Services
//!
//! Services that orchestrate domain logic and coordinate with the engine
//! port.
//!
//! - `GatewayOrchestrator`: engine callbacks, discovery and operator commands
//! - `MessageDispatcher`: routes inbound messages to typed handlers
//! - `OutboundDecorator`: credentials and per-session routing on send
//! - `Command`: operator command parsing

pub mod commands;
pub mod decorator;
pub mod dispatcher;
pub mod orchestrator;

pub use commands::{Command, CommandError, OrderOverrides};
pub use decorator::OutboundDecorator;
pub use dispatcher::{InboundHandler, MessageDispatcher};
pub use orchestrator::{
    GatewayError, GatewayOrchestrator, GatewaySettings, GatewaySnapshot, SessionView,
};
