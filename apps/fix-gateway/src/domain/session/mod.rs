//! Session Registry
//!
//! Tracks the sessions announced by the protocol engine and resolves which
//! one carries trading traffic and which one carries market data.
//!
//! # Roles
//!
//! A session's role is tagged once, at registration. When configuration
//! does not name a role, it is derived from the session identifier: a
//! qualifier or comp id containing [`MARKET_DATA_MARKER`] marks a
//! market-data session, anything else is a trading session.

use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Substring that marks a market-data session identifier.
pub const MARKET_DATA_MARKER: &str = "MD_";

// =============================================================================
// Session Identifier
// =============================================================================

/// Stable identifier of an engine-managed session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId {
    /// Protocol version string (e.g. `FIX.4.4`).
    pub begin_string: String,
    /// Our comp id.
    pub sender_comp_id: String,
    /// Counterparty comp id.
    pub target_comp_id: String,
    /// Optional session qualifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

impl SessionId {
    /// Create a session id without a qualifier.
    #[must_use]
    pub fn new(
        begin_string: impl Into<String>,
        sender_comp_id: impl Into<String>,
        target_comp_id: impl Into<String>,
    ) -> Self {
        Self {
            begin_string: begin_string.into(),
            sender_comp_id: sender_comp_id.into(),
            target_comp_id: target_comp_id.into(),
            qualifier: None,
        }
    }

    /// Attach a qualifier.
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}",
            self.begin_string, self.sender_comp_id, self.target_comp_id
        )?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, ":{qualifier}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Session Role
// =============================================================================

/// Logical role of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    /// Orders, positions, accounts and session status.
    Trading,
    /// Market data subscriptions.
    MarketData,
}

impl SessionRole {
    /// Map a "wants market data" selector onto a role.
    #[must_use]
    pub const fn for_market_data(wants_market_data: bool) -> Self {
        if wants_market_data {
            Self::MarketData
        } else {
            Self::Trading
        }
    }

    /// Derive a role from the session identifier's naming convention.
    #[must_use]
    pub fn derive(id: &SessionId) -> Self {
        Self::for_market_data(id.to_string().contains(MARKET_DATA_MARKER))
    }

    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trading => "trading",
            Self::MarketData => "market_data",
        }
    }
}

impl fmt::Display for SessionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Known sessions in registration order.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<Vec<(SessionId, SessionRole)>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session with its role.
    ///
    /// Returns `false` if the session was already registered; the original
    /// role is kept.
    pub fn register(&self, id: SessionId, role: SessionRole) -> bool {
        let mut sessions = self.sessions.write();
        if sessions.iter().any(|(known, _)| *known == id) {
            return false;
        }
        sessions.push((id, role));
        true
    }

    /// First registered session with the given role, if any.
    #[must_use]
    pub fn resolve(&self, role: SessionRole) -> Option<SessionId> {
        self.sessions
            .read()
            .iter()
            .find(|(_, r)| *r == role)
            .map(|(id, _)| id.clone())
    }

    /// Role a session was registered with.
    #[must_use]
    pub fn role_of(&self, id: &SessionId) -> Option<SessionRole> {
        self.sessions
            .read()
            .iter()
            .find(|(known, _)| known == id)
            .map(|(_, role)| *role)
    }

    /// All sessions in registration order.
    #[must_use]
    pub fn sessions(&self) -> Vec<(SessionId, SessionRole)> {
        self.sessions.read().clone()
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Check if no session has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
