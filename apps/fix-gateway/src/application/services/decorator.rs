//! Outbound Decoration
//!
//! Adds the session-scoped fields FXCM requires on every outbound message:
//! credentials on Logon and the per-session `TargetSubID` in the header.
//! Applied exactly once, at the engine boundary.

use std::collections::HashMap;

use crate::domain::fix::{FixMessage, MsgType, tags};
use crate::domain::session::SessionId;

/// Session-scoped outbound decoration.
#[derive(Clone, Default)]
pub struct OutboundDecorator {
    username: String,
    password: String,
    target_sub_ids: HashMap<SessionId, String>,
}

impl OutboundDecorator {
    /// Create a decorator with logon credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            target_sub_ids: HashMap::new(),
        }
    }

    /// Configure the `TargetSubID` routed on a session.
    #[must_use]
    pub fn with_target_sub_id(mut self, session: SessionId, target_sub_id: impl Into<String>) -> Self {
        self.target_sub_ids.insert(session, target_sub_id.into());
        self
    }

    /// `TargetSubID` configured for a session.
    #[must_use]
    pub fn target_sub_id(&self, session: &SessionId) -> Option<&str> {
        self.target_sub_ids.get(session).map(String::as_str)
    }

    /// Decorate an administrative message.
    pub fn on_admin(&self, message: &mut FixMessage, session: &SessionId) {
        if message.msg_type() == Some(MsgType::Logon) {
            message.set(tags::USERNAME, self.username.as_str());
            message.set(tags::PASSWORD, self.password.as_str());
        }
        self.route(message, session);
    }

    /// Decorate an application message.
    pub fn on_app(&self, message: &mut FixMessage, session: &SessionId) {
        self.route(message, session);
    }

    /// Decorate any outbound message according to its kind.
    pub fn decorate(&self, message: &mut FixMessage, session: &SessionId) {
        if message.msg_type().is_some_and(MsgType::is_admin) {
            self.on_admin(message, session);
        } else {
            self.on_app(message, session);
        }
    }

    fn route(&self, message: &mut FixMessage, session: &SessionId) {
        match self.target_sub_id(session) {
            Some(sub_id) => {
                message.header_mut().set(tags::TARGET_SUB_ID, sub_id);
            }
            None => tracing::warn!(session = %session, "No TargetSubID configured for session"),
        }
    }
}

impl std::fmt::Debug for OutboundDecorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundDecorator")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("target_sub_ids", &self.target_sub_ids)
            .finish()
    }
}
