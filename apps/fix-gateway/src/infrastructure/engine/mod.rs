//! Dry-Run Session Engine
//!
//! A [`SessionEngine`] that decorates and logs outbound messages instead of
//! transmitting them. Used by the binary when no protocol engine is wired
//! in, so the command surface and discovery flow can be exercised end to
//! end against configured sessions.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::application::ports::{EngineError, SessionEngine};
use crate::application::services::OutboundDecorator;
use crate::domain::fix::FixMessage;
use crate::domain::session::SessionId;

/// Engine adapter that logs instead of sending.
#[derive(Debug)]
pub struct DryRunEngine {
    decorator: OutboundDecorator,
    sessions: Vec<SessionId>,
    sent: AtomicU64,
}

impl DryRunEngine {
    /// Create an engine for the given sessions.
    #[must_use]
    pub fn new(decorator: OutboundDecorator, sessions: Vec<SessionId>) -> Self {
        Self {
            decorator,
            sessions,
            sent: AtomicU64::new(0),
        }
    }

    /// Number of messages accepted so far.
    #[must_use]
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl SessionEngine for DryRunEngine {
    fn send(&self, mut message: FixMessage, session: &SessionId) -> Result<(), EngineError> {
        if !self.sessions.contains(session) {
            return Err(EngineError::SessionNotFound {
                session: session.to_string(),
            });
        }

        self.decorator.decorate(&mut message, session);
        self.sent.fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            session = %session,
            msg_type = message.msg_type_raw().unwrap_or_default(),
            "Dry run: outbound message"
        );
        tracing::debug!(session = %session, message = %message, "Dry run: outbound fields");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fix::{MsgType, tags};

    fn session() -> SessionId {
        SessionId::new("FIX.4.4", "D1", "FXCM")
    }

    fn engine() -> DryRunEngine {
        let decorator =
            OutboundDecorator::new("trader", "secret").with_target_sub_id(session(), "U100D1");
        DryRunEngine::new(decorator, vec![session()])
    }

    #[test]
    fn accepts_known_sessions() {
        let engine = engine();
        engine
            .send(FixMessage::new(MsgType::Logon), &session())
            .unwrap();
        engine
            .send(FixMessage::new(MsgType::NewOrderSingle), &session())
            .unwrap();
        assert_eq!(engine.sent_count(), 2);
    }

    #[test]
    fn rejects_unknown_session() {
        let engine = engine();
        let other = SessionId::new("FIX.4.4", "OTHER", "FXCM");
        let err = engine
            .send(FixMessage::new(MsgType::Logon), &other)
            .unwrap_err();
        assert!(matches!(err, EngineError::SessionNotFound { .. }));
        assert_eq!(engine.sent_count(), 0);
    }

    #[test]
    fn rendered_message_redacts_password() {
        let mut logon = FixMessage::new(MsgType::Logon);
        engine().decorator.decorate(&mut logon, &session());
        assert_eq!(logon.get(tags::PASSWORD), Some("secret"));
        assert!(!logon.to_string().contains("secret"));
    }
}
