//! Session Engine Port (Driven Port)
//!
//! The protocol engine owns connections, encoding, sequence numbers and the
//! message store. The core only asks it to send a message on a session.

use parking_lot::Mutex;

use crate::domain::fix::FixMessage;
use crate::domain::session::SessionId;

/// Send failure reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine does not know the session.
    #[error("Session not found: {session}")]
    SessionNotFound {
        /// Session display id.
        session: String,
    },

    /// The session exists but is not logged on.
    #[error("Session not logged on: {session}")]
    NotLoggedOn {
        /// Session display id.
        session: String,
    },

    /// Any other send failure.
    #[error("Send failed: {message}")]
    SendFailed {
        /// Engine-provided reason.
        message: String,
    },
}

/// Port for handing outbound messages to the protocol engine.
///
/// Implementations must be callable from any thread and must not call back
/// into the orchestrator synchronously.
pub trait SessionEngine: Send + Sync {
    /// Send a message on a session. Fire-and-forget: `Ok` means the engine
    /// accepted the message, not that the counterparty answered.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the engine refuses the message.
    fn send(&self, message: FixMessage, session: &SessionId) -> Result<(), EngineError>;
}

/// A message captured by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Target session.
    pub session: SessionId,
    /// Message as handed to the engine.
    pub message: FixMessage,
}

/// In-memory engine that records every send, for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingEngine {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Drain the recorded messages.
    pub fn take(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Number of recorded messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    /// Check if nothing has been sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }
}

impl SessionEngine for RecordingEngine {
    fn send(&self, message: FixMessage, session: &SessionId) -> Result<(), EngineError> {
        self.sent.lock().push(SentMessage {
            session: session.clone(),
            message,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fix::MsgType;

    #[test]
    fn recording_engine_captures_sends() {
        let engine = RecordingEngine::new();
        let session = SessionId::new("FIX.4.4", "D1", "FXCM");

        engine
            .send(FixMessage::new(MsgType::Heartbeat), &session)
            .unwrap();

        let sent = engine.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].session, session);
        assert_eq!(sent[0].message.msg_type(), Some(MsgType::Heartbeat));
    }

    #[test]
    fn take_drains() {
        let engine = RecordingEngine::new();
        let session = SessionId::new("FIX.4.4", "D1", "FXCM");
        engine.send(FixMessage::new(MsgType::Heartbeat), &session).unwrap();

        assert_eq!(engine.take().len(), 1);
        assert!(engine.is_empty());
    }

    #[test]
    fn engine_error_display() {
        let err = EngineError::NotLoggedOn {
            session: "FIX.4.4:D1->FXCM".to_string(),
        };
        assert_eq!(err.to_string(), "Session not logged on: FIX.4.4:D1->FXCM");
    }
}
