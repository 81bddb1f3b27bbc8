//! Inbound Message Dispatcher
//!
//! Routes an inbound message to the typed handler for its `MsgType`.
//! Unknown kinds are ignored.

use crate::application::metrics::{self, InboundKind};
use crate::domain::fix::{FixMessage, MsgType};
use crate::domain::inbound::{
    CollateralAck, CollateralReport, ExecutionReport, MarketDataReject, MarketDataSnapshot,
    PositionReport, PositionsAck, TradingSessionStatus,
};
use crate::domain::session::SessionId;

/// Typed inbound callbacks. Every method defaults to a no-op.
#[allow(unused_variables)]
pub trait InboundHandler {
    /// TradingSessionStatus (h).
    fn on_session_status(&self, status: &TradingSessionStatus, session: &SessionId) {}

    /// CollateralInquiryAck (BG).
    fn on_collateral_ack(&self, ack: &CollateralAck, session: &SessionId) {}

    /// CollateralReport (BA).
    fn on_collateral_report(&self, report: &CollateralReport, session: &SessionId) {}

    /// RequestForPositionsAck (AO).
    fn on_positions_ack(&self, ack: &PositionsAck, session: &SessionId) {}

    /// PositionReport (AP).
    fn on_position_report(&self, report: &PositionReport, session: &SessionId) {}

    /// MarketDataRequestReject (Y).
    fn on_market_data_reject(&self, reject: &MarketDataReject, session: &SessionId) {}

    /// MarketDataSnapshotFullRefresh (W).
    fn on_market_data_snapshot(&self, snapshot: &MarketDataSnapshot, session: &SessionId) {}

    /// ExecutionReport (8).
    fn on_execution_report(&self, report: &ExecutionReport, session: &SessionId) {}
}

/// Stateless router from message kind to handler method.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Dispatch a message. Returns `false` if its kind has no handler.
    pub fn dispatch<H>(handler: &H, message: &FixMessage, session: &SessionId) -> bool
    where
        H: InboundHandler + ?Sized,
    {
        let Some(msg_type) = message.msg_type() else {
            tracing::debug!(
                session = %session,
                msg_type = message.msg_type_raw().unwrap_or_default(),
                "Ignoring unhandled message kind"
            );
            return false;
        };

        let kind = match msg_type {
            MsgType::TradingSessionStatus => {
                handler.on_session_status(&TradingSessionStatus::from_message(message), session);
                InboundKind::SessionStatus
            }
            MsgType::CollateralInquiryAck => {
                handler.on_collateral_ack(&CollateralAck::from_message(message), session);
                InboundKind::CollateralAck
            }
            MsgType::CollateralReport => {
                handler.on_collateral_report(&CollateralReport::from_message(message), session);
                InboundKind::CollateralReport
            }
            MsgType::RequestForPositionsAck => {
                handler.on_positions_ack(&PositionsAck::from_message(message), session);
                InboundKind::PositionsAck
            }
            MsgType::PositionReport => {
                handler.on_position_report(&PositionReport::from_message(message), session);
                InboundKind::PositionReport
            }
            MsgType::MarketDataRequestReject => {
                handler.on_market_data_reject(&MarketDataReject::from_message(message), session);
                InboundKind::MarketDataReject
            }
            MsgType::MarketDataSnapshotFullRefresh => {
                handler
                    .on_market_data_snapshot(&MarketDataSnapshot::from_message(message), session);
                InboundKind::MarketDataSnapshot
            }
            MsgType::ExecutionReport => {
                handler.on_execution_report(&ExecutionReport::from_message(message), session);
                InboundKind::ExecutionReport
            }
            other => {
                tracing::debug!(session = %session, msg_type = %other, "Ignoring unhandled message kind");
                return false;
            }
        };

        metrics::record_inbound(kind);
        true
    }
}
