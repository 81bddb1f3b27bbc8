//! Gateway Metrics
//!
//! Counters and gauges the services record through the `metrics` facade.
//! Without an installed recorder every call is a no-op; the Prometheus
//! recorder lives in the infrastructure layer.
//!
//! - **Inbound**: Messages dispatched, by message kind
//! - **Outbound**: Requests handed to the engine, by request kind
//! - **Drops**: Requests dropped because no session holds the needed role
//! - **State**: Known accounts and active market data subscriptions

use metrics::{counter, gauge};

use crate::domain::session::SessionRole;

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Metric labels for inbound message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundKind {
    /// TradingSessionStatus.
    SessionStatus,
    /// CollateralInquiryAck.
    CollateralAck,
    /// CollateralReport.
    CollateralReport,
    /// RequestForPositionsAck.
    PositionsAck,
    /// PositionReport.
    PositionReport,
    /// MarketDataRequestReject.
    MarketDataReject,
    /// MarketDataSnapshotFullRefresh.
    MarketDataSnapshot,
    /// ExecutionReport.
    ExecutionReport,
}

impl InboundKind {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SessionStatus => "session_status",
            Self::CollateralAck => "collateral_ack",
            Self::CollateralReport => "collateral_report",
            Self::PositionsAck => "positions_ack",
            Self::PositionReport => "position_report",
            Self::MarketDataReject => "market_data_reject",
            Self::MarketDataSnapshot => "market_data_snapshot",
            Self::ExecutionReport => "execution_report",
        }
    }
}

/// Metric labels for outbound request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// TradingSessionStatusRequest.
    TradingStatus,
    /// CollateralInquiry.
    Accounts,
    /// RequestForPositions.
    Positions,
    /// MarketDataRequest (subscribe).
    Subscribe,
    /// MarketDataRequest (unsubscribe).
    Unsubscribe,
    /// NewOrderSingle.
    MarketOrder,
}

impl RequestKind {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TradingStatus => "trading_status",
            Self::Accounts => "accounts",
            Self::Positions => "positions",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::MarketOrder => "market_order",
        }
    }
}

/// Record an inbound message routed to a handler.
pub fn record_inbound(kind: InboundKind) {
    counter!(
        "fix_gateway_inbound_messages_total",
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record a request handed to the engine.
pub fn record_outbound(kind: RequestKind) {
    counter!(
        "fix_gateway_outbound_requests_total",
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record a request dropped for lack of a session with the given role.
pub fn record_dropped(role: SessionRole) {
    counter!(
        "fix_gateway_dropped_requests_total",
        "role" => role.as_str()
    )
    .increment(1);
}

/// Record a send the engine refused.
pub fn record_send_failure() {
    counter!("fix_gateway_send_failures_total").increment(1);
}

/// Update the discovered account count.
#[allow(clippy::cast_precision_loss)]
pub fn set_accounts(count: usize) {
    gauge!("fix_gateway_accounts").set(count as f64);
}

/// Update the active subscription count.
#[allow(clippy::cast_precision_loss)]
pub fn set_active_subscriptions(count: usize) {
    gauge!("fix_gateway_active_subscriptions").set(count as f64);
}

// =============================================================================
// Tests
// =============================================================================
