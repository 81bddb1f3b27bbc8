//! Gateway Orchestrator
//!
//! The object the protocol engine's callbacks and the command surface
//! invoke. Owns all gateway state, drives the discovery flow, and issues
//! outbound requests through the [`SessionEngine`] port.
//!
//! # Concurrency
//!
//! Every structure sits behind its own lock and no call acquires two of
//! them at once. No lock is held while the engine is called, so an engine
//! that delivers callbacks synchronously cannot deadlock the orchestrator.
//!
//! # Dropped Requests
//!
//! A request whose session role has no registered session is dropped with
//! a warning and counted in `fix_gateway_dropped_requests_total`; it is not
//! an error. A send the engine refuses aborts the current operation,
//! including any remaining per-account fan-out, and is returned as
//! [`GatewayError::Engine`]. Nothing is retried. A refused subscribe or
//! unsubscribe leaves the subscription as it was before the call.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use super::decorator::OutboundDecorator;
use super::dispatcher::{InboundHandler, MessageDispatcher};
use crate::application::metrics::{self, RequestKind};
use crate::application::ports::{EngineError, SessionEngine};
use crate::domain::account::AccountLedger;
use crate::domain::discovery::{DiscoveryAction, DiscoveryFlow, DiscoveryState};
use crate::domain::fix::FixMessage;
use crate::domain::inbound::{
    CollateralAck, CollateralReport, ExecutionReport, MarketDataReject, MarketDataSnapshot,
    PositionReport, PositionsAck, TradingSessionStatus,
};
use crate::domain::request_id::RequestIdAllocator;
use crate::domain::requests::{self, MarketOrderParams};
use crate::domain::session::{SessionId, SessionRegistry, SessionRole};
use crate::domain::subscription::{SubscribeOutcome, Subscription, SubscriptionTracker, TokenPolicy};

// =============================================================================
// Error Types
// =============================================================================

/// Errors returned by gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The engine refused an outbound message.
    #[error("engine refused {kind} request: {source}")]
    Engine {
        /// Request kind being sent.
        kind: &'static str,
        /// Engine failure.
        #[source]
        source: EngineError,
    },
}

// =============================================================================
// Settings
// =============================================================================

/// Gateway behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    /// TradingSessionID (336) stamped on trading requests.
    pub trading_session_id: String,
    /// Symbols subscribed when a subscribe command names none.
    pub default_symbols: Vec<String>,
    /// Subscription token policy.
    pub token_policy: TokenPolicy,
    /// Market order used when an order command overrides nothing.
    pub default_order: MarketOrderParams,
}

// =============================================================================
// Snapshot
// =============================================================================

/// A registered session as shown in status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    /// Session display id.
    pub id: String,
    /// Session role.
    pub role: SessionRole,
}

/// Serializable view of the gateway state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewaySnapshot {
    /// Discovery state.
    pub discovery: DiscoveryState,
    /// Registered sessions in registration order.
    pub sessions: Vec<SessionView>,
    /// Discovered accounts in first-seen order.
    pub accounts: Vec<String>,
    /// Active market data subscriptions.
    pub subscriptions: Vec<Subscription>,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Trading gateway orchestrator.
pub struct GatewayOrchestrator {
    settings: GatewaySettings,
    ids: RequestIdAllocator,
    sessions: SessionRegistry,
    accounts: AccountLedger,
    subscriptions: SubscriptionTracker,
    discovery: Mutex<DiscoveryFlow>,
    decorator: OutboundDecorator,
    engine: Arc<dyn SessionEngine>,
}

impl GatewayOrchestrator {
    /// Create an orchestrator sending through `engine`.
    #[must_use]
    pub fn new(
        settings: GatewaySettings,
        decorator: OutboundDecorator,
        engine: Arc<dyn SessionEngine>,
    ) -> Self {
        let subscriptions = SubscriptionTracker::new(settings.token_policy);
        Self {
            settings,
            ids: RequestIdAllocator::new(),
            sessions: SessionRegistry::new(),
            accounts: AccountLedger::new(),
            subscriptions,
            discovery: Mutex::new(DiscoveryFlow::new()),
            decorator,
            engine,
        }
    }

    // -------------------------------------------------------------------------
    // Engine lifecycle callbacks
    // -------------------------------------------------------------------------

    /// A session was created. An explicit role wins over the naming
    /// convention.
    pub fn on_session_created(&self, session: SessionId, role: Option<SessionRole>) {
        let role = role.unwrap_or_else(|| SessionRole::derive(&session));
        tracing::info!(session = %session, role = %role, "Session created");
        if !self.sessions.register(session.clone(), role) {
            tracing::debug!(session = %session, "Session already registered");
        }
    }

    /// A session logged on. Logon of the trading session starts discovery.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the trading session status request cannot
    /// be sent.
    pub fn on_logon(&self, session: &SessionId) -> Result<(), GatewayError> {
        let role = self.role_of(session);
        tracing::info!(session = %session, role = %role, "Session logged on");

        if role != SessionRole::Trading {
            return Ok(());
        }

        let action = self.discovery.lock().on_logon();
        self.perform(action)
    }

    /// A session logged out. Logout of the trading session resets discovery;
    /// logout of the market data session ends every stream it carried.
    pub fn on_logout(&self, session: &SessionId) {
        let role = self.role_of(session);
        tracing::warn!(session = %session, role = %role, "Session logged out");

        match role {
            SessionRole::Trading => self.discovery.lock().on_logout(),
            SessionRole::MarketData => {
                let dropped = self.subscriptions.cancel_all();
                if !dropped.is_empty() {
                    tracing::info!(count = dropped.len(), "Subscriptions dropped with session");
                }
                metrics::set_active_subscriptions(self.subscriptions.stats().active);
            }
        }
    }

    /// Administrative message about to leave: credentials and routing.
    pub fn on_admin_outbound(&self, message: &mut FixMessage, session: &SessionId) {
        self.decorator.on_admin(message, session);
    }

    /// Application message about to leave: routing.
    pub fn on_app_outbound(&self, message: &mut FixMessage, session: &SessionId) {
        self.decorator.on_app(message, session);
    }

    /// Administrative message received.
    pub fn on_admin_inbound(&self, message: &FixMessage, session: &SessionId) {
        tracing::debug!(session = %session, message = %message, "Admin message received");
        MessageDispatcher::dispatch(self, message, session);
    }

    /// Application message received.
    pub fn on_app_inbound(&self, message: &FixMessage, session: &SessionId) {
        tracing::debug!(session = %session, message = %message, "App message received");
        MessageDispatcher::dispatch(self, message, session);
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Request positions, one request per known account.
    ///
    /// Returns the number of requests sent.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on the first send the engine refuses.
    pub fn query_positions(&self) -> Result<usize, GatewayError> {
        let accounts = self.accounts.all();
        if accounts.is_empty() {
            tracing::info!("No accounts discovered; no position requests sent");
            return Ok(0);
        }
        let Some(session) = self.resolve(SessionRole::Trading, RequestKind::Positions) else {
            return Ok(0);
        };

        for account in &accounts {
            let message = requests::positions_request(
                &self.ids.next(),
                account,
                &self.settings.trading_session_id,
                Utc::now(),
            );
            self.send(RequestKind::Positions, message, &session)?;
        }
        Ok(accounts.len())
    }

    /// Subscribe to market data. An empty list subscribes the configured
    /// symbol set.
    ///
    /// Returns the number of subscribe requests sent.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on the first send the engine refuses; the
    /// failed symbol is left unsubscribed.
    pub fn subscribe_market_data(&self, symbols: &[String]) -> Result<usize, GatewayError> {
        let symbols = if symbols.is_empty() {
            self.settings.default_symbols.as_slice()
        } else {
            symbols
        };
        let Some(session) = self.resolve(SessionRole::MarketData, RequestKind::Subscribe) else {
            return Ok(0);
        };

        let mut sent = 0;
        for symbol in symbols {
            let outcome = self.subscriptions.subscribe(symbol, &self.ids);
            if !outcome.requires_request() {
                tracing::info!(symbol = %symbol, token = outcome.token(), "Already subscribed");
                continue;
            }

            let message = requests::market_data_request(outcome.token(), symbol, true);
            if let Err(e) = self.send(RequestKind::Subscribe, message, &session) {
                // A re-issued stream is still live under its token.
                if matches!(outcome, SubscribeOutcome::New(_)) {
                    self.subscriptions.unsubscribe(symbol);
                }
                metrics::set_active_subscriptions(self.subscriptions.stats().active);
                return Err(e);
            }
            tracing::info!(symbol = %symbol, token = outcome.token(), "Subscribed to market data");
            sent += 1;
        }
        metrics::set_active_subscriptions(self.subscriptions.stats().active);
        Ok(sent)
    }

    /// Unsubscribe from market data. An empty list cancels every active
    /// subscription. Symbols without an active subscription are skipped.
    ///
    /// Returns the number of unsubscribe requests sent.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on the first send the engine refuses.
    pub fn unsubscribe_market_data(&self, symbols: &[String]) -> Result<usize, GatewayError> {
        let symbols = if symbols.is_empty() {
            self.subscriptions.active_symbols()
        } else {
            symbols.to_vec()
        };
        let Some(session) = self.resolve(SessionRole::MarketData, RequestKind::Unsubscribe) else {
            return Ok(0);
        };

        let mut sent = 0;
        for symbol in &symbols {
            let Some(token) = self.subscriptions.unsubscribe(symbol) else {
                tracing::info!(symbol = %symbol, "Not subscribed; nothing to cancel");
                continue;
            };

            let message = requests::market_data_request(&token, symbol, false);
            if let Err(e) = self.send(RequestKind::Unsubscribe, message, &session) {
                self.subscriptions.reactivate(symbol, &token);
                metrics::set_active_subscriptions(self.subscriptions.stats().active);
                return Err(e);
            }
            tracing::info!(symbol = %symbol, token = %token, "Unsubscribed from market data");
            sent += 1;
        }
        metrics::set_active_subscriptions(self.subscriptions.stats().active);
        Ok(sent)
    }

    /// Send a market order to every known account. `None` uses the
    /// configured default order.
    ///
    /// Returns the number of orders sent.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on the first send the engine refuses.
    pub fn market_order(&self, params: Option<MarketOrderParams>) -> Result<usize, GatewayError> {
        let params = params.unwrap_or_else(|| self.settings.default_order.clone());
        let accounts = self.accounts.all();
        if accounts.is_empty() {
            tracing::info!("No accounts discovered; no orders sent");
            return Ok(0);
        }
        let Some(session) = self.resolve(SessionRole::Trading, RequestKind::MarketOrder) else {
            return Ok(0);
        };

        for account in &accounts {
            let cl_ord_id = self.ids.next();
            let message = requests::market_order(
                &cl_ord_id,
                account,
                &params,
                &self.settings.trading_session_id,
                Utc::now(),
            );
            self.send(RequestKind::MarketOrder, message, &session)?;
            tracing::info!(
                cl_ord_id = %cl_ord_id,
                account = %account,
                symbol = %params.symbol,
                side = %params.side,
                quantity = %params.quantity,
                "Market order sent"
            );
        }
        Ok(accounts.len())
    }

    /// Mark discovery complete. Returns `true` if the flow moved to `Ready`.
    pub fn complete_discovery(&self) -> bool {
        let completed = self.discovery.lock().complete();
        if completed {
            tracing::info!(accounts = self.accounts.len(), "Discovery complete");
        } else {
            tracing::debug!(state = %self.discovery_state(), "Discovery not awaiting accounts");
        }
        completed
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Gateway settings.
    #[must_use]
    pub const fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Current discovery state.
    #[must_use]
    pub fn discovery_state(&self) -> DiscoveryState {
        self.discovery.lock().state()
    }

    /// Discovered accounts in first-seen order.
    #[must_use]
    pub fn accounts(&self) -> Vec<String> {
        self.accounts.all()
    }

    /// Active market data subscriptions.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.active()
    }

    /// Session currently resolved for a role.
    #[must_use]
    pub fn session_for(&self, role: SessionRole) -> Option<SessionId> {
        self.sessions.resolve(role)
    }

    /// Point-in-time view of the gateway state.
    #[must_use]
    pub fn snapshot(&self) -> GatewaySnapshot {
        GatewaySnapshot {
            discovery: self.discovery_state(),
            sessions: self
                .sessions
                .sessions()
                .into_iter()
                .map(|(id, role)| SessionView {
                    id: id.to_string(),
                    role,
                })
                .collect(),
            accounts: self.accounts.all(),
            subscriptions: self.subscriptions.active(),
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn role_of(&self, session: &SessionId) -> SessionRole {
        self.sessions.role_of(session).unwrap_or_else(|| {
            tracing::warn!(session = %session, "Event for unregistered session; deriving role");
            SessionRole::derive(session)
        })
    }

    fn perform(&self, action: DiscoveryAction) -> Result<(), GatewayError> {
        match action {
            DiscoveryAction::None => Ok(()),
            DiscoveryAction::RequestTradingStatus => self.request_trading_status(),
            DiscoveryAction::RequestAccounts => self.request_accounts(),
        }
    }

    fn request_trading_status(&self) -> Result<(), GatewayError> {
        let Some(session) = self.resolve(SessionRole::Trading, RequestKind::TradingStatus) else {
            return Ok(());
        };
        let message =
            requests::trading_status_request(&self.ids.next(), &self.settings.trading_session_id);
        self.send(RequestKind::TradingStatus, message, &session)
    }

    fn request_accounts(&self) -> Result<(), GatewayError> {
        let Some(session) = self.resolve(SessionRole::Trading, RequestKind::Accounts) else {
            return Ok(());
        };
        let message =
            requests::accounts_request(&self.ids.next(), &self.settings.trading_session_id);
        self.send(RequestKind::Accounts, message, &session)
    }

    fn resolve(&self, role: SessionRole, kind: RequestKind) -> Option<SessionId> {
        let session = self.sessions.resolve(role);
        if session.is_none() {
            tracing::warn!(role = %role, request = kind.as_str(), "No session for role; request dropped");
            metrics::record_dropped(role);
        }
        session
    }

    fn send(
        &self,
        kind: RequestKind,
        message: FixMessage,
        session: &SessionId,
    ) -> Result<(), GatewayError> {
        tracing::debug!(session = %session, request = kind.as_str(), message = %message, "Sending request");
        self.engine.send(message, session).map_err(|source| {
            metrics::record_send_failure();
            tracing::error!(session = %session, request = kind.as_str(), error = %source, "Send failed");
            GatewayError::Engine {
                kind: kind.as_str(),
                source,
            }
        })?;
        metrics::record_outbound(kind);
        Ok(())
    }
}

impl std::fmt::Debug for GatewayOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayOrchestrator")
            .field("settings", &self.settings)
            .field("sessions", &self.sessions)
            .field("accounts", &self.accounts)
            .field("subscriptions", &self.subscriptions)
            .field("discovery", &self.discovery)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Inbound Handlers
// =============================================================================

impl InboundHandler for GatewayOrchestrator {
    fn on_session_status(&self, status: &TradingSessionStatus, session: &SessionId) {
        tracing::info!(
            session = %session,
            open = status.is_open(),
            securities = status.securities.len(),
            parameters = status.parameters.len(),
            "Trading session status"
        );
        for parameter in &status.parameters {
            tracing::debug!(name = %parameter.name, value = %parameter.value, "System parameter");
        }

        let action = self.discovery.lock().on_session_status();
        if let Err(e) = self.perform(action) {
            tracing::error!(error = %e, "Accounts request failed");
        }
    }

    fn on_collateral_ack(&self, ack: &CollateralAck, session: &SessionId) {
        tracing::info!(
            session = %session,
            inquiry_id = ack.inquiry_id.as_deref().unwrap_or_default(),
            total_reports = ?ack.total_reports,
            "Collateral inquiry acknowledged"
        );
    }

    fn on_collateral_report(&self, report: &CollateralReport, session: &SessionId) {
        let Some(account) = report.account.as_deref() else {
            tracing::warn!(session = %session, "Collateral report without account");
            return;
        };

        if self.accounts.record(account) {
            tracing::info!(
                account = %account,
                balance = ?report.balance,
                "Account discovered"
            );
            metrics::set_accounts(self.accounts.len());
        }
        for sub_id in &report.party_sub_ids {
            tracing::debug!(
                account = %account,
                kind = sub_id.kind.as_deref().unwrap_or_default(),
                value = sub_id.value.as_deref().unwrap_or_default(),
                "Account party"
            );
        }
        self.discovery.lock().on_account_report();
    }

    fn on_positions_ack(&self, ack: &PositionsAck, session: &SessionId) {
        tracing::info!(
            session = %session,
            request_id = ack.request_id.as_deref().unwrap_or_default(),
            total_reports = ?ack.total_reports,
            "Positions request acknowledged"
        );
        if let Some(text) = &ack.text {
            tracing::info!(text = %text, no_positions = ack.no_positions(), "Positions request note");
        }
    }

    fn on_position_report(&self, report: &PositionReport, _session: &SessionId) {
        tracing::info!(
            account = report.account.as_deref().unwrap_or_default(),
            symbol = report.symbol.as_deref().unwrap_or_default(),
            position_id = report.position_id.as_deref().unwrap_or_default(),
            open_time = report.open_time.as_deref().unwrap_or_default(),
            "Position report"
        );
    }

    fn on_market_data_reject(&self, reject: &MarketDataReject, session: &SessionId) {
        tracing::warn!(
            session = %session,
            token = reject.request_id.as_deref().unwrap_or_default(),
            reason = reject.reason.as_deref().unwrap_or_default(),
            text = reject.text.as_deref().unwrap_or_default(),
            "Market data request rejected"
        );

        if let Some(symbol) = reject
            .request_id
            .as_deref()
            .and_then(|token| self.subscriptions.on_reject(token))
        {
            tracing::info!(symbol = %symbol, "Subscription cancelled after reject");
            metrics::set_active_subscriptions(self.subscriptions.stats().active);
        }
    }

    fn on_market_data_snapshot(&self, snapshot: &MarketDataSnapshot, _session: &SessionId) {
        tracing::info!(
            symbol = snapshot.symbol.as_deref().unwrap_or_default(),
            bid = ?snapshot.bid,
            ask = ?snapshot.ask,
            high = ?snapshot.high,
            low = ?snapshot.low,
            "Market data snapshot"
        );
    }

    fn on_execution_report(&self, report: &ExecutionReport, _session: &SessionId) {
        tracing::info!(
            cl_ord_id = report.cl_ord_id.as_deref().unwrap_or_default(),
            account = report.account.as_deref().unwrap_or_default(),
            order_id = report.order_id.as_deref().unwrap_or_default(),
            last_qty = ?report.last_qty,
            cum_qty = ?report.cum_qty,
            exec_type = report.exec_type.as_deref().unwrap_or_default(),
            ord_status = report.ord_status.as_deref().unwrap_or_default(),
            "Execution report"
        );
        if report.is_terminal() {
            tracing::info!(
                cl_ord_id = report.cl_ord_id.as_deref().unwrap_or_default(),
                cum_qty = ?report.cum_qty,
                "Order completed"
            );
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::application::ports::RecordingEngine;
    use crate::domain::fix::{FieldMap, MsgType, tags};
    use crate::domain::requests::OrderSide;

    fn trading() -> SessionId {
        SessionId::new("FIX.4.4", "D1", "FXCM")
    }

    fn market_data() -> SessionId {
        SessionId::new("FIX.4.4", "MD_D1", "FXCM")
    }

    fn settings(token_policy: TokenPolicy) -> GatewaySettings {
        GatewaySettings {
            trading_session_id: "FXCM".to_string(),
            default_symbols: vec!["EUR/USD".to_string(), "EUR/JPY".to_string()],
            token_policy,
            default_order: MarketOrderParams {
                symbol: "EUR/USD".to_string(),
                side: OrderSide::Buy,
                quantity: dec!(10000),
            },
        }
    }

    fn gateway(token_policy: TokenPolicy) -> (GatewayOrchestrator, Arc<RecordingEngine>) {
        let engine = Arc::new(RecordingEngine::new());
        let decorator = OutboundDecorator::new("user", "pass")
            .with_target_sub_id(trading(), "U100D1")
            .with_target_sub_id(market_data(), "U100D1");
        let gateway = GatewayOrchestrator::new(settings(token_policy), decorator, engine.clone());
        gateway.on_session_created(trading(), None);
        gateway.on_session_created(market_data(), None);
        (gateway, engine)
    }

    fn collateral_report(account: &str) -> FixMessage {
        FixMessage::new(MsgType::CollateralReport).with(tags::ACCOUNT, account)
    }

    #[test]
    fn trading_logon_requests_session_status() {
        let (gateway, engine) = gateway(TokenPolicy::Fresh);
        gateway.on_logon(&trading()).unwrap();

        let sent = engine.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].session, trading());
        assert_eq!(
            sent[0].message.msg_type(),
            Some(MsgType::TradingSessionStatusRequest)
        );
        assert_eq!(gateway.discovery_state(), DiscoveryState::AwaitingSessionStatus);
    }

    #[test]
    fn market_data_logon_does_not_drive_discovery() {
        let (gateway, engine) = gateway(TokenPolicy::Fresh);
        gateway.on_logon(&market_data()).unwrap();

        assert!(engine.is_empty());
        assert_eq!(gateway.discovery_state(), DiscoveryState::AwaitingLogon);
    }

    #[test]
    fn session_status_requests_accounts_once() {
        let (gateway, engine) = gateway(TokenPolicy::Fresh);
        gateway.on_logon(&trading()).unwrap();
        engine.take();

        let status = FixMessage::new(MsgType::TradingSessionStatus).with(tags::TRAD_SES_STATUS, "2");
        gateway.on_app_inbound(&status, &trading());
        gateway.on_app_inbound(&status, &trading());

        let sent = engine.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.msg_type(), Some(MsgType::CollateralInquiry));
        assert_eq!(gateway.discovery_state(), DiscoveryState::AwaitingAccounts);
    }

    #[test]
    fn collateral_reports_feed_ledger() {
        let (gateway, _) = gateway(TokenPolicy::Fresh);
        gateway.on_app_inbound(&collateral_report("U1000"), &trading());
        gateway.on_app_inbound(&collateral_report("U2000"), &trading());
        gateway.on_app_inbound(&collateral_report("U1000"), &trading());
        gateway.on_app_inbound(&FixMessage::new(MsgType::CollateralReport), &trading());

        assert_eq!(gateway.accounts(), vec!["U1000", "U2000"]);
    }

    #[test]
    fn positions_fan_out_per_account() {
        let (gateway, engine) = gateway(TokenPolicy::Fresh);
        gateway.on_app_inbound(&collateral_report("A"), &trading());
        gateway.on_app_inbound(&collateral_report("B"), &trading());

        assert_eq!(gateway.query_positions().unwrap(), 2);

        let sent = engine.sent();
        let ids: Vec<_> = sent
            .iter()
            .map(|s| s.message.get(tags::POS_REQ_ID).unwrap().to_string())
            .collect();
        assert_eq!(sent.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(sent[0].message.get(tags::ACCOUNT), Some("A"));
        assert_eq!(sent[1].message.get(tags::ACCOUNT), Some("B"));
    }

    #[test]
    fn positions_without_accounts_sends_nothing() {
        let (gateway, engine) = gateway(TokenPolicy::Fresh);
        assert_eq!(gateway.query_positions().unwrap(), 0);
        assert!(engine.is_empty());
    }

    #[test]
    fn subscribe_defaults_to_configured_symbols() {
        let (gateway, engine) = gateway(TokenPolicy::PerSymbol);
        assert_eq!(gateway.subscribe_market_data(&[]).unwrap(), 2);

        let sent = engine.sent();
        assert!(sent.iter().all(|s| s.session == market_data()));
        assert_eq!(sent[0].message.get(tags::MD_REQ_ID), Some("EUR/USD_Request_"));
        assert_eq!(sent[1].message.get(tags::MD_REQ_ID), Some("EUR/JPY_Request_"));
    }

    #[test]
    fn unsubscribe_reuses_subscribe_token() {
        let (gateway, engine) = gateway(TokenPolicy::Fresh);
        let symbols = vec!["EUR/USD".to_string()];
        gateway.subscribe_market_data(&symbols).unwrap();
        gateway.unsubscribe_market_data(&symbols).unwrap();

        let sent = engine.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[0].message.get(tags::MD_REQ_ID),
            sent[1].message.get(tags::MD_REQ_ID)
        );
        assert_eq!(sent[1].message.get(tags::SUBSCRIPTION_REQUEST_TYPE), Some("2"));
        assert!(gateway.subscriptions().is_empty());
    }

    #[test]
    fn unsubscribe_all_and_unknown() {
        let (gateway, engine) = gateway(TokenPolicy::Fresh);
        gateway.subscribe_market_data(&[]).unwrap();
        engine.take();

        assert_eq!(gateway.unsubscribe_market_data(&[]).unwrap(), 2);
        assert_eq!(gateway.unsubscribe_market_data(&[]).unwrap(), 0);
        assert_eq!(
            gateway
                .unsubscribe_market_data(&["USD/CHF".to_string()])
                .unwrap(),
            0
        );
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn market_data_reject_cancels_subscription() {
        let (gateway, _) = gateway(TokenPolicy::PerSymbol);
        gateway.subscribe_market_data(&["EUR/USD".to_string()]).unwrap();

        let reject = FixMessage::new(MsgType::MarketDataRequestReject)
            .with(tags::MD_REQ_ID, "EUR/USD_Request_")
            .with(tags::TEXT, "Unknown symbol");
        gateway.on_app_inbound(&reject, &market_data());

        assert!(gateway.subscriptions().is_empty());
    }

    #[test]
    fn missing_market_data_session_drops_request() {
        let engine = Arc::new(RecordingEngine::new());
        let gateway = GatewayOrchestrator::new(
            settings(TokenPolicy::Fresh),
            OutboundDecorator::new("user", "pass"),
            engine.clone(),
        );
        gateway.on_session_created(trading(), None);

        assert_eq!(gateway.subscribe_market_data(&[]).unwrap(), 0);
        assert!(engine.is_empty());
        assert!(gateway.subscriptions().is_empty());
    }

    #[test]
    fn market_order_uses_defaults_and_overrides() {
        let (gateway, engine) = gateway(TokenPolicy::Fresh);
        gateway.on_app_inbound(&collateral_report("A"), &trading());
        gateway.on_app_inbound(&collateral_report("B"), &trading());

        assert_eq!(gateway.market_order(None).unwrap(), 2);
        let overridden = MarketOrderParams {
            symbol: "EUR/GBP".to_string(),
            side: OrderSide::Sell,
            quantity: dec!(5000),
        };
        assert_eq!(gateway.market_order(Some(overridden)).unwrap(), 2);

        let sent = engine.sent();
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0].message.get(tags::SYMBOL), Some("EUR/USD"));
        assert_eq!(sent[0].message.get(tags::SIDE), Some("1"));
        assert_eq!(sent[3].message.get(tags::SYMBOL), Some("EUR/GBP"));
        assert_eq!(sent[3].message.get(tags::SIDE), Some("2"));
        assert_eq!(sent[3].message.get(tags::ORDER_QTY), Some("5000"));
    }

    #[test]
    fn logout_resets_and_next_logon_restarts() {
        let (gateway, engine) = gateway(TokenPolicy::Fresh);
        gateway.on_logon(&trading()).unwrap();
        gateway.on_logout(&trading());
        assert_eq!(gateway.discovery_state(), DiscoveryState::Disconnected);

        gateway.on_logon(&trading()).unwrap();
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn market_data_logout_ends_streams() {
        let (gateway, engine) = gateway(TokenPolicy::Fresh);
        gateway.on_logon(&trading()).unwrap();
        gateway.on_app_inbound(&collateral_report("U1000"), &trading());
        gateway.subscribe_market_data(&[]).unwrap();
        assert_eq!(gateway.subscriptions().len(), 2);
        let discovery = gateway.discovery_state();

        gateway.on_logout(&market_data());
        assert!(gateway.subscriptions().is_empty());
        assert_eq!(gateway.accounts(), vec!["U1000".to_string()]);
        assert_eq!(gateway.discovery_state(), discovery);

        let before = engine.len();
        gateway.on_logon(&market_data()).unwrap();
        assert_eq!(gateway.subscribe_market_data(&[]).unwrap(), 2);
        assert_eq!(engine.len(), before + 2);
    }

    #[test]
    fn complete_discovery_only_after_accounts_requested() {
        let (gateway, _) = gateway(TokenPolicy::Fresh);
        assert!(!gateway.complete_discovery());

        gateway.on_logon(&trading()).unwrap();
        gateway.on_app_inbound(&FixMessage::new(MsgType::TradingSessionStatus), &trading());
        assert!(gateway.complete_discovery());
        assert_eq!(gateway.discovery_state(), DiscoveryState::Ready);
    }

    #[test]
    fn outbound_callbacks_decorate() {
        let (gateway, _) = gateway(TokenPolicy::Fresh);
        let mut logon = FixMessage::new(MsgType::Logon);
        gateway.on_admin_outbound(&mut logon, &trading());
        assert_eq!(logon.get(tags::USERNAME), Some("user"));

        let mut request = FixMessage::new(MsgType::MarketDataRequest);
        gateway.on_app_outbound(&mut request, &market_data());
        assert_eq!(request.header().get(tags::TARGET_SUB_ID), Some("U100D1"));
    }

    #[test]
    fn snapshot_reflects_state() {
        let (gateway, _) = gateway(TokenPolicy::Fresh);
        gateway.on_app_inbound(&collateral_report("U1000"), &trading());
        gateway.subscribe_market_data(&["EUR/USD".to_string()]).unwrap();

        let snapshot = gateway.snapshot();
        assert_eq!(snapshot.discovery, DiscoveryState::AwaitingLogon);
        assert_eq!(snapshot.sessions.len(), 2);
        assert_eq!(snapshot.sessions[1].role, SessionRole::MarketData);
        assert_eq!(snapshot.accounts, vec!["U1000"]);
        assert_eq!(snapshot.subscriptions.len(), 1);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["discovery"], "awaiting_logon");
        assert_eq!(json["sessions"][0]["role"], "trading");
    }

    #[test]
    fn party_groups_are_tolerated() {
        let (gateway, _) = gateway(TokenPolicy::Fresh);
        let report = collateral_report("U1000").with_group(
            tags::NO_PARTY_IDS,
            FieldMap::new().with_group(
                tags::NO_PARTY_SUB_IDS,
                FieldMap::new().with(tags::PARTY_SUB_ID_TYPE, "2"),
            ),
        );
        gateway.on_app_inbound(&report, &trading());
        assert_eq!(gateway.accounts(), vec!["U1000"]);
    }
}
