//! Integration tests for engine send failures, using a mocked engine port.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use fix_gateway::application::services::{GatewaySettings, OutboundDecorator};
use fix_gateway::domain::fix::tags;
use fix_gateway::domain::requests::{MarketOrderParams, OrderSide};
use fix_gateway::{
    EngineError, FixMessage, GatewayError, GatewayOrchestrator, MsgType, SessionEngine, SessionId,
    TokenPolicy,
};
use mockall::mock;
use rust_decimal::Decimal;
use tokio_test::assert_err;

mock! {
    pub Engine {}

    impl SessionEngine for Engine {
        fn send(&self, message: FixMessage, session: &SessionId) -> Result<(), EngineError>;
    }
}

fn trading() -> SessionId {
    SessionId::new("FIX.4.4", "D1", "FXCM")
}

fn md() -> SessionId {
    SessionId::new("FIX.4.4", "MD_D1", "FXCM")
}

fn is(msg_type: MsgType) -> impl Fn(&FixMessage, &SessionId) -> bool {
    move |message, _| message.msg_type() == Some(msg_type)
}

fn refused() -> EngineError {
    EngineError::NotLoggedOn {
        session: trading().to_string(),
    }
}

/// Engine that accepts the discovery requests.
fn discovery_engine() -> MockEngine {
    let mut engine = MockEngine::new();
    engine
        .expect_send()
        .withf(is(MsgType::TradingSessionStatusRequest))
        .returning(|_, _| Ok(()));
    engine
        .expect_send()
        .withf(is(MsgType::CollateralInquiry))
        .returning(|_, _| Ok(()));
    engine
}

fn gateway(engine: MockEngine) -> GatewayOrchestrator {
    gateway_with_policy(engine, TokenPolicy::Fresh)
}

fn gateway_with_policy(engine: MockEngine, token_policy: TokenPolicy) -> GatewayOrchestrator {
    let settings = GatewaySettings {
        trading_session_id: "FXCM".to_string(),
        default_symbols: vec!["EUR/USD".to_string(), "EUR/JPY".to_string()],
        token_policy,
        default_order: MarketOrderParams {
            symbol: "EUR/USD".to_string(),
            side: OrderSide::Buy,
            quantity: Decimal::from(10_000),
        },
    };
    let gateway = GatewayOrchestrator::new(
        settings,
        OutboundDecorator::new("trader", "secret"),
        Arc::new(engine),
    );
    gateway.on_session_created(trading(), None);
    gateway.on_session_created(md(), None);
    gateway
}

fn discover(gateway: &GatewayOrchestrator, accounts: &[&str]) {
    gateway.on_logon(&trading()).unwrap();
    gateway.on_app_inbound(
        &FixMessage::new(MsgType::TradingSessionStatus).with(tags::TRAD_SES_STATUS, "2"),
        &trading(),
    );
    for account in accounts {
        gateway.on_app_inbound(
            &FixMessage::new(MsgType::CollateralReport).with(tags::ACCOUNT, *account),
            &trading(),
        );
    }
}

#[test]
fn failed_positions_send_aborts_fan_out() {
    let mut engine = discovery_engine();
    engine
        .expect_send()
        .withf(is(MsgType::RequestForPositions))
        .times(1)
        .returning(|_, _| Err(refused()));
    let gateway = gateway(engine);
    discover(&gateway, &["A", "B"]);

    let err = assert_err!(gateway.query_positions());
    assert!(matches!(
        err,
        GatewayError::Engine {
            kind: "positions",
            source: EngineError::NotLoggedOn { .. }
        }
    ));
}

#[test]
fn failed_order_send_aborts_fan_out() {
    let mut engine = discovery_engine();
    engine
        .expect_send()
        .withf(is(MsgType::NewOrderSingle))
        .times(1)
        .returning(|_, _| Err(refused()));
    let gateway = gateway(engine);
    discover(&gateway, &["A", "B", "C"]);

    assert_err!(gateway.market_order(None));
}

#[test]
fn failed_logon_request_is_returned() {
    let mut engine = MockEngine::new();
    engine
        .expect_send()
        .withf(is(MsgType::TradingSessionStatusRequest))
        .times(1)
        .returning(|_, _| Err(refused()));
    let gateway = gateway(engine);

    let err = assert_err!(gateway.on_logon(&trading()));
    assert!(err.to_string().contains("trading_status"));
}

#[test]
fn failed_subscribe_leaves_symbol_unsubscribed() {
    let mut engine = MockEngine::new();
    engine
        .expect_send()
        .withf(|message, session| {
            message.msg_type() == Some(MsgType::MarketDataRequest) && *session == md()
        })
        .times(1)
        .returning(|_, _| {
            Err(EngineError::SendFailed {
                message: "socket closed".to_string(),
            })
        });
    let gateway = gateway(engine);

    assert_err!(gateway.subscribe_market_data(&[]));
    assert!(gateway.subscriptions().is_empty());
}

#[test]
fn failed_resubscribe_keeps_live_stream() {
    let calls = AtomicUsize::new(0);
    let mut engine = MockEngine::new();
    engine
        .expect_send()
        .withf(is(MsgType::MarketDataRequest))
        .times(2)
        .returning(move |_, _| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(())
            } else {
                Err(refused())
            }
        });
    let gateway = gateway_with_policy(engine, TokenPolicy::PerSymbol);
    let symbols = vec!["EUR/USD".to_string()];

    assert_eq!(gateway.subscribe_market_data(&symbols).unwrap(), 1);
    assert_err!(gateway.subscribe_market_data(&symbols));

    let active = gateway.subscriptions();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].token, "EUR/USD_Request_");
}

#[test]
fn failed_unsubscribe_keeps_subscription() {
    let mut engine = MockEngine::new();
    engine
        .expect_send()
        .withf(|message, _| message.get(tags::SUBSCRIPTION_REQUEST_TYPE) == Some("1"))
        .times(1)
        .returning(|_, _| Ok(()));
    engine
        .expect_send()
        .withf(|message, _| message.get(tags::SUBSCRIPTION_REQUEST_TYPE) == Some("2"))
        .times(2)
        .returning(|_, _| Err(refused()));
    let gateway = gateway(engine);
    let symbols = vec!["EUR/USD".to_string()];

    gateway.subscribe_market_data(&symbols).unwrap();
    let token = gateway.subscriptions()[0].token.clone();

    assert_err!(gateway.unsubscribe_market_data(&symbols));
    let active = gateway.subscriptions();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].token, token);

    // Still tracked, so the cancel is attempted again.
    assert_err!(gateway.unsubscribe_market_data(&[]));
}

#[test]
fn no_accounts_means_no_sends() {
    let gateway = gateway(discovery_engine());
    discover(&gateway, &[]);

    assert_eq!(gateway.query_positions().unwrap(), 0);
    assert_eq!(gateway.market_order(None).unwrap(), 0);
}
