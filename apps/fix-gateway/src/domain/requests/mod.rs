//! Outbound Request Builders
//!
//! Pure constructors for every request the gateway originates. Each one
//! takes its correlation id and, where the message carries a timestamp, the
//! current time, so the output is fully determined by the arguments.
//!
//! Session routing fields (TargetSubID, credentials) are never set here;
//! the outbound decorator adds them at the engine boundary.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::fix::{FieldMap, FixMessage, MsgType, tags};

/// `UTCTimestamp` format with milliseconds.
const TRANSACT_TIME_FORMAT: &str = "%Y%m%d-%H:%M:%S%.3f";

/// `LocalMktDate` format.
const BUSINESS_DATE_FORMAT: &str = "%Y%m%d";

/// Party id FXCM expects on position requests.
const FXCM_PARTY_ID: &str = "FXCM ID";

/// PartyIDSource: proprietary/custom code.
const PARTY_ID_SOURCE_PROPRIETARY: &str = "D";

/// PartyRole: client id.
const PARTY_ROLE_CLIENT_ID: &str = "3";

/// PartySubIDType: securities account number.
const PARTY_SUB_ID_TYPE_ACCOUNT: &str = "26";

/// AccountType: house trader.
const ACCOUNT_TYPE_HOUSE_TRADER: &str = "6";

/// Market data entry types requested on every subscription: bid, offer,
/// session high, session low.
pub const MD_ENTRY_TYPES: [&str; 4] = ["0", "1", "7", "8"];

// =============================================================================
// Subscription Request Type (263)
// =============================================================================

/// `SubscriptionRequestType` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionRequestType {
    /// Snapshot only (0).
    Snapshot,
    /// Snapshot plus updates (1).
    SnapshotAndUpdates,
    /// Disable previous snapshot plus updates (2).
    Disable,
}

impl SubscriptionRequestType {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Snapshot => "0",
            Self::SnapshotAndUpdates => "1",
            Self::Disable => "2",
        }
    }
}

// =============================================================================
// Order Parameters
// =============================================================================

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy order.
    Buy,
    /// Sell order.
    Sell,
}

impl OrderSide {
    /// FIX `Side` (54) value.
    #[must_use]
    pub const fn as_fix(&self) -> &'static str {
        match self {
            Self::Buy => "1",
            Self::Sell => "2",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Parameters of a market order fanned out to every account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOrderParams {
    /// Instrument symbol.
    pub symbol: String,
    /// Order side.
    pub side: OrderSide,
    /// Order quantity in base currency units.
    pub quantity: Decimal,
}

// =============================================================================
// Builders
// =============================================================================

/// TradingSessionStatusRequest (g) for the given trading session.
#[must_use]
pub fn trading_status_request(request_id: &str, trading_session_id: &str) -> FixMessage {
    FixMessage::new(MsgType::TradingSessionStatusRequest)
        .with(tags::TRAD_SES_REQ_ID, request_id)
        .with(tags::TRADING_SESSION_ID, trading_session_id)
        .with(
            tags::SUBSCRIPTION_REQUEST_TYPE,
            SubscriptionRequestType::Snapshot.as_str(),
        )
}

/// CollateralInquiry (BB): asks for one collateral report per account.
#[must_use]
pub fn accounts_request(request_id: &str, trading_session_id: &str) -> FixMessage {
    FixMessage::new(MsgType::CollateralInquiry)
        .with(tags::COLL_INQUIRY_ID, request_id)
        .with(tags::TRADING_SESSION_ID, trading_session_id)
        .with(
            tags::SUBSCRIPTION_REQUEST_TYPE,
            SubscriptionRequestType::Snapshot.as_str(),
        )
}

/// RequestForPositions (AN) for a single account.
#[must_use]
pub fn positions_request(
    request_id: &str,
    account: &str,
    trading_session_id: &str,
    now: DateTime<Utc>,
) -> FixMessage {
    let sub_party = FieldMap::new()
        .with(tags::PARTY_SUB_ID_TYPE, PARTY_SUB_ID_TYPE_ACCOUNT)
        .with(tags::PARTY_SUB_ID, account);
    let party = FieldMap::new()
        .with(tags::PARTY_ID, FXCM_PARTY_ID)
        .with(tags::PARTY_ID_SOURCE, PARTY_ID_SOURCE_PROPRIETARY)
        .with(tags::PARTY_ROLE, PARTY_ROLE_CLIENT_ID)
        .with_group(tags::NO_PARTY_SUB_IDS, sub_party);

    FixMessage::new(MsgType::RequestForPositions)
        .with(tags::POS_REQ_ID, request_id)
        // PosReqType 0 = positions
        .with(tags::POS_REQ_TYPE, "0")
        .with(tags::ACCOUNT, account)
        .with(
            tags::SUBSCRIPTION_REQUEST_TYPE,
            SubscriptionRequestType::Snapshot.as_str(),
        )
        .with(tags::ACCOUNT_TYPE, ACCOUNT_TYPE_HOUSE_TRADER)
        .with(tags::TRANSACT_TIME, format_transact_time(now))
        .with(
            tags::CLEARING_BUSINESS_DATE,
            now.format(BUSINESS_DATE_FORMAT).to_string(),
        )
        .with(tags::TRADING_SESSION_ID, trading_session_id)
        .with_group(tags::NO_PARTY_IDS, party)
}

/// MarketDataRequest (V) opening or closing a top-of-book stream.
#[must_use]
pub fn market_data_request(token: &str, symbol: &str, subscribe: bool) -> FixMessage {
    let request_type = if subscribe {
        SubscriptionRequestType::SnapshotAndUpdates
    } else {
        SubscriptionRequestType::Disable
    };

    let mut message = FixMessage::new(MsgType::MarketDataRequest)
        .with(tags::MD_REQ_ID, token)
        .with(tags::SUBSCRIPTION_REQUEST_TYPE, request_type.as_str())
        // MarketDepth 0 = full book as provided by FXCM (top of book)
        .with(tags::MARKET_DEPTH, "0")
        .with_group(
            tags::NO_RELATED_SYM,
            FieldMap::new().with(tags::SYMBOL, symbol),
        );

    for entry_type in MD_ENTRY_TYPES {
        message = message.with_group(
            tags::NO_MD_ENTRY_TYPES,
            FieldMap::new().with(tags::MD_ENTRY_TYPE, entry_type),
        );
    }
    message
}

/// NewOrderSingle (D): market order, good till cancel, for one account.
#[must_use]
pub fn market_order(
    cl_ord_id: &str,
    account: &str,
    params: &MarketOrderParams,
    trading_session_id: &str,
    now: DateTime<Utc>,
) -> FixMessage {
    FixMessage::new(MsgType::NewOrderSingle)
        .with(tags::CL_ORD_ID, cl_ord_id)
        .with(tags::ACCOUNT, account)
        .with(tags::SYMBOL, params.symbol.as_str())
        .with(tags::TRADING_SESSION_ID, trading_session_id)
        .with(tags::TRANSACT_TIME, format_transact_time(now))
        .with(tags::ORDER_QTY, params.quantity.normalize().to_string())
        .with(tags::SIDE, params.side.as_fix())
        // OrdType 1 = market
        .with(tags::ORD_TYPE, "1")
        // TimeInForce 1 = good till cancel
        .with(tags::TIME_IN_FORCE, "1")
}

fn format_transact_time(now: DateTime<Utc>) -> String {
    now.format(TRANSACT_TIME_FORMAT).to_string()
}

// =============================================================================
// Tests
// =============================================================================
