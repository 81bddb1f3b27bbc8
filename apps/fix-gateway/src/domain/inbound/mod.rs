//! Inbound Message Views
//!
//! Typed, read-only views over the inbound messages the gateway handles.
//! Every field is optional: absent or unparsable fields become `None` and
//! every repeating group entry is visited.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::fix::{FieldMap, FixMessage, tags};

fn text(map: &FieldMap, tag: u32) -> Option<String> {
    map.get(tag).map(str::to_string)
}

// =============================================================================
// Trading Session Status (h)
// =============================================================================

/// `TradSesStatus` (340).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingSessionState {
    /// Trading desk open (2).
    Open,
    /// Trading desk closed (3).
    Closed,
    /// Any other status value.
    Other(String),
}

impl TradingSessionState {
    fn parse(value: &str) -> Self {
        match value {
            "2" => Self::Open,
            "3" => Self::Closed,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A FXCM system parameter carried on the session status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemParameter {
    /// Parameter name (9017).
    pub name: String,
    /// Parameter value (9018).
    pub value: String,
}

/// TradingSessionStatus with its embedded security list and system
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradingSessionStatus {
    /// Echoed TradSesReqID (335).
    pub request_id: Option<String>,
    /// Desk status (340).
    pub status: Option<TradingSessionState>,
    /// Tradable symbols (146 group of 55).
    pub securities: Vec<String>,
    /// System parameters (9016 group).
    pub parameters: Vec<SystemParameter>,
}

impl TradingSessionStatus {
    /// Read the view from a message.
    #[must_use]
    pub fn from_message(message: &FixMessage) -> Self {
        let body = message.body();
        Self {
            request_id: text(body, tags::TRAD_SES_REQ_ID),
            status: body.get(tags::TRAD_SES_STATUS).map(TradingSessionState::parse),
            securities: body
                .groups(tags::NO_RELATED_SYM)
                .iter()
                .filter_map(|entry| text(entry, tags::SYMBOL))
                .collect(),
            parameters: body
                .groups(tags::fxcm::NO_PARAMS)
                .iter()
                .filter_map(|entry| {
                    Some(SystemParameter {
                        name: text(entry, tags::fxcm::PARAM_NAME)?,
                        value: entry.get(tags::fxcm::PARAM_VALUE).unwrap_or_default().to_string(),
                    })
                })
                .collect(),
        }
    }

    /// Check if the desk reported itself open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == Some(TradingSessionState::Open)
    }
}

// =============================================================================
// Collateral (BG, BA)
// =============================================================================

/// CollateralInquiryAck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollateralAck {
    /// Echoed CollInquiryID (909).
    pub inquiry_id: Option<String>,
    /// CollInquiryStatus (945).
    pub status: Option<String>,
    /// Number of collateral reports that follow (911).
    pub total_reports: Option<u32>,
    /// Text (58).
    pub text: Option<String>,
}

impl CollateralAck {
    /// Read the view from a message.
    #[must_use]
    pub fn from_message(message: &FixMessage) -> Self {
        let body = message.body();
        Self {
            inquiry_id: text(body, tags::COLL_INQUIRY_ID),
            status: text(body, tags::COLL_INQUIRY_STATUS),
            total_reports: body.get_parsed(tags::TOT_NUM_REPORTS),
            text: text(body, tags::TEXT),
        }
    }
}

/// A party sub-id (802 group entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartySubId {
    /// PartySubIDType (803).
    pub kind: Option<String>,
    /// PartySubID (523).
    pub value: Option<String>,
}

/// CollateralReport: one per account under the login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollateralReport {
    /// Account id (1).
    pub account: Option<String>,
    /// Cash balance excluding open P/L (901).
    pub balance: Option<Decimal>,
    /// Party sub-ids across every party entry.
    pub party_sub_ids: Vec<PartySubId>,
}

impl CollateralReport {
    /// Read the view from a message.
    #[must_use]
    pub fn from_message(message: &FixMessage) -> Self {
        let body = message.body();
        Self {
            account: text(body, tags::ACCOUNT),
            balance: body.get_parsed(tags::CASH_OUTSTANDING),
            party_sub_ids: body
                .groups(tags::NO_PARTY_IDS)
                .iter()
                .flat_map(|party| party.groups(tags::NO_PARTY_SUB_IDS))
                .map(|sub| PartySubId {
                    kind: text(sub, tags::PARTY_SUB_ID_TYPE),
                    value: text(sub, tags::PARTY_SUB_ID),
                })
                .collect(),
        }
    }
}

// =============================================================================
// Positions (AO, AP)
// =============================================================================

/// RequestForPositionsAck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionsAck {
    /// Echoed PosReqID (710).
    pub request_id: Option<String>,
    /// TotalNumPosReports (727).
    pub total_reports: Option<u32>,
    /// PosReqResult (728).
    pub result: Option<String>,
    /// Text (58); set when no positions matched.
    pub text: Option<String>,
}

impl PositionsAck {
    /// Read the view from a message.
    #[must_use]
    pub fn from_message(message: &FixMessage) -> Self {
        let body = message.body();
        Self {
            request_id: text(body, tags::POS_REQ_ID),
            total_reports: body.get_parsed(tags::TOTAL_NUM_POS_REPORTS),
            result: text(body, tags::POS_REQ_RESULT),
            text: text(body, tags::TEXT),
        }
    }

    /// PosReqResult 2 means no positions matched the request.
    #[must_use]
    pub fn no_positions(&self) -> bool {
        self.result.as_deref() == Some("2")
    }
}

/// PositionReport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionReport {
    /// Echoed PosReqID (710).
    pub request_id: Option<String>,
    /// Account (1).
    pub account: Option<String>,
    /// Symbol (55).
    pub symbol: Option<String>,
    /// FXCM position id (9041).
    pub position_id: Option<String>,
    /// FXCM position open time (9042).
    pub open_time: Option<String>,
}

impl PositionReport {
    /// Read the view from a message.
    #[must_use]
    pub fn from_message(message: &FixMessage) -> Self {
        let body = message.body();
        Self {
            request_id: text(body, tags::POS_REQ_ID),
            account: text(body, tags::ACCOUNT),
            symbol: text(body, tags::SYMBOL),
            position_id: text(body, tags::fxcm::POS_ID),
            open_time: text(body, tags::fxcm::POS_OPEN_TIME),
        }
    }
}

// =============================================================================
// Market Data (Y, W)
// =============================================================================

/// MarketDataRequestReject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketDataReject {
    /// Token of the rejected request (262).
    pub request_id: Option<String>,
    /// MDReqRejReason (281).
    pub reason: Option<String>,
    /// Text (58).
    pub text: Option<String>,
}

impl MarketDataReject {
    /// Read the view from a message.
    #[must_use]
    pub fn from_message(message: &FixMessage) -> Self {
        let body = message.body();
        Self {
            request_id: text(body, tags::MD_REQ_ID),
            reason: text(body, tags::MD_REQ_REJ_REASON),
            text: text(body, tags::TEXT),
        }
    }
}

/// Top-of-book snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarketDataSnapshot {
    /// Token of the stream (262).
    pub request_id: Option<String>,
    /// Symbol (55).
    pub symbol: Option<String>,
    /// Bid price (entry type 0).
    pub bid: Option<Decimal>,
    /// Offer price (entry type 1).
    pub ask: Option<Decimal>,
    /// Session high (entry type 7).
    pub high: Option<Decimal>,
    /// Session low (entry type 8).
    pub low: Option<Decimal>,
}

impl MarketDataSnapshot {
    /// Read the view from a message.
    #[must_use]
    pub fn from_message(message: &FixMessage) -> Self {
        let body = message.body();
        let mut snapshot = Self {
            request_id: text(body, tags::MD_REQ_ID),
            symbol: text(body, tags::SYMBOL),
            ..Self::default()
        };

        for entry in body.groups(tags::NO_MD_ENTRIES) {
            let Some(price) = entry.get_parsed::<Decimal>(tags::MD_ENTRY_PX) else {
                continue;
            };
            match entry.get(tags::MD_ENTRY_TYPE) {
                Some("0") => snapshot.bid = Some(price),
                Some("1") => snapshot.ask = Some(price),
                Some("7") => snapshot.high = Some(price),
                Some("8") => snapshot.low = Some(price),
                _ => {}
            }
        }
        snapshot
    }

    /// Offer minus bid, when both sides are present.
    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.ask? - self.bid?)
    }
}

// =============================================================================
// Execution Report (8)
// =============================================================================

/// ExecutionReport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// ClOrdID (11).
    pub cl_ord_id: Option<String>,
    /// Account (1).
    pub account: Option<String>,
    /// OrderID (37).
    pub order_id: Option<String>,
    /// LastQty (32).
    pub last_qty: Option<Decimal>,
    /// CumQty (14).
    pub cum_qty: Option<Decimal>,
    /// ExecType (150).
    pub exec_type: Option<String>,
    /// OrdStatus (39).
    pub ord_status: Option<String>,
    /// Text (58).
    pub text: Option<String>,
}

impl ExecutionReport {
    /// Read the view from a message.
    #[must_use]
    pub fn from_message(message: &FixMessage) -> Self {
        let body = message.body();
        Self {
            cl_ord_id: text(body, tags::CL_ORD_ID),
            account: text(body, tags::ACCOUNT),
            order_id: text(body, tags::ORDER_ID),
            last_qty: body.get_parsed(tags::LAST_QTY),
            cum_qty: body.get_parsed(tags::CUM_QTY),
            exec_type: text(body, tags::EXEC_TYPE),
            ord_status: text(body, tags::ORD_STATUS),
            text: text(body, tags::TEXT),
        }
    }

    /// Filled (2), cancelled (4) and rejected (8) are final; `CumQty` then
    /// tells how much was filled.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.ord_status.as_deref(), Some("2" | "4" | "8"))
    }
}

// =============================================================================
// Tests
// =============================================================================
