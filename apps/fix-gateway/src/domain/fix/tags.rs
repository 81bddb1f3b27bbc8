//! FIX 4.4 Field Tags
//!
//! Numeric tags for the standard fields the gateway reads or writes, plus
//! the FXCM custom fields that appear on FXCM-specific messages.

/// A FIX field tag.
pub type Tag = u32;

// =============================================================================
// Standard Header
// =============================================================================

/// MsgType (35).
pub const MSG_TYPE: Tag = 35;
/// TargetSubID (57).
pub const TARGET_SUB_ID: Tag = 57;

// =============================================================================
// Session Administration
// =============================================================================

/// Username (553).
pub const USERNAME: Tag = 553;
/// Password (554).
pub const PASSWORD: Tag = 554;

// =============================================================================
// Orders and Executions
// =============================================================================

/// Account (1).
pub const ACCOUNT: Tag = 1;
/// ClOrdID (11).
pub const CL_ORD_ID: Tag = 11;
/// CumQty (14).
pub const CUM_QTY: Tag = 14;
/// LastQty (32).
pub const LAST_QTY: Tag = 32;
/// OrderID (37).
pub const ORDER_ID: Tag = 37;
/// OrderQty (38).
pub const ORDER_QTY: Tag = 38;
/// OrdStatus (39).
pub const ORD_STATUS: Tag = 39;
/// OrdType (40).
pub const ORD_TYPE: Tag = 40;
/// Side (54).
pub const SIDE: Tag = 54;
/// Symbol (55).
pub const SYMBOL: Tag = 55;
/// Text (58).
pub const TEXT: Tag = 58;
/// TimeInForce (59).
pub const TIME_IN_FORCE: Tag = 59;
/// TransactTime (60).
pub const TRANSACT_TIME: Tag = 60;
/// ExecType (150).
pub const EXEC_TYPE: Tag = 150;

// =============================================================================
// Market Data
// =============================================================================

/// NoRelatedSym (146).
pub const NO_RELATED_SYM: Tag = 146;
/// MDReqID (262).
pub const MD_REQ_ID: Tag = 262;
/// SubscriptionRequestType (263).
pub const SUBSCRIPTION_REQUEST_TYPE: Tag = 263;
/// MarketDepth (264).
pub const MARKET_DEPTH: Tag = 264;
/// NoMDEntryTypes (267).
pub const NO_MD_ENTRY_TYPES: Tag = 267;
/// NoMDEntries (268).
pub const NO_MD_ENTRIES: Tag = 268;
/// MDEntryType (269).
pub const MD_ENTRY_TYPE: Tag = 269;
/// MDEntryPx (270).
pub const MD_ENTRY_PX: Tag = 270;
/// MDReqRejReason (281).
pub const MD_REQ_REJ_REASON: Tag = 281;

// =============================================================================
// Trading Session
// =============================================================================

/// TradSesReqID (335).
pub const TRAD_SES_REQ_ID: Tag = 335;
/// TradingSessionID (336).
pub const TRADING_SESSION_ID: Tag = 336;
/// TradSesStatus (340).
pub const TRAD_SES_STATUS: Tag = 340;

// =============================================================================
// Parties, Positions and Collateral
// =============================================================================

/// PartyIDSource (447).
pub const PARTY_ID_SOURCE: Tag = 447;
/// PartyID (448).
pub const PARTY_ID: Tag = 448;
/// PartyRole (452).
pub const PARTY_ROLE: Tag = 452;
/// NoPartyIDs (453).
pub const NO_PARTY_IDS: Tag = 453;
/// PartySubID (523).
pub const PARTY_SUB_ID: Tag = 523;
/// AccountType (581).
pub const ACCOUNT_TYPE: Tag = 581;
/// PosReqID (710).
pub const POS_REQ_ID: Tag = 710;
/// ClearingBusinessDate (715).
pub const CLEARING_BUSINESS_DATE: Tag = 715;
/// PosReqType (724).
pub const POS_REQ_TYPE: Tag = 724;
/// NoPartySubIDs (802).
pub const NO_PARTY_SUB_IDS: Tag = 802;
/// PartySubIDType (803).
pub const PARTY_SUB_ID_TYPE: Tag = 803;
/// CashOutstanding (901).
pub const CASH_OUTSTANDING: Tag = 901;
/// CollInquiryID (909).
pub const COLL_INQUIRY_ID: Tag = 909;
/// TotNumReports (911).
pub const TOT_NUM_REPORTS: Tag = 911;
/// CollInquiryStatus (945).
pub const COLL_INQUIRY_STATUS: Tag = 945;
/// TotalNumPosReports (727).
pub const TOTAL_NUM_POS_REPORTS: Tag = 727;
/// PosReqResult (728).
pub const POS_REQ_RESULT: Tag = 728;
/// PosReqStatus (729).
pub const POS_REQ_STATUS: Tag = 729;

// =============================================================================
// FXCM Custom Fields
// =============================================================================

/// FXCM custom tags (9000 range).
pub mod fxcm {
    use super::Tag;

    /// FXCMNoParam (9016): number of system parameters.
    pub const NO_PARAMS: Tag = 9016;
    /// FXCMParamName (9017).
    pub const PARAM_NAME: Tag = 9017;
    /// FXCMParamValue (9018).
    pub const PARAM_VALUE: Tag = 9018;
    /// FXCMPosID (9041).
    pub const POS_ID: Tag = 9041;
    /// FXCMPosOpenTime (9042).
    pub const POS_OPEN_TIME: Tag = 9042;
}
