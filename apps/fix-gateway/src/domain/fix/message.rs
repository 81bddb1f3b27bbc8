//! FIX Message Types
//!
//! Engine-agnostic field maps with nested repeating groups. The protocol
//! engine owns the wire encoding; the gateway only builds and reads these.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::tags::{self, Tag};

/// Separator used when rendering messages for logs (stands in for SOH).
const LOG_SEPARATOR: char = '|';

// =============================================================================
// Message Type
// =============================================================================

/// FIX `MsgType` (35) values the gateway understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgType {
    /// Heartbeat (0).
    Heartbeat,
    /// TestRequest (1).
    TestRequest,
    /// ResendRequest (2).
    ResendRequest,
    /// Reject (3).
    Reject,
    /// SequenceReset (4).
    SequenceReset,
    /// Logout (5).
    Logout,
    /// Logon (A).
    Logon,
    /// ExecutionReport (8).
    ExecutionReport,
    /// NewOrderSingle (D).
    NewOrderSingle,
    /// MarketDataRequest (V).
    MarketDataRequest,
    /// MarketDataSnapshotFullRefresh (W).
    MarketDataSnapshotFullRefresh,
    /// MarketDataRequestReject (Y).
    MarketDataRequestReject,
    /// TradingSessionStatusRequest (g).
    TradingSessionStatusRequest,
    /// TradingSessionStatus (h).
    TradingSessionStatus,
    /// RequestForPositions (AN).
    RequestForPositions,
    /// RequestForPositionsAck (AO).
    RequestForPositionsAck,
    /// PositionReport (AP).
    PositionReport,
    /// CollateralReport (BA).
    CollateralReport,
    /// CollateralInquiry (BB).
    CollateralInquiry,
    /// CollateralInquiryAck (BG).
    CollateralInquiryAck,
}

impl MsgType {
    /// Wire value of the message type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heartbeat => "0",
            Self::TestRequest => "1",
            Self::ResendRequest => "2",
            Self::Reject => "3",
            Self::SequenceReset => "4",
            Self::Logout => "5",
            Self::Logon => "A",
            Self::ExecutionReport => "8",
            Self::NewOrderSingle => "D",
            Self::MarketDataRequest => "V",
            Self::MarketDataSnapshotFullRefresh => "W",
            Self::MarketDataRequestReject => "Y",
            Self::TradingSessionStatusRequest => "g",
            Self::TradingSessionStatus => "h",
            Self::RequestForPositions => "AN",
            Self::RequestForPositionsAck => "AO",
            Self::PositionReport => "AP",
            Self::CollateralReport => "BA",
            Self::CollateralInquiry => "BB",
            Self::CollateralInquiryAck => "BG",
        }
    }

    /// Parse a wire value. Returns `None` for message types the gateway
    /// does not handle.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let msg_type = match value {
            "0" => Self::Heartbeat,
            "1" => Self::TestRequest,
            "2" => Self::ResendRequest,
            "3" => Self::Reject,
            "4" => Self::SequenceReset,
            "5" => Self::Logout,
            "A" => Self::Logon,
            "8" => Self::ExecutionReport,
            "D" => Self::NewOrderSingle,
            "V" => Self::MarketDataRequest,
            "W" => Self::MarketDataSnapshotFullRefresh,
            "Y" => Self::MarketDataRequestReject,
            "g" => Self::TradingSessionStatusRequest,
            "h" => Self::TradingSessionStatus,
            "AN" => Self::RequestForPositions,
            "AO" => Self::RequestForPositionsAck,
            "AP" => Self::PositionReport,
            "BA" => Self::CollateralReport,
            "BB" => Self::CollateralInquiry,
            "BG" => Self::CollateralInquiryAck,
            _ => return None,
        };
        Some(msg_type)
    }

    /// Check if this is a session-level (administrative) message.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(
            self,
            Self::Heartbeat
                | Self::TestRequest
                | Self::ResendRequest
                | Self::Reject
                | Self::SequenceReset
                | Self::Logout
                | Self::Logon
        )
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Field Map
// =============================================================================

/// Ordered set of fields with nested repeating groups.
///
/// Repeating groups are keyed by their count tag (e.g. `NoRelatedSym`).
/// Adding a group entry keeps the count field in sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    fields: BTreeMap<Tag, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    groups: BTreeMap<Tag, Vec<FieldMap>>,
}

impl FieldMap {
    /// Create an empty field map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, tag: Tag, value: impl Into<String>) -> &mut Self {
        self.fields.insert(tag, value.into());
        self
    }

    /// Builder form of [`FieldMap::set`].
    #[must_use]
    pub fn with(mut self, tag: Tag, value: impl Into<String>) -> Self {
        self.set(tag, value);
        self
    }

    /// Get a field value if present.
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&str> {
        self.fields.get(&tag).map(String::as_str)
    }

    /// Get a field value parsed into `T`. Absent or unparsable fields
    /// yield `None`.
    #[must_use]
    pub fn get_parsed<T: FromStr>(&self, tag: Tag) -> Option<T> {
        self.get(tag).and_then(|v| v.trim().parse().ok())
    }

    /// Check if a field is present.
    #[must_use]
    pub fn contains(&self, tag: Tag) -> bool {
        self.fields.contains_key(&tag)
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, tag: Tag) -> Option<String> {
        self.fields.remove(&tag)
    }

    /// Append a repeating group entry and update its count field.
    pub fn add_group(&mut self, count_tag: Tag, entry: Self) -> &mut Self {
        let entries = self.groups.entry(count_tag).or_default();
        entries.push(entry);
        let count = entries.len();
        self.fields.insert(count_tag, count.to_string());
        self
    }

    /// Builder form of [`FieldMap::add_group`].
    #[must_use]
    pub fn with_group(mut self, count_tag: Tag, entry: Self) -> Self {
        self.add_group(count_tag, entry);
        self
    }

    /// Repeating group entries for a count tag (empty if absent).
    #[must_use]
    pub fn groups(&self, count_tag: Tag) -> &[Self] {
        self.groups.get(&count_tag).map_or(&[], Vec::as_slice)
    }

    /// Iterate over the plain fields in tag order.
    pub fn fields(&self) -> impl Iterator<Item = (Tag, &str)> {
        self.fields.iter().map(|(tag, value)| (*tag, value.as_str()))
    }

    /// Number of plain fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the map has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn render(&self, out: &mut String) {
        for (tag, value) in &self.fields {
            let shown = if *tag == tags::PASSWORD {
                "***"
            } else {
                value.as_str()
            };
            out.push_str(&format!("{tag}={shown}{LOG_SEPARATOR}"));
            for entry in self.groups(*tag) {
                entry.render(out);
            }
        }
    }
}

// =============================================================================
// Message
// =============================================================================

/// A FIX message: standard header plus body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixMessage {
    header: FieldMap,
    body: FieldMap,
}

impl FixMessage {
    /// Create a message of the given type.
    #[must_use]
    pub fn new(msg_type: MsgType) -> Self {
        Self {
            header: FieldMap::new().with(tags::MSG_TYPE, msg_type.as_str()),
            body: FieldMap::new(),
        }
    }

    /// Create a message from an already-populated header and body.
    #[must_use]
    pub const fn from_parts(header: FieldMap, body: FieldMap) -> Self {
        Self { header, body }
    }

    /// Raw `MsgType` (35) value from the header.
    #[must_use]
    pub fn msg_type_raw(&self) -> Option<&str> {
        self.header.get(tags::MSG_TYPE)
    }

    /// Parsed `MsgType`, or `None` if absent or not handled by the gateway.
    #[must_use]
    pub fn msg_type(&self) -> Option<MsgType> {
        self.msg_type_raw().and_then(MsgType::parse)
    }

    /// Standard header.
    #[must_use]
    pub const fn header(&self) -> &FieldMap {
        &self.header
    }

    /// Mutable standard header.
    pub const fn header_mut(&mut self) -> &mut FieldMap {
        &mut self.header
    }

    /// Message body.
    #[must_use]
    pub const fn body(&self) -> &FieldMap {
        &self.body
    }

    /// Mutable message body.
    pub const fn body_mut(&mut self) -> &mut FieldMap {
        &mut self.body
    }

    /// Set a body field.
    pub fn set(&mut self, tag: Tag, value: impl Into<String>) -> &mut Self {
        self.body.set(tag, value);
        self
    }

    /// Builder form of [`FixMessage::set`].
    #[must_use]
    pub fn with(mut self, tag: Tag, value: impl Into<String>) -> Self {
        self.body.set(tag, value);
        self
    }

    /// Builder form of [`FieldMap::add_group`] on the body.
    #[must_use]
    pub fn with_group(mut self, count_tag: Tag, entry: FieldMap) -> Self {
        self.body.add_group(count_tag, entry);
        self
    }

    /// Get a body field.
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&str> {
        self.body.get(tag)
    }
}

impl fmt::Display for FixMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.header.render(&mut out);
        self.body.render(&mut out);
        f.write_str(&out)
    }
}

// =============================================================================
// Tests
// =============================================================================
