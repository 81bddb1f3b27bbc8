//! Market Data Subscription Tracking
//!
//! Tracks market data subscriptions per symbol together with the
//! correlation token (`MDReqID`) they were requested under, so that an
//! unsubscribe cancels exactly the stream that was opened.
//!
//! # Token Policy
//!
//! - [`TokenPolicy::Fresh`] allocates a new token for every subscribe and
//!   refuses to open a second stream for an already-active symbol.
//! - [`TokenPolicy::PerSymbol`] derives the token from the symbol
//!   (`<symbol>_Request_`). Subscribing an active symbol again re-issues
//!   the request under the same token, which is what counterparties that
//!   expect the fixed convention rely on.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::domain::request_id::RequestIdAllocator;

/// Suffix of symbol-derived tokens.
const PER_SYMBOL_SUFFIX: &str = "_Request_";

// =============================================================================
// Types
// =============================================================================

/// A currency pair or instrument symbol (e.g. `EUR/USD`).
pub type Symbol = String;

/// How correlation tokens are chosen for subscribe requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPolicy {
    /// New token per subscribe; one stream per symbol.
    #[default]
    Fresh,
    /// Fixed `<symbol>_Request_` token per symbol.
    PerSymbol,
}

impl TokenPolicy {
    /// Build the token for a subscribe request.
    fn token_for(self, symbol: &str, allocator: &RequestIdAllocator) -> String {
        match self {
            Self::Fresh => format!("{}_{}", symbol.replace('/', "_"), allocator.next()),
            Self::PerSymbol => format!("{symbol}{PER_SYMBOL_SUFFIX}"),
        }
    }
}

/// Lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    /// Stream requested and not cancelled.
    Active,
    /// Unsubscribed locally or rejected by the counterparty.
    Cancelled,
}

/// A tracked market data subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscribed symbol.
    pub symbol: Symbol,
    /// Correlation token the stream was requested under.
    pub token: String,
    /// Current state.
    pub state: SubscriptionState,
}

impl Subscription {
    /// Check if the subscription is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SubscriptionState::Active
    }
}

/// Result of a subscribe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// New stream; a request must be sent.
    New(String),
    /// Active symbol re-requested under its fixed token; a request must be
    /// sent.
    Reissued(String),
    /// Active symbol under the fresh policy; nothing to send.
    AlreadyActive(String),
}

impl SubscribeOutcome {
    /// Correlation token of the subscription.
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::New(token) | Self::Reissued(token) | Self::AlreadyActive(token) => token,
        }
    }

    /// Check if a subscribe request has to go out.
    #[must_use]
    pub const fn requires_request(&self) -> bool {
        !matches!(self, Self::AlreadyActive(_))
    }
}

// =============================================================================
// Subscription Tracker
// =============================================================================

/// Thread-safe per-symbol subscription tracker.
///
/// # Example
///
/// ```rust
/// use fix_gateway::domain::request_id::RequestIdAllocator;
/// use fix_gateway::domain::subscription::{SubscriptionTracker, TokenPolicy};
///
/// let ids = RequestIdAllocator::new();
/// let tracker = SubscriptionTracker::new(TokenPolicy::PerSymbol);
///
/// let outcome = tracker.subscribe("EUR/USD", &ids);
/// assert_eq!(outcome.token(), "EUR/USD_Request_");
///
/// // Unsubscribe reconstructs the same token
/// assert_eq!(tracker.unsubscribe("EUR/USD").as_deref(), Some("EUR/USD_Request_"));
///
/// // Nothing left to cancel
/// assert!(tracker.unsubscribe("EUR/USD").is_none());
/// ```
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    policy: TokenPolicy,
    subscriptions: RwLock<BTreeMap<Symbol, Subscription>>,
}

impl SubscriptionTracker {
    /// Create a tracker with the given token policy.
    #[must_use]
    pub fn new(policy: TokenPolicy) -> Self {
        Self {
            policy,
            subscriptions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Token policy in use.
    #[must_use]
    pub const fn policy(&self) -> TokenPolicy {
        self.policy
    }

    /// Subscribe a symbol.
    pub fn subscribe(&self, symbol: &str, allocator: &RequestIdAllocator) -> SubscribeOutcome {
        let mut subscriptions = self.subscriptions.write();

        if let Some(existing) = subscriptions.get(symbol).filter(|s| s.is_active()) {
            let token = existing.token.clone();
            return match self.policy {
                TokenPolicy::Fresh => SubscribeOutcome::AlreadyActive(token),
                TokenPolicy::PerSymbol => SubscribeOutcome::Reissued(token),
            };
        }

        let token = self.policy.token_for(symbol, allocator);
        subscriptions.insert(
            symbol.to_string(),
            Subscription {
                symbol: symbol.to_string(),
                token: token.clone(),
                state: SubscriptionState::Active,
            },
        );
        SubscribeOutcome::New(token)
    }

    /// Cancel an active subscription, returning the token to cancel with.
    ///
    /// Returns `None` for unknown or already-cancelled symbols.
    pub fn unsubscribe(&self, symbol: &str) -> Option<String> {
        let mut subscriptions = self.subscriptions.write();
        let subscription = subscriptions.get_mut(symbol).filter(|s| s.is_active())?;
        subscription.state = SubscriptionState::Cancelled;
        Some(subscription.token.clone())
    }

    /// Restore a cancelled subscription whose cancel request never left.
    ///
    /// Only an entry still holding `token` is restored, so a newer stream
    /// for the same symbol is never overwritten. Returns `true` if restored.
    pub fn reactivate(&self, symbol: &str, token: &str) -> bool {
        let mut subscriptions = self.subscriptions.write();
        match subscriptions.get_mut(symbol) {
            Some(subscription) if subscription.token == token && !subscription.is_active() => {
                subscription.state = SubscriptionState::Active;
                true
            }
            _ => false,
        }
    }

    /// Cancel every active subscription without sending anything, for when
    /// the counterparty has already dropped the streams. Returns the
    /// cancelled symbols.
    pub fn cancel_all(&self) -> Vec<Symbol> {
        let mut subscriptions = self.subscriptions.write();
        subscriptions
            .values_mut()
            .filter(|s| s.is_active())
            .map(|s| {
                s.state = SubscriptionState::Cancelled;
                s.symbol.clone()
            })
            .collect()
    }

    /// Mark the subscription requested under `token` as cancelled after a
    /// counterparty reject. Returns the affected symbol.
    pub fn on_reject(&self, token: &str) -> Option<Symbol> {
        let mut subscriptions = self.subscriptions.write();
        let subscription = subscriptions
            .values_mut()
            .find(|s| s.token == token && s.is_active())?;
        subscription.state = SubscriptionState::Cancelled;
        Some(subscription.symbol.clone())
    }

    /// Look up a subscription by its correlation token.
    #[must_use]
    pub fn find_by_token(&self, token: &str) -> Option<Subscription> {
        self.subscriptions
            .read()
            .values()
            .find(|s| s.token == token)
            .cloned()
    }

    /// Look up a subscription by symbol.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<Subscription> {
        self.subscriptions.read().get(symbol).cloned()
    }

    /// Active subscriptions ordered by symbol.
    #[must_use]
    pub fn active(&self) -> Vec<Subscription> {
        self.subscriptions
            .read()
            .values()
            .filter(|s| s.is_active())
            .cloned()
            .collect()
    }

    /// Symbols with an active subscription.
    #[must_use]
    pub fn active_symbols(&self) -> Vec<Symbol> {
        self.active().into_iter().map(|s| s.symbol).collect()
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> SubscriptionStats {
        let subscriptions = self.subscriptions.read();
        let active = subscriptions.values().filter(|s| s.is_active()).count();
        SubscriptionStats {
            active,
            cancelled: subscriptions.len() - active,
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Subscription counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionStats {
    /// Active streams.
    pub active: usize,
    /// Cancelled or rejected streams still tracked.
    pub cancelled: usize,
}

// =============================================================================
// Tests
// =============================================================================
