//! Discovery Flow
//!
//! State machine bootstrapping session-scoped state after the trading
//! session logs on.
//!
//! # Flow
//!
//! 1. Trading session logon: request trading session status
//! 2. Trading session status received: request accounts (collateral inquiry)
//! 3. Collateral reports arrive, one per account, for as long as the
//!    counterparty keeps sending them
//! 4. `Ready` once discovery is completed explicitly (operator command or
//!    settle timeout); the protocol has no "last account" marker
//!
//! Logout of the trading session moves the flow to `Disconnected`; the next
//! logon starts over. Transitions are driven by message arrival, so the
//! flow is advisory: position and order requests are never gated on it.

use serde::Serialize;

// =============================================================================
// State
// =============================================================================

/// Current discovery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryState {
    /// Trading session logged out.
    Disconnected,

    /// Waiting for the trading session to log on.
    #[default]
    AwaitingLogon,

    /// Trading session status requested.
    AwaitingSessionStatus,

    /// Accounts requested; collateral reports are being collected.
    AwaitingAccounts,

    /// Discovery completed.
    Ready,
}

impl DiscoveryState {
    /// Label for logs and health output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::AwaitingLogon => "awaiting_logon",
            Self::AwaitingSessionStatus => "awaiting_session_status",
            Self::AwaitingAccounts => "awaiting_accounts",
            Self::Ready => "ready",
        }
    }

    /// Check if the trading session is logged on from the flow's view.
    #[must_use]
    pub const fn is_logged_on(&self) -> bool {
        matches!(
            self,
            Self::AwaitingSessionStatus | Self::AwaitingAccounts | Self::Ready
        )
    }

    /// Check if discovery has completed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl std::fmt::Display for DiscoveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound request the caller must issue after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryAction {
    /// Nothing to send.
    None,
    /// Send a trading session status request.
    RequestTradingStatus,
    /// Send a collateral inquiry for all accounts.
    RequestAccounts,
}

// =============================================================================
// Flow
// =============================================================================

/// Discovery state machine.
///
/// Pure: the caller sends whatever [`DiscoveryAction`] a transition returns.
///
/// # Example
///
/// ```rust
/// use fix_gateway::domain::discovery::{DiscoveryAction, DiscoveryFlow, DiscoveryState};
///
/// let mut flow = DiscoveryFlow::new();
/// assert_eq!(flow.on_logon(), DiscoveryAction::RequestTradingStatus);
/// assert_eq!(flow.on_session_status(), DiscoveryAction::RequestAccounts);
/// assert_eq!(flow.state(), DiscoveryState::AwaitingAccounts);
///
/// flow.on_account_report();
/// assert!(flow.complete());
/// assert!(flow.state().is_ready());
/// ```
#[derive(Debug, Default)]
pub struct DiscoveryFlow {
    state: DiscoveryState,
    reports_seen: usize,
}

impl DiscoveryFlow {
    /// Create a flow awaiting logon.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> DiscoveryState {
        self.state
    }

    /// Collateral reports received since the last logon.
    #[must_use]
    pub const fn reports_seen(&self) -> usize {
        self.reports_seen
    }

    /// Trading session logged on.
    pub fn on_logon(&mut self) -> DiscoveryAction {
        match self.state {
            DiscoveryState::Disconnected | DiscoveryState::AwaitingLogon => {
                self.state = DiscoveryState::AwaitingSessionStatus;
                self.reports_seen = 0;
                DiscoveryAction::RequestTradingStatus
            }
            state => {
                tracing::debug!(state = %state, "Logon ignored by discovery flow");
                DiscoveryAction::None
            }
        }
    }

    /// Trading session status received.
    ///
    /// A status that arrives before our logon event was seen still advances
    /// the flow; updates after accounts were requested are informational.
    pub fn on_session_status(&mut self) -> DiscoveryAction {
        match self.state {
            DiscoveryState::AwaitingLogon | DiscoveryState::AwaitingSessionStatus => {
                self.state = DiscoveryState::AwaitingAccounts;
                DiscoveryAction::RequestAccounts
            }
            state => {
                tracing::debug!(state = %state, "Unsolicited trading session status");
                DiscoveryAction::None
            }
        }
    }

    /// Collateral report received. The state does not change.
    pub const fn on_account_report(&mut self) {
        self.reports_seen += 1;
    }

    /// Mark discovery complete.
    ///
    /// Returns `true` if the flow moved to `Ready`. Completion is only
    /// accepted once accounts have been requested.
    pub fn complete(&mut self) -> bool {
        match self.state {
            DiscoveryState::AwaitingAccounts => {
                self.state = DiscoveryState::Ready;
                true
            }
            _ => false,
        }
    }

    /// Trading session logged out.
    pub const fn on_logout(&mut self) {
        self.state = DiscoveryState::Disconnected;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_awaits_logon() {
        let flow = DiscoveryFlow::new();
        assert_eq!(flow.state(), DiscoveryState::AwaitingLogon);
        assert!(!flow.state().is_logged_on());
    }

    #[test]
    fn full_flow() {
        let mut flow = DiscoveryFlow::new();

        assert_eq!(flow.on_logon(), DiscoveryAction::RequestTradingStatus);
        assert_eq!(flow.state(), DiscoveryState::AwaitingSessionStatus);

        assert_eq!(flow.on_session_status(), DiscoveryAction::RequestAccounts);
        assert_eq!(flow.state(), DiscoveryState::AwaitingAccounts);

        flow.on_account_report();
        flow.on_account_report();
        assert_eq!(flow.state(), DiscoveryState::AwaitingAccounts);
        assert_eq!(flow.reports_seen(), 2);

        assert!(flow.complete());
        assert_eq!(flow.state(), DiscoveryState::Ready);
    }

    #[test]
    fn second_logon_is_ignored() {
        let mut flow = DiscoveryFlow::new();
        flow.on_logon();
        assert_eq!(flow.on_logon(), DiscoveryAction::None);
        assert_eq!(flow.state(), DiscoveryState::AwaitingSessionStatus);
    }

    #[test]
    fn status_after_accounts_requested_is_informational() {
        let mut flow = DiscoveryFlow::new();
        flow.on_logon();
        flow.on_session_status();
        assert_eq!(flow.on_session_status(), DiscoveryAction::None);

        flow.complete();
        assert_eq!(flow.on_session_status(), DiscoveryAction::None);
        assert_eq!(flow.state(), DiscoveryState::Ready);
    }

    #[test]
    fn status_before_logon_advances() {
        let mut flow = DiscoveryFlow::new();
        assert_eq!(flow.on_session_status(), DiscoveryAction::RequestAccounts);
        assert_eq!(flow.state(), DiscoveryState::AwaitingAccounts);
    }

    #[test]
    fn status_while_disconnected_is_ignored() {
        let mut flow = DiscoveryFlow::new();
        flow.on_logout();
        assert_eq!(flow.on_session_status(), DiscoveryAction::None);
        assert_eq!(flow.state(), DiscoveryState::Disconnected);
    }

    #[test]
    fn complete_requires_accounts_requested() {
        let mut flow = DiscoveryFlow::new();
        assert!(!flow.complete());
        flow.on_logon();
        assert!(!flow.complete());
        assert_eq!(flow.state(), DiscoveryState::AwaitingSessionStatus);
    }

    #[test]
    fn logout_then_logon_restarts() {
        let mut flow = DiscoveryFlow::new();
        flow.on_logon();
        flow.on_session_status();
        flow.on_account_report();
        flow.complete();

        flow.on_logout();
        assert_eq!(flow.state(), DiscoveryState::Disconnected);

        assert_eq!(flow.on_logon(), DiscoveryAction::RequestTradingStatus);
        assert_eq!(flow.reports_seen(), 0);
    }

    #[test]
    fn state_labels() {
        assert_eq!(DiscoveryState::AwaitingAccounts.as_str(), "awaiting_accounts");
        assert_eq!(DiscoveryState::Ready.to_string(), "ready");
    }
}
