//! Account Ledger
//!
//! Deduplicated, first-seen-ordered set of account identifiers discovered
//! from collateral reports. Accounts are never removed.

use parking_lot::RwLock;

/// Registry of discovered accounts.
#[derive(Debug, Default)]
pub struct AccountLedger {
    accounts: RwLock<Vec<String>>,
}

impl AccountLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an account. Returns `true` only if it was not known yet.
    pub fn record(&self, account: &str) -> bool {
        let mut accounts = self.accounts.write();
        if accounts.iter().any(|known| known == account) {
            return false;
        }
        accounts.push(account.to_string());
        true
    }

    /// All accounts in first-seen order.
    #[must_use]
    pub fn all(&self) -> Vec<String> {
        self.accounts.read().clone()
    }

    /// Check if an account is known.
    #[must_use]
    pub fn contains(&self, account: &str) -> bool {
        self.accounts.read().iter().any(|known| known == account)
    }

    /// Number of known accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    /// Check if no account has been discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}
