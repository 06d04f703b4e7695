// Account model types.
//
// An account is identity plus per-currency holdings. The id never changes
// for the account's lifetime; holdings are the only mutable state, and they
// only change through an account manager so every mutation leaves a ledger
// entry behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::core::currency::Currency;

/// Opaque account identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Mint a fresh id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The currency-set capability of an account.
///
/// Single-currency accounts are the one-element case of the multi-currency
/// model: same operations, same entries, but any bundle in another currency
/// is rejected before anything is touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyScope {
    /// The account can only ever hold this one currency.
    Single(String),
    /// The account can hold a balance in every registered currency.
    Multi,
}

impl CurrencyScope {
    /// Does this scope admit a balance in `currency`?
    pub fn allows(&self, currency: &str) -> bool {
        match self {
            CurrencyScope::Single(own) => own == currency,
            CurrencyScope::Multi => true,
        }
    }
}

/// Snapshot of one account.
///
/// Instances are read-only views of what the store held when they were
/// loaded; balances move on through the owning manager, never through the
/// snapshot itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    name: String,
    kind: String,
    scope: CurrencyScope,
    holdings: HashMap<String, i64>,
    created: DateTime<Utc>,
}

impl Account {
    /// Build a fresh account. Intended for account managers; callers go
    /// through [`create_account`](crate::core::account::AccountManager::create_account).
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        scope: CurrencyScope,
        holdings: HashMap<String, i64>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            kind: kind.into(),
            scope,
            holdings,
            created: Utc::now(),
        }
    }

    /// Rehydrate a persisted account. Intended for account store
    /// implementations.
    pub fn restore(
        id: AccountId,
        name: impl Into<String>,
        kind: impl Into<String>,
        scope: CurrencyScope,
        holdings: HashMap<String, i64>,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind: kind.into(),
            scope,
            holdings,
            created,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind tag identifying which registered manager owns this account.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn scope(&self) -> &CurrencyScope {
        &self.scope
    }

    /// Balance in `currency`; zero when the account holds none of it.
    pub fn balance(&self, currency: &Currency) -> i64 {
        self.balance_of(currency.name())
    }

    /// Balance by currency name.
    pub fn balance_of(&self, currency_name: &str) -> i64 {
        self.holdings.get(currency_name).copied().unwrap_or(0)
    }

    /// Every currency the account currently has a recorded balance in.
    pub fn holdings(&self) -> &HashMap<String, i64> {
        &self.holdings
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_currency_reads_as_zero() {
        let account = Account::new("alice", "player", CurrencyScope::Multi, HashMap::new());
        assert_eq!(account.balance_of("gold"), 0);

        let gold = Currency::new("gold", "G", 0);
        assert_eq!(account.balance(&gold), 0);
    }

    #[test]
    fn seeded_holdings_are_readable() {
        let mut holdings = HashMap::new();
        holdings.insert("gold".to_string(), 100);

        let account = Account::new("alice", "player", CurrencyScope::Multi, holdings);
        assert_eq!(account.balance_of("gold"), 100);
        assert_eq!(account.kind(), "player");
    }

    #[test]
    fn single_scope_admits_only_its_currency() {
        let scope = CurrencyScope::Single("gold".to_string());
        assert!(scope.allows("gold"));
        assert!(!scope.allows("gems"));

        assert!(CurrencyScope::Multi.allows("anything"));
    }

    #[test]
    fn account_ids_are_unique_and_ordered() {
        let a = AccountId::new();
        let b = AccountId::new();
        assert_ne!(a, b);

        // Ordering is total, which is all the lock table needs.
        assert!(a < b || b < a);
    }
}
