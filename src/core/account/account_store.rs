// Storage port for accounts.

use async_trait::async_trait;
use std::collections::HashMap;

use super::account_models::{Account, AccountId};
use crate::core::error::EconomyError;

/// Trait for persisting accounts.
///
/// Same split as the entry store: in-memory for tests and throwaway
/// servers, SQLite for deployments that must survive a restart. Mutual
/// exclusion is the account manager's job, so implementations only need
/// each individual call to be atomic.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a freshly created account.
    ///
    /// Fails with [`EconomyError::DuplicateAccount`] when the account's
    /// kind already has an account with that name.
    async fn insert_account(&self, account: &Account) -> Result<(), EconomyError>;

    /// Fetch an account by id.
    async fn account(&self, id: AccountId) -> Result<Option<Account>, EconomyError>;

    /// Fetch an account of `kind` by its exact name.
    async fn account_by_name(&self, kind: &str, name: &str)
        -> Result<Option<Account>, EconomyError>;

    /// Overwrite the holdings of an existing account.
    async fn update_holdings(
        &self,
        id: AccountId,
        holdings: &HashMap<String, i64>,
    ) -> Result<(), EconomyError>;

    /// Accounts of `kind` ranked by their balance in `currency`, richest
    /// first.
    async fn top_accounts(
        &self,
        kind: &str,
        currency: &str,
        limit: usize,
    ) -> Result<Vec<Account>, EconomyError>;
}
