// The account manager contract.
//
// An account manager owns every account of one kind. All balance mutations
// go through it: each operation is validated in full before anything is
// written, applied under the account's lock, and recorded as exactly one
// ledger entry per account touched. The entry comes back as the operation's
// return value, so a mutation that left no audit trail cannot exist.

use async_trait::async_trait;
use serde_json::Value;

use super::account_models::{Account, AccountId, CurrencyScope};
use crate::core::currency::{Currency, CurrencyBundle};
use crate::core::error::EconomyError;
use crate::core::ledger::{CustomAction, Entry, EntryActor, Operator};
use crate::core::provider::EconomyProvider;

/// Both halves of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    /// The `Remove` entry recorded on the source account.
    pub outgoing: Entry,
    /// The `Add` entry recorded on the recipient account.
    pub incoming: Entry,
}

/// Contract for the managers that own accounts of one kind.
///
/// Object-safe so the account registry can hand out `Arc<dyn AccountManager>`
/// to whoever holds an account of an arbitrary kind. Most deployments use
/// [`StandardAccountManager`](super::StandardAccountManager) behind this
/// trait; a plugin with exotic needs can bring its own implementation as
/// long as it honors the entry-per-mutation contract.
#[async_trait]
pub trait AccountManager: Send + Sync {
    /// The account kind this manager owns. Doubles as the registration key
    /// in the account registry.
    fn kind(&self) -> &str;

    /// Create and persist a new account of this manager's kind.
    ///
    /// Seeds the configured starting balance in the main currency when the
    /// scope can hold it. Creation is not a mutation of an existing
    /// account, so no ledger entry is produced. Fails with
    /// [`EconomyError::DuplicateAccount`] when the kind already has an
    /// account with that name.
    async fn create_account(
        &self,
        economy: &EconomyProvider,
        name: &str,
        scope: CurrencyScope,
    ) -> Result<Account, EconomyError>;

    /// Look up an account by id. Absence is `None`, not an error.
    async fn account(&self, id: AccountId) -> Result<Option<Account>, EconomyError>;

    /// Look up an account by its exact name.
    async fn account_by_name(&self, name: &str) -> Result<Option<Account>, EconomyError>;

    /// The accounts holding the most of `currency`, richest first.
    async fn top_accounts(
        &self,
        currency: &Currency,
        limit: usize,
    ) -> Result<Vec<Account>, EconomyError>;

    /// Move `bundles` from one account to another.
    ///
    /// Atomic from the caller's perspective: either every bundle moves or
    /// none does. Both accounts stay locked for the whole operation,
    /// acquired in ascending id order so opposite-direction transfers
    /// cannot deadlock. Produces a `Remove` entry on the source and an
    /// `Add` entry on the recipient, each attributed to the peer account.
    ///
    /// The recipient may belong to a different kind; its credit is applied
    /// through that kind's manager via [`receive`](Self::receive), resolved
    /// through the account registry.
    async fn transfer(
        &self,
        economy: &EconomyProvider,
        from: AccountId,
        to: &Account,
        bundles: &[CurrencyBundle],
        info: Option<Value>,
    ) -> Result<TransferReceipt, EconomyError>;

    /// Credit-side hook of [`transfer`](Self::transfer): applies `bundles`
    /// to the account `to` of this manager's kind and records the `Add`
    /// entry attributed to `from`.
    ///
    /// Internal contract: the transfer that invokes this already holds
    /// both account locks. Not intended for direct use.
    async fn receive(
        &self,
        economy: &EconomyProvider,
        to: AccountId,
        from: &Account,
        bundles: &[CurrencyBundle],
        info: Option<Value>,
    ) -> Result<Entry, EconomyError>;

    /// Set balances to the bundled amounts, attributed to `operator`.
    /// Amounts must not be negative.
    async fn operator_set(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        operator: Operator,
        bundles: &[CurrencyBundle],
        info: Option<Value>,
    ) -> Result<Entry, EconomyError>;

    /// Add the bundled amounts to the account's balances, attributed to
    /// `operator`. Amounts must be positive.
    async fn operator_add(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        operator: Operator,
        bundles: &[CurrencyBundle],
        info: Option<Value>,
    ) -> Result<Entry, EconomyError>;

    /// Remove the bundled amounts from the account's balances, attributed
    /// to `operator`. Fails with [`EconomyError::InsufficientFunds`] before
    /// anything is written when any bundle exceeds the available balance.
    async fn operator_remove(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        operator: Operator,
        bundles: &[CurrencyBundle],
        info: Option<Value>,
    ) -> Result<Entry, EconomyError>;

    /// Zero one currency, or every currency when `currency` is `None`,
    /// attributed to `operator`. The all-currency entry carries one balance
    /// row per previously non-zero currency.
    async fn operator_reset(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        operator: Operator,
        currency: Option<&Currency>,
        info: Option<Value>,
    ) -> Result<Entry, EconomyError>;

    /// Extension hook: apply `action` to the bundled amounts with a
    /// caller-chosen actor.
    ///
    /// This is the generalized form of the operator operations -
    /// `operator_add` is `custom` with an operator actor and
    /// [`CustomAction::Add`] - kept on the contract so extensions can
    /// attribute mutations to a peer account or to nobody at all.
    async fn custom(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        actor: EntryActor,
        action: CustomAction,
        bundles: &[CurrencyBundle],
        info: Option<Value>,
    ) -> Result<Entry, EconomyError>;

    /// Extension hook: reset one or all currencies with a caller-chosen
    /// actor.
    async fn custom_reset(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        actor: EntryActor,
        currency: Option<&Currency>,
        info: Option<Value>,
    ) -> Result<Entry, EconomyError>;
}
