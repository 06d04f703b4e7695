// The standard account manager - the engine behind every stock account kind.
//
// One instance owns all accounts of one kind, persisted behind an
// AccountStore. Every mutation follows the same shape: validate the whole
// request first, take the account lock, load the live account, compute the
// new holdings, write them, then record the ledger entry. A failed record
// rolls the holdings back, so the ledger never describes a mutation that
// did not stick.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use super::account_manager::{AccountManager, TransferReceipt};
use super::account_models::{Account, AccountId, CurrencyScope};
use super::account_store::AccountStore;
use crate::core::currency::{Currency, CurrencyBundle};
use crate::core::error::EconomyError;
use crate::core::ledger::{CustomAction, Entry, EntryActor, EntryCurrencyData, EntryType, Operator};
use crate::core::provider::EconomyProvider;

/// The stock [`AccountManager`] implementation.
///
/// Generic over S: AccountStore so the same engine runs against the
/// in-memory store in tests and the SQLite store in production.
pub struct StandardAccountManager<S: AccountStore> {
    kind: String,
    store: S,
}

impl<S: AccountStore> StandardAccountManager<S> {
    /// Create a manager owning accounts of `kind`, persisted in `store`.
    pub fn new(kind: impl Into<String>, store: S) -> Self {
        Self {
            kind: kind.into(),
            store,
        }
    }

    // ========================================================================
    // VALIDATION
    // ========================================================================
    // Everything here runs before any balance is written, so a rejected
    // operation leaves no trace - no partial holdings, no entry.

    /// Check the shape of a bundle set against the registry and the amount
    /// rule of `action`.
    fn validate_bundles(
        economy: &EconomyProvider,
        bundles: &[CurrencyBundle],
        action: CustomAction,
    ) -> Result<(), EconomyError> {
        if bundles.is_empty() {
            return Err(EconomyError::InvalidBundle(
                "at least one currency bundle is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for bundle in bundles {
            if !seen.insert(bundle.currency.as_str()) {
                return Err(EconomyError::InvalidBundle(format!(
                    "currency '{}' appears more than once",
                    bundle.currency
                )));
            }

            if economy.currencies().currency(&bundle.currency).is_none() {
                return Err(EconomyError::UnknownCurrency {
                    name: bundle.currency.clone(),
                });
            }

            match action {
                CustomAction::Add | CustomAction::Remove if bundle.amount <= 0 => {
                    return Err(EconomyError::InvalidBundle(format!(
                        "amount for '{}' must be positive",
                        bundle.currency
                    )));
                }
                CustomAction::Set if bundle.amount < 0 => {
                    return Err(EconomyError::InvalidBundle(format!(
                        "balance for '{}' cannot be set negative",
                        bundle.currency
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Work out the balance rows and resulting holdings for one mutation.
    ///
    /// Pure: nothing is written here. Insufficient funds, scope violations
    /// and overflow all surface before the caller touches the store.
    fn apply_bundles(
        account: &Account,
        action: CustomAction,
        bundles: &[CurrencyBundle],
    ) -> Result<(Vec<EntryCurrencyData>, HashMap<String, i64>), EconomyError> {
        let mut holdings = account.holdings().clone();
        let mut rows = Vec::with_capacity(bundles.len());

        for bundle in bundles {
            if !account.scope().allows(&bundle.currency) {
                return Err(EconomyError::CurrencyNotAllowed {
                    account: account.id(),
                    currency: bundle.currency.clone(),
                });
            }

            let before = holdings.get(&bundle.currency).copied().unwrap_or(0);
            let after = match action {
                CustomAction::Add => before.checked_add(bundle.amount).ok_or_else(|| {
                    EconomyError::BalanceOverflow {
                        currency: bundle.currency.clone(),
                    }
                })?,
                CustomAction::Remove => {
                    if before < bundle.amount {
                        return Err(EconomyError::InsufficientFunds {
                            currency: bundle.currency.clone(),
                            required: bundle.amount,
                            available: before,
                        });
                    }
                    before - bundle.amount
                }
                CustomAction::Set => bundle.amount,
            };

            rows.push(EntryCurrencyData::new(&bundle.currency, before, after));
            holdings.insert(bundle.currency.clone(), after);
        }

        Ok((rows, holdings))
    }

    // ========================================================================
    // MUTATION CORE
    // ========================================================================

    async fn load(&self, id: AccountId) -> Result<Account, EconomyError> {
        self.store
            .account(id)
            .await?
            .ok_or(EconomyError::AccountNotFound { id })
    }

    /// Write the new holdings, then record the entry.
    ///
    /// If recording fails the holdings are restored to the pre-mutation
    /// snapshot, so balances and ledger stay in agreement. A rollback that
    /// itself fails can only happen on a broken backend; it is logged and
    /// the record error is returned either way.
    async fn commit(
        &self,
        economy: &EconomyProvider,
        account: &Account,
        entry_type: EntryType,
        rows: Vec<EntryCurrencyData>,
        holdings: HashMap<String, i64>,
        actor: EntryActor,
        info: Option<Value>,
    ) -> Result<Entry, EconomyError> {
        self.store.update_holdings(account.id(), &holdings).await?;

        let entry = Entry::new(account.id(), entry_type, rows, actor, info);
        if let Err(record_err) = economy.ledger().record(&entry).await {
            tracing::warn!(
                "entry record failed for account {}, rolling back holdings",
                account.id()
            );
            if let Err(rollback_err) = self
                .store
                .update_holdings(account.id(), account.holdings())
                .await
            {
                tracing::error!(
                    "holdings rollback for account {} failed: {}; balances and ledger have diverged",
                    account.id(),
                    rollback_err
                );
            }
            return Err(record_err);
        }

        Ok(entry)
    }

    /// Shared path of every single-account bundle mutation.
    async fn mutate(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        action: CustomAction,
        actor: EntryActor,
        bundles: &[CurrencyBundle],
        info: Option<Value>,
    ) -> Result<Entry, EconomyError> {
        Self::validate_bundles(economy, bundles, action)?;

        let _guard = economy.locks().lock(id).await;
        let account = self.load(id).await?;
        let (rows, holdings) = Self::apply_bundles(&account, action, bundles)?;

        self.commit(
            economy,
            &account,
            action.entry_type(),
            rows,
            holdings,
            actor,
            info,
        )
        .await
    }

    /// Shared path of the reset operations.
    async fn reset(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        actor: EntryActor,
        currency: Option<&Currency>,
        info: Option<Value>,
    ) -> Result<Entry, EconomyError> {
        if let Some(currency) = currency {
            if !economy.currencies().is_registered(currency) {
                return Err(EconomyError::UnknownCurrency {
                    name: currency.name().to_string(),
                });
            }
        }

        let _guard = economy.locks().lock(id).await;
        let account = self.load(id).await?;
        let mut holdings = account.holdings().clone();

        let rows = match currency {
            Some(currency) => {
                if !account.scope().allows(currency.name()) {
                    return Err(EconomyError::CurrencyNotAllowed {
                        account: id,
                        currency: currency.name().to_string(),
                    });
                }
                let before = account.balance_of(currency.name());
                holdings.insert(currency.name().to_string(), 0);
                vec![EntryCurrencyData::new(currency.name(), before, 0)]
            }
            None => {
                // One row per currency that actually had something to zero,
                // in stable order.
                let mut rows: Vec<EntryCurrencyData> = account
                    .holdings()
                    .iter()
                    .filter(|(_, amount)| **amount != 0)
                    .map(|(name, amount)| EntryCurrencyData::new(name.as_str(), *amount, 0))
                    .collect();
                rows.sort_by(|a, b| a.currency_name().cmp(b.currency_name()));

                for amount in holdings.values_mut() {
                    *amount = 0;
                }
                rows
            }
        };

        self.commit(economy, &account, EntryType::Set, rows, holdings, actor, info)
            .await
    }
}

// ============================================================================
// TRAIT IMPLEMENTATION
// ============================================================================

#[async_trait]
impl<S: AccountStore> AccountManager for StandardAccountManager<S> {
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn create_account(
        &self,
        economy: &EconomyProvider,
        name: &str,
        scope: CurrencyScope,
    ) -> Result<Account, EconomyError> {
        if let CurrencyScope::Single(currency) = &scope {
            if economy.currencies().currency(currency).is_none() {
                return Err(EconomyError::UnknownCurrency {
                    name: currency.clone(),
                });
            }
        }

        let main = economy.currencies().main_currency();
        let starting = economy.config().starting_balance;
        let mut holdings = HashMap::new();
        if starting > 0 && scope.allows(main.name()) {
            holdings.insert(main.name().to_string(), starting);
        }

        let account = Account::new(name, self.kind.clone(), scope, holdings);
        self.store.insert_account(&account).await?;
        tracing::info!(
            "created {} account '{}' ({})",
            self.kind,
            name,
            account.id()
        );

        Ok(account)
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>, EconomyError> {
        self.store.account(id).await
    }

    async fn account_by_name(&self, name: &str) -> Result<Option<Account>, EconomyError> {
        self.store.account_by_name(&self.kind, name).await
    }

    async fn top_accounts(
        &self,
        currency: &Currency,
        limit: usize,
    ) -> Result<Vec<Account>, EconomyError> {
        self.store
            .top_accounts(&self.kind, currency.name(), limit)
            .await
    }

    async fn transfer(
        &self,
        economy: &EconomyProvider,
        from: AccountId,
        to: &Account,
        bundles: &[CurrencyBundle],
        info: Option<Value>,
    ) -> Result<TransferReceipt, EconomyError> {
        Self::validate_bundles(economy, bundles, CustomAction::Remove)?;
        if from == to.id() {
            return Err(EconomyError::SelfTransfer);
        }

        // Resolve the recipient's manager up front so a missing
        // registration fails before anything is locked or written.
        let peer_manager = if to.kind() == self.kind {
            None
        } else {
            Some(economy.accounts().manager_for(to.kind()).ok_or_else(|| {
                EconomyError::ManagerNotRegistered {
                    kind: to.kind().to_string(),
                }
            })?)
        };

        // Scope is fixed at creation, so the caller's snapshot of the
        // recipient is authoritative for this check.
        for bundle in bundles {
            if !to.scope().allows(&bundle.currency) {
                return Err(EconomyError::CurrencyNotAllowed {
                    account: to.id(),
                    currency: bundle.currency.clone(),
                });
            }
        }

        let (_from_guard, _to_guard) = economy.locks().lock_pair(from, to.id()).await;

        let source = self.load(from).await?;
        let (rows, debited) = Self::apply_bundles(&source, CustomAction::Remove, bundles)?;

        // Both balance writes happen before either entry is recorded, so a
        // failed credit leg leaves nothing on the ledger. The debit goes in
        // first; `receive` applies the credit and records the incoming
        // entry, rolling its own write back if that record fails.
        self.store.update_holdings(from, &debited).await?;

        let incoming = match &peer_manager {
            Some(manager) => manager.receive(economy, to.id(), &source, bundles, info.clone()).await,
            None => self.receive(economy, to.id(), &source, bundles, info.clone()).await,
        };
        let incoming = match incoming {
            Ok(incoming) => incoming,
            Err(credit_err) => {
                // The credit leg left the recipient unchanged and recorded
                // nothing, so restoring the debit puts both accounts and
                // the ledger back exactly as they were.
                if let Err(rollback_err) =
                    self.store.update_holdings(from, source.holdings()).await
                {
                    tracing::error!(
                        "debit rollback for account {} failed: {}; balances and ledger have diverged",
                        from,
                        rollback_err
                    );
                }
                return Err(credit_err);
            }
        };

        let outgoing = Entry::new(
            from,
            EntryType::Remove,
            rows,
            EntryActor::Account {
                id: to.id(),
                name: to.name().to_string(),
            },
            info,
        );
        if let Err(record_err) = economy.ledger().record(&outgoing).await {
            // Reachable only on a broken backend: the transfer has fully
            // landed on both accounts and the incoming entry is truthful,
            // so reversing balances now would falsify it. Keep the state
            // and flag the missing source-side entry.
            tracing::error!(
                "outgoing entry record failed for transfer {} -> {}: {}; source-side audit trail is incomplete",
                from,
                to.id(),
                record_err
            );
            return Err(record_err);
        }

        Ok(TransferReceipt { outgoing, incoming })
    }

    async fn receive(
        &self,
        economy: &EconomyProvider,
        to: AccountId,
        from: &Account,
        bundles: &[CurrencyBundle],
        info: Option<Value>,
    ) -> Result<Entry, EconomyError> {
        Self::validate_bundles(economy, bundles, CustomAction::Add)?;

        let account = self.load(to).await?;
        let (rows, credited) = Self::apply_bundles(&account, CustomAction::Add, bundles)?;

        self.commit(
            economy,
            &account,
            EntryType::Add,
            rows,
            credited,
            EntryActor::Account {
                id: from.id(),
                name: from.name().to_string(),
            },
            info,
        )
        .await
    }

    async fn operator_set(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        operator: Operator,
        bundles: &[CurrencyBundle],
        info: Option<Value>,
    ) -> Result<Entry, EconomyError> {
        self.mutate(
            economy,
            id,
            CustomAction::Set,
            EntryActor::Operator(operator),
            bundles,
            info,
        )
        .await
    }

    async fn operator_add(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        operator: Operator,
        bundles: &[CurrencyBundle],
        info: Option<Value>,
    ) -> Result<Entry, EconomyError> {
        self.mutate(
            economy,
            id,
            CustomAction::Add,
            EntryActor::Operator(operator),
            bundles,
            info,
        )
        .await
    }

    async fn operator_remove(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        operator: Operator,
        bundles: &[CurrencyBundle],
        info: Option<Value>,
    ) -> Result<Entry, EconomyError> {
        self.mutate(
            economy,
            id,
            CustomAction::Remove,
            EntryActor::Operator(operator),
            bundles,
            info,
        )
        .await
    }

    async fn operator_reset(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        operator: Operator,
        currency: Option<&Currency>,
        info: Option<Value>,
    ) -> Result<Entry, EconomyError> {
        self.reset(economy, id, EntryActor::Operator(operator), currency, info)
            .await
    }

    async fn custom(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        actor: EntryActor,
        action: CustomAction,
        bundles: &[CurrencyBundle],
        info: Option<Value>,
    ) -> Result<Entry, EconomyError> {
        self.mutate(economy, id, action, actor, bundles, info).await
    }

    async fn custom_reset(
        &self,
        economy: &EconomyProvider,
        id: AccountId,
        actor: EntryActor,
        currency: Option<&Currency>,
        info: Option<Value>,
    ) -> Result<Entry, EconomyError> {
        self.reset(economy, id, actor, currency, info).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
