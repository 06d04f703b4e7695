// The economy provider: the handle the hosting server, and every extension,
// uses to reach the engine.
//
// Everything hangs off one initialized provider - currency registry, account
// registry, ledger, lock table. There is no ambient global to reach for:
// once `initialize` returns, every accessor is valid, and code that never
// got handed a provider has no way to touch the economy half-built.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core::account::AccountId;
use crate::core::currency::{Currency, CurrencyRegistry};
use crate::core::ledger::{EntryStore, LedgerService};
use crate::core::registry::AccountRegistry;

/// Deployment configuration for the economy.
#[derive(Debug, Clone)]
pub struct EconomyConfig {
    /// The single designated main currency.
    pub main_currency: Currency,
    /// Main-currency balance seeded into every newly created account whose
    /// scope can hold it. Seeding writes no ledger entry.
    pub starting_balance: i64,
    /// Default cap on ledger history queries.
    pub history_limit: usize,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            main_currency: Currency::new("coins", "¤", 0),
            starting_balance: 0,
            history_limit: 50,
        }
    }
}

/// Per-account mutual exclusion.
///
/// Every mutation holds the account's lock for its whole
/// read-validate-write-record span, so concurrent operations on one account
/// serialize instead of interleaving into lost updates.
pub struct AccountLocks {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl AccountLocks {
    fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, id: AccountId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Take the lock for one account.
    pub async fn lock(&self, id: AccountId) -> OwnedMutexGuard<()> {
        self.lock_for(id).lock_owned().await
    }

    /// Take the locks for two distinct accounts.
    ///
    /// Acquisition is always in ascending id order regardless of argument
    /// order, so two concurrent opposite-direction transfers cannot
    /// deadlock. The guards come back in argument order.
    pub async fn lock_pair(
        &self,
        a: AccountId,
        b: AccountId,
    ) -> (OwnedMutexGuard<()>, OwnedMutexGuard<()>) {
        debug_assert_ne!(a, b, "lock_pair needs two distinct accounts");

        if a < b {
            let first = self.lock(a).await;
            let second = self.lock(b).await;
            (first, second)
        } else {
            let second = self.lock(b).await;
            let first = self.lock(a).await;
            (first, second)
        }
    }
}

/// The initialized economy.
///
/// Built once by the hosting server at startup and shared (as an `Arc`)
/// with every extension. All accessors are valid from the moment
/// [`initialize`](Self::initialize) returns.
pub struct EconomyProvider {
    config: EconomyConfig,
    currencies: CurrencyRegistry,
    accounts: AccountRegistry,
    ledger: LedgerService,
    locks: AccountLocks,
}

impl EconomyProvider {
    /// Wire up the engine: currency registry seeded with the configured
    /// main currency, an empty account registry, the ledger over
    /// `entry_store`, and a fresh lock table.
    ///
    /// Account managers are constructed by the host against its stores of
    /// choice and registered on [`accounts`](Self::accounts) afterwards.
    pub fn initialize(config: EconomyConfig, entry_store: Arc<dyn EntryStore>) -> Arc<Self> {
        let currencies = CurrencyRegistry::new(config.main_currency.clone());
        let ledger = LedgerService::new(entry_store, config.history_limit);
        tracing::info!(
            "economy initialized, main currency '{}'",
            config.main_currency.name()
        );

        Arc::new(Self {
            config,
            currencies,
            accounts: AccountRegistry::new(),
            ledger,
            locks: AccountLocks::new(),
        })
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// The currency registry.
    pub fn currencies(&self) -> &CurrencyRegistry {
        &self.currencies
    }

    /// The account-manager registry.
    pub fn accounts(&self) -> &AccountRegistry {
        &self.accounts
    }

    /// The audit ledger.
    pub fn ledger(&self) -> &LedgerService {
        &self.ledger
    }

    /// The per-account lock table. Account managers take these locks;
    /// a custom manager implementation must do the same.
    pub fn locks(&self) -> &AccountLocks {
        &self.locks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryEntryStore;
    use std::time::Duration;

    fn economy() -> Arc<EconomyProvider> {
        EconomyProvider::initialize(
            EconomyConfig::default(),
            Arc::new(InMemoryEntryStore::new()),
        )
    }

    #[tokio::test]
    async fn every_accessor_is_valid_after_initialize() {
        let economy = economy();
        assert_eq!(economy.currencies().main_currency().name(), "coins");
        assert!(economy.accounts().kinds().is_empty());
        assert_eq!(economy.config().history_limit, 50);

        let id = AccountId::new();
        assert_eq!(economy.ledger().entry_count(id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn account_lock_serializes_access() {
        let economy = economy();
        let id = AccountId::new();

        let guard = economy.locks().lock(id).await;
        let contender = {
            let economy = economy.clone();
            tokio::spawn(async move { economy.locks().lock(id).await })
        };

        // The second take cannot finish while the first guard lives.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lock_pair_orders_acquisition_by_id() {
        let economy = economy();
        let a = AccountId::new();
        let b = AccountId::new();

        // Grab the pair in both argument orders concurrently, many times.
        // With unordered acquisition this deadlocks almost immediately.
        let forward = {
            let economy = economy.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    let _guards = economy.locks().lock_pair(a, b).await;
                }
            })
        };
        let backward = {
            let economy = economy.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    let _guards = economy.locks().lock_pair(b, a).await;
                }
            })
        };

        tokio::time::timeout(Duration::from_secs(5), async {
            forward.await.unwrap();
            backward.await.unwrap();
        })
        .await
        .expect("lock_pair deadlocked");
    }
}
