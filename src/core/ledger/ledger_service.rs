// The ledger: recording and querying audit entries.

use async_trait::async_trait;
use std::sync::Arc;

use super::entry_models::Entry;
use crate::core::account::AccountId;
use crate::core::error::EconomyError;

/// Trait for persisting ledger entries.
///
/// The ledger is append-only: implementations take finished entries and
/// hand them back unchanged, newest first. There is deliberately no way to
/// update or delete an entry through this port.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Append one entry to the ledger.
    async fn append_entry(&self, entry: &Entry) -> Result<(), EconomyError>;

    /// The most recent entries recorded against `account`, newest first.
    async fn entries_for_account(
        &self,
        account: AccountId,
        limit: usize,
    ) -> Result<Vec<Entry>, EconomyError>;

    /// How many entries the ledger holds for `account`.
    async fn entry_count(&self, account: AccountId) -> Result<u64, EconomyError>;
}

/// Service wrapping the entry store.
///
/// Account managers call [`record`](Self::record) as the final step of
/// every mutation; everyone else reads history through here.
pub struct LedgerService {
    store: Arc<dyn EntryStore>,
    history_limit: usize,
}

impl LedgerService {
    pub fn new(store: Arc<dyn EntryStore>, history_limit: usize) -> Self {
        Self {
            store,
            history_limit,
        }
    }

    /// Append `entry` to the ledger.
    pub async fn record(&self, entry: &Entry) -> Result<(), EconomyError> {
        self.store.append_entry(entry).await?;
        tracing::debug!(
            "recorded {} entry {} for account {}",
            entry.entry_type().as_str(),
            entry.id(),
            entry.account_id()
        );
        Ok(())
    }

    /// The most recent entries for `account`, newest first. A `limit` of
    /// `None` falls back to the configured history limit.
    pub async fn history(
        &self,
        account: AccountId,
        limit: Option<usize>,
    ) -> Result<Vec<Entry>, EconomyError> {
        self.store
            .entries_for_account(account, limit.unwrap_or(self.history_limit))
            .await
    }

    /// Total number of entries recorded against `account`.
    pub async fn entry_count(&self, account: AccountId) -> Result<u64, EconomyError> {
        self.store.entry_count(account).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::{EntryActor, EntryCurrencyData, EntryType};
    use crate::infra::memory::InMemoryEntryStore;

    fn entry_for(account: AccountId, before: i64, after: i64) -> Entry {
        Entry::new(
            account,
            EntryType::Add,
            vec![EntryCurrencyData::new("gold", before, after)],
            EntryActor::None,
            None,
        )
    }

    #[tokio::test]
    async fn history_is_newest_first_and_capped() {
        let ledger = LedgerService::new(Arc::new(InMemoryEntryStore::new()), 2);
        let account = AccountId::new();

        for i in 0..4 {
            ledger.record(&entry_for(account, i, i + 1)).await.unwrap();
        }

        // The default cap is the configured limit.
        let history = ledger.history(account, None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].currencies()[0].balance_after(), 4);
        assert_eq!(history[1].currencies()[0].balance_after(), 3);

        // An explicit limit overrides it.
        let history = ledger.history(account, Some(10)).await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(ledger.entry_count(account).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn history_is_scoped_to_the_account() {
        let ledger = LedgerService::new(Arc::new(InMemoryEntryStore::new()), 50);
        let alice = AccountId::new();
        let bob = AccountId::new();

        ledger.record(&entry_for(alice, 0, 10)).await.unwrap();
        ledger.record(&entry_for(bob, 0, 20)).await.unwrap();

        let history = ledger.history(alice, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].account_id(), alice);
        assert_eq!(ledger.entry_count(bob).await.unwrap(), 1);
    }
}
