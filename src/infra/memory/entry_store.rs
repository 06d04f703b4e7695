// In-memory implementation of the EntryStore trait.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::account::AccountId;
use crate::core::error::EconomyError;
use crate::core::ledger::{Entry, EntryStore};

/// Append-ordered in-memory ledger.
///
/// A plain Vec behind an RwLock: appends push to the back, so iterating in
/// reverse gives newest-first without tracking timestamps.
pub struct InMemoryEntryStore {
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryEntryStore {
    /// Create a new empty in-memory ledger.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryEntryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryStore for InMemoryEntryStore {
    async fn append_entry(&self, entry: &Entry) -> Result<(), EconomyError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn entries_for_account(
        &self,
        account: AccountId,
        limit: usize,
    ) -> Result<Vec<Entry>, EconomyError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.account_id() == account)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn entry_count(&self, account: AccountId) -> Result<u64, EconomyError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|e| e.account_id() == account).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::{EntryActor, EntryCurrencyData, EntryType};

    fn entry_for(account: AccountId, after: i64) -> Entry {
        Entry::new(
            account,
            EntryType::Set,
            vec![EntryCurrencyData::new("gold", 0, after)],
            EntryActor::None,
            None,
        )
    }

    #[tokio::test]
    async fn entries_come_back_newest_first() {
        let store = InMemoryEntryStore::new();
        let account = AccountId::new();

        for i in 1..=3 {
            store.append_entry(&entry_for(account, i)).await.unwrap();
        }
        store
            .append_entry(&entry_for(AccountId::new(), 99))
            .await
            .unwrap();

        let entries = store.entries_for_account(account, 2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].currencies()[0].balance_after(), 3);
        assert_eq!(entries[1].currencies()[0].balance_after(), 2);

        assert_eq!(store.entry_count(account).await.unwrap(), 3);
    }
}
