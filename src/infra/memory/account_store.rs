// In-memory implementation of the AccountStore trait.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::collections::HashMap;

use crate::core::account::{Account, AccountId, AccountStore};
use crate::core::error::EconomyError;

/// Composite key for the name index: names are only unique within a kind.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct KindNameKey {
    kind: String,
    name: String,
}

/// DashMap-backed account store.
///
/// The name index is what makes duplicate detection atomic: an insert
/// claims the (kind, name) slot first and only then stores the account.
pub struct InMemoryAccountStore {
    accounts: DashMap<AccountId, Account>,
    names: DashMap<KindNameKey, AccountId>,
}

impl InMemoryAccountStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            names: DashMap::new(),
        }
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert_account(&self, account: &Account) -> Result<(), EconomyError> {
        let key = KindNameKey {
            kind: account.kind().to_string(),
            name: account.name().to_string(),
        };
        match self.names.entry(key) {
            MapEntry::Occupied(_) => Err(EconomyError::DuplicateAccount {
                name: account.name().to_string(),
            }),
            MapEntry::Vacant(slot) => {
                slot.insert(account.id());
                self.accounts.insert(account.id(), account.clone());
                Ok(())
            }
        }
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>, EconomyError> {
        Ok(self.accounts.get(&id).map(|a| a.value().clone()))
    }

    async fn account_by_name(
        &self,
        kind: &str,
        name: &str,
    ) -> Result<Option<Account>, EconomyError> {
        let key = KindNameKey {
            kind: kind.to_string(),
            name: name.to_string(),
        };
        let Some(id) = self.names.get(&key).map(|id| *id.value()) else {
            return Ok(None);
        };
        self.account(id).await
    }

    async fn update_holdings(
        &self,
        id: AccountId,
        holdings: &HashMap<String, i64>,
    ) -> Result<(), EconomyError> {
        let Some(mut account) = self.accounts.get_mut(&id) else {
            return Err(EconomyError::AccountNotFound { id });
        };
        *account = Account::restore(
            account.id(),
            account.name(),
            account.kind(),
            account.scope().clone(),
            holdings.clone(),
            account.created(),
        );
        Ok(())
    }

    async fn top_accounts(
        &self,
        kind: &str,
        currency: &str,
        limit: usize,
    ) -> Result<Vec<Account>, EconomyError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|a| a.kind() == kind)
            .map(|a| a.value().clone())
            .collect();

        // Richest first; ties broken by name so the order is stable.
        accounts.sort_by(|a, b| {
            b.balance_of(currency)
                .cmp(&a.balance_of(currency))
                .then_with(|| a.name().cmp(b.name()))
        });
        accounts.truncate(limit);
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::CurrencyScope;

    fn account(name: &str, kind: &str, gold: i64) -> Account {
        let mut holdings = HashMap::new();
        if gold != 0 {
            holdings.insert("gold".to_string(), gold);
        }
        Account::new(name, kind, CurrencyScope::Multi, holdings)
    }

    #[tokio::test]
    async fn insert_then_fetch_by_id_and_name() {
        let store = InMemoryAccountStore::new();
        let alice = account("alice", "player", 10);
        store.insert_account(&alice).await.unwrap();

        assert_eq!(store.account(alice.id()).await.unwrap().unwrap(), alice);
        assert_eq!(
            store
                .account_by_name("player", "alice")
                .await
                .unwrap()
                .unwrap(),
            alice
        );
        assert!(store
            .account_by_name("town", "alice")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_name_within_a_kind_is_rejected() {
        let store = InMemoryAccountStore::new();
        store
            .insert_account(&account("alice", "player", 0))
            .await
            .unwrap();

        let result = store.insert_account(&account("alice", "player", 0)).await;
        assert!(matches!(result, Err(EconomyError::DuplicateAccount { .. })));

        // The same name under a different kind is a different account.
        store
            .insert_account(&account("alice", "town", 0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_holdings_replaces_only_the_balances() {
        let store = InMemoryAccountStore::new();
        let alice = account("alice", "player", 10);
        store.insert_account(&alice).await.unwrap();

        let mut holdings = HashMap::new();
        holdings.insert("gold".to_string(), 75);
        store.update_holdings(alice.id(), &holdings).await.unwrap();

        let reloaded = store.account(alice.id()).await.unwrap().unwrap();
        assert_eq!(reloaded.balance_of("gold"), 75);
        assert_eq!(reloaded.id(), alice.id());
        assert_eq!(reloaded.created(), alice.created());

        let missing = store.update_holdings(AccountId::new(), &holdings).await;
        assert!(matches!(missing, Err(EconomyError::AccountNotFound { .. })));
    }

    #[tokio::test]
    async fn top_accounts_ranks_within_the_kind() {
        let store = InMemoryAccountStore::new();
        store
            .insert_account(&account("alice", "player", 200))
            .await
            .unwrap();
        store
            .insert_account(&account("bob", "player", 500))
            .await
            .unwrap();
        store
            .insert_account(&account("carol", "player", 100))
            .await
            .unwrap();
        store
            .insert_account(&account("springfield", "town", 9000))
            .await
            .unwrap();

        let top = store.top_accounts("player", "gold", 2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name(), "bob");
        assert_eq!(top[1].name(), "alice");
    }
}
