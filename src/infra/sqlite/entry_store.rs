// SQLite implementation of the EntryStore trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use crate::core::account::AccountId;
use crate::core::error::EconomyError;
use crate::core::ledger::{Entry, EntryActor, EntryCurrencyData, EntryStore, EntryType};

pub struct SqliteEntryStore {
    pool: SqlitePool,
}

impl SqliteEntryStore {
    /// Create a new SQLite entry store with the given database path.
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        let connection_string = format!("sqlite://{}", database_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await?;

        Self::from_pool(pool).await
    }

    /// Create an entry store using an existing SQLite pool.
    pub async fn from_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create tables.
    async fn migrate(&self) -> anyhow::Result<()> {
        // Append-only: there are no UPDATE or DELETE statements against
        // this table anywhere in the crate.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                entry_type TEXT NOT NULL,
                currencies TEXT NOT NULL,
                actor TEXT NOT NULL,
                info TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Covering index for the history query
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_entries_account
            ON entries(account_id, created_at DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn decode_entry(row: &SqliteRow) -> Result<Entry, EconomyError> {
        let id: String = row.get("id");
        let id = Uuid::parse_str(&id).map_err(|e| EconomyError::Store(e.to_string()))?;

        let account_id: String = row.get("account_id");
        let account_id =
            Uuid::parse_str(&account_id).map_err(|e| EconomyError::Store(e.to_string()))?;

        let entry_type: String = row.get("entry_type");
        let entry_type = EntryType::from_str(&entry_type)
            .ok_or_else(|| EconomyError::Store(format!("unknown entry type '{}'", entry_type)))?;

        let currencies: String = row.get("currencies");
        let currencies: Vec<EntryCurrencyData> =
            serde_json::from_str(&currencies).map_err(|e| EconomyError::Store(e.to_string()))?;

        let actor: String = row.get("actor");
        let actor: EntryActor =
            serde_json::from_str(&actor).map_err(|e| EconomyError::Store(e.to_string()))?;

        let info: Option<String> = row.get("info");
        let info: Option<Value> = info
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| EconomyError::Store(e.to_string()))?;

        let created_at: String = row.get("created_at");
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| EconomyError::Store(e.to_string()))?;

        Ok(Entry::restore(
            id,
            AccountId::from_uuid(account_id),
            entry_type,
            currencies,
            actor,
            info,
            created_at,
        ))
    }
}

#[async_trait]
impl EntryStore for SqliteEntryStore {
    async fn append_entry(&self, entry: &Entry) -> Result<(), EconomyError> {
        let currencies = serde_json::to_string(entry.currencies())
            .map_err(|e| EconomyError::Store(e.to_string()))?;
        let actor = serde_json::to_string(entry.actor())
            .map_err(|e| EconomyError::Store(e.to_string()))?;
        let info = entry
            .info()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| EconomyError::Store(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO entries (id, account_id, entry_type, currencies, actor, info, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id().to_string())
        .bind(entry.account_id().as_uuid().to_string())
        .bind(entry.entry_type().as_str())
        .bind(currencies)
        .bind(actor)
        .bind(info)
        .bind(entry.created_at().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| EconomyError::Store(e.to_string()))?;

        Ok(())
    }

    async fn entries_for_account(
        &self,
        account: AccountId,
        limit: usize,
    ) -> Result<Vec<Entry>, EconomyError> {
        // rowid breaks created_at ties in append order
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, entry_type, currencies, actor, info, created_at
            FROM entries
            WHERE account_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(account.as_uuid().to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EconomyError::Store(e.to_string()))?;

        rows.iter().map(Self::decode_entry).collect()
    }

    async fn entry_count(&self, account: AccountId) -> Result<u64, EconomyError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM entries
            WHERE account_id = ?
            "#,
        )
        .bind(account.as_uuid().to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| EconomyError::Store(e.to_string()))?;

        Ok(row.get::<i64, _>("count") as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::Operator;
    use tempfile::NamedTempFile;

    fn entry_for(account: AccountId, after: i64) -> Entry {
        Entry::new(
            account,
            EntryType::Add,
            vec![EntryCurrencyData::new("gold", 0, after)],
            EntryActor::Operator(Operator::Server),
            Some(serde_json::json!({ "reason": "test" })),
        )
    }

    #[tokio::test]
    async fn entries_survive_a_reconnect_newest_first() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap().to_owned();
        let account = AccountId::new();

        {
            let store = SqliteEntryStore::new(&path).await.unwrap();
            for i in 1..=3 {
                store.append_entry(&entry_for(account, i)).await.unwrap();
            }
            store
                .append_entry(&entry_for(AccountId::new(), 99))
                .await
                .unwrap();
        }

        let store = SqliteEntryStore::new(&path).await.unwrap();
        let entries = store.entries_for_account(account, 2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].currencies()[0].balance_after(), 3);
        assert_eq!(entries[1].currencies()[0].balance_after(), 2);
        assert_eq!(store.entry_count(account).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn every_field_round_trips() {
        let tmp = NamedTempFile::new().unwrap();
        let store = SqliteEntryStore::new(tmp.path().to_str().unwrap())
            .await
            .unwrap();

        let entry = entry_for(AccountId::new(), 42);
        store.append_entry(&entry).await.unwrap();

        let reloaded = store
            .entries_for_account(entry.account_id(), 1)
            .await
            .unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded[0], entry);
    }

    #[tokio::test]
    async fn both_stores_share_one_pool() {
        use crate::core::account::{Account, CurrencyScope};
        use crate::infra::sqlite::SqliteAccountStore;
        use crate::core::account::AccountStore;
        use std::collections::HashMap;

        let tmp = NamedTempFile::new().unwrap();
        let connection_string = format!("sqlite://{}", tmp.path().to_str().unwrap());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await
            .unwrap();

        let accounts = SqliteAccountStore::from_pool(pool.clone()).await.unwrap();
        let entries = SqliteEntryStore::from_pool(pool).await.unwrap();

        let alice = Account::new("alice", "player", CurrencyScope::Multi, HashMap::new());
        accounts.insert_account(&alice).await.unwrap();
        entries.append_entry(&entry_for(alice.id(), 7)).await.unwrap();

        assert!(accounts.account(alice.id()).await.unwrap().is_some());
        assert_eq!(entries.entry_count(alice.id()).await.unwrap(), 1);
    }
}
