// SQLite implementation of the AccountStore trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::account::{Account, AccountId, AccountStore, CurrencyScope};
use crate::core::error::EconomyError;

pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    /// Create a new SQLite account store with the given database path.
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        let connection_string = format!("sqlite://{}", database_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await?;

        Self::from_pool(pool).await
    }

    /// Create an account store using an existing SQLite pool.
    pub async fn from_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create tables.
    async fn migrate(&self) -> anyhow::Result<()> {
        // Scope and holdings are JSON text; names are unique within a kind.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                scope TEXT NOT NULL,
                holdings TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (kind, name)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn decode_account(row: &SqliteRow) -> Result<Account, EconomyError> {
        let id: String = row.get("id");
        let id = Uuid::parse_str(&id).map_err(|e| EconomyError::Store(e.to_string()))?;

        let scope: String = row.get("scope");
        let scope: CurrencyScope =
            serde_json::from_str(&scope).map_err(|e| EconomyError::Store(e.to_string()))?;

        let holdings: String = row.get("holdings");
        let holdings: HashMap<String, i64> =
            serde_json::from_str(&holdings).map_err(|e| EconomyError::Store(e.to_string()))?;

        let created_at: String = row.get("created_at");
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| EconomyError::Store(e.to_string()))?;

        Ok(Account::restore(
            AccountId::from_uuid(id),
            row.get::<String, _>("name"),
            row.get::<String, _>("kind"),
            scope,
            holdings,
            created_at,
        ))
    }

    fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, EconomyError> {
        serde_json::to_string(value).map_err(|e| EconomyError::Store(e.to_string()))
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn insert_account(&self, account: &Account) -> Result<(), EconomyError> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, kind, name, scope, holdings, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id().as_uuid().to_string())
        .bind(account.kind())
        .bind(account.name())
        .bind(Self::encode_json(account.scope())?)
        .bind(Self::encode_json(account.holdings())?)
        .bind(account.created().to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation()) =>
            {
                Err(EconomyError::DuplicateAccount {
                    name: account.name().to_string(),
                })
            }
            Err(e) => Err(EconomyError::Store(e.to_string())),
        }
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>, EconomyError> {
        let row = sqlx::query(
            r#"
            SELECT id, kind, name, scope, holdings, created_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.as_uuid().to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EconomyError::Store(e.to_string()))?;

        row.as_ref().map(Self::decode_account).transpose()
    }

    async fn account_by_name(
        &self,
        kind: &str,
        name: &str,
    ) -> Result<Option<Account>, EconomyError> {
        let row = sqlx::query(
            r#"
            SELECT id, kind, name, scope, holdings, created_at
            FROM accounts
            WHERE kind = ? AND name = ?
            "#,
        )
        .bind(kind)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EconomyError::Store(e.to_string()))?;

        row.as_ref().map(Self::decode_account).transpose()
    }

    async fn update_holdings(
        &self,
        id: AccountId,
        holdings: &HashMap<String, i64>,
    ) -> Result<(), EconomyError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET holdings = ?
            WHERE id = ?
            "#,
        )
        .bind(Self::encode_json(holdings)?)
        .bind(id.as_uuid().to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| EconomyError::Store(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(EconomyError::AccountNotFound { id });
        }
        Ok(())
    }

    async fn top_accounts(
        &self,
        kind: &str,
        currency: &str,
        limit: usize,
    ) -> Result<Vec<Account>, EconomyError> {
        // Holdings live in a JSON column, so the ranking happens here
        // rather than in SQL.
        let rows = sqlx::query(
            r#"
            SELECT id, kind, name, scope, holdings, created_at
            FROM accounts
            WHERE kind = ?
            "#,
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EconomyError::Store(e.to_string()))?;

        let mut accounts = rows
            .iter()
            .map(Self::decode_account)
            .collect::<Result<Vec<Account>, EconomyError>>()?;

        accounts.sort_by(|a, b| {
            b.balance_of(currency)
                .cmp(&a.balance_of(currency))
                .then_with(|| a.name().cmp(b.name()))
        });
        accounts.truncate(limit);
        Ok(accounts)
    }
}
