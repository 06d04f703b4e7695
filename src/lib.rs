//! `game_economy` - a virtual-economy engine for multiplayer game servers.
//!
//! **Architecture Overview:**
//! - `core/` = Domain logic (currencies, accounts, ledger, registries)
//! - `infra/` = Implementations of core storage ports (in-memory, SQLite)
//!
//! The hosting server builds an [`EconomyProvider`] at startup, registers an
//! account manager per account kind, and hands the provider to extensions.
//! Every balance mutation goes through a manager and comes back with the
//! ledger [`Entry`] it produced; a mutation that left no audit trail cannot
//! exist.
//!
//! ```no_run
//! use std::sync::Arc;
//! use game_economy::{
//!     AccountManager, Currency, CurrencyBundle, CurrencyScope, EconomyConfig, EconomyProvider,
//!     Operator, StandardAccountManager,
//! };
//! use game_economy::infra::memory::{InMemoryAccountStore, InMemoryEntryStore};
//!
//! # async fn run() -> Result<(), game_economy::EconomyError> {
//! let economy = EconomyProvider::initialize(
//!     EconomyConfig {
//!         main_currency: Currency::new("gold", "G", 0),
//!         starting_balance: 100,
//!         ..Default::default()
//!     },
//!     Arc::new(InMemoryEntryStore::new()),
//! );
//!
//! let players = Arc::new(StandardAccountManager::new("player", InMemoryAccountStore::new()));
//! economy.accounts().register(players.clone())?;
//!
//! let alice = players.create_account(&economy, "alice", CurrencyScope::Multi).await?;
//! let entry = players
//!     .operator_add(
//!         &economy,
//!         alice.id(),
//!         Operator::Server,
//!         &[CurrencyBundle::from_name("gold", 50)],
//!         None,
//!     )
//!     .await?;
//! assert_eq!(entry.currencies()[0].balance_after(), 150);
//! # Ok(())
//! # }
//! ```

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with a pair of mod.rs files that both look the same.
#[path = "core/core_layer.rs"]
pub mod core;
#[path = "infra/infra_layer.rs"]
pub mod infra;

pub use crate::core::account::{
    Account, AccountId, AccountManager, AccountStore, CurrencyScope, StandardAccountManager,
    TransferReceipt,
};
pub use crate::core::currency::{Currency, CurrencyBundle, CurrencyRegistry};
pub use crate::core::error::EconomyError;
pub use crate::core::ledger::{
    CustomAction, Entry, EntryActor, EntryCurrencyData, EntryStore, EntryType, LedgerService,
    Operator,
};
pub use crate::core::provider::{AccountLocks, EconomyConfig, EconomyProvider};
pub use crate::core::registry::AccountRegistry;
