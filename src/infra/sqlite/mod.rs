// SQLite implementations of the core storage ports.
//
// Both stores migrate their own tables (idempotently) on construction and
// can share one connection pool through `from_pool`.

mod account_store;
mod entry_store;

pub use account_store::SqliteAccountStore;
pub use entry_store::SqliteEntryStore;
