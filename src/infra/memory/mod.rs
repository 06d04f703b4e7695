// In-memory implementations of the core storage ports.
//
// These back tests and throwaway servers; deployments that must survive a
// restart use the SQLite stores instead. Both implement the same traits,
// so the engine never knows the difference.

mod account_store;
mod entry_store;

pub use account_store::InMemoryAccountStore;
pub use entry_store::InMemoryEntryStore;
