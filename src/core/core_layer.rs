// The core module contains all domain logic.
// Each feature gets its own submodule.

#[path = "account/mod.rs"]
pub mod account;

#[path = "currency/mod.rs"]
pub mod currency;

#[path = "error.rs"]
pub mod error;

#[path = "ledger/mod.rs"]
pub mod ledger;

#[path = "provider.rs"]
pub mod provider;

#[path = "registry/mod.rs"]
pub mod registry;
