// Account module - account model, storage port, and the manager contract
// every balance mutation goes through

mod account_manager;
mod account_models;
mod account_store;
mod standard_manager;

pub use account_manager::{AccountManager, TransferReceipt};
pub use account_models::{Account, AccountId, CurrencyScope};
pub use account_store::AccountStore;
pub use standard_manager::StandardAccountManager;
