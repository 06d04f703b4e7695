// Ledger module - the append-only audit trail of the economy

mod entry_models;
mod ledger_service;

pub use entry_models::{
    CustomAction, Entry, EntryActor, EntryCurrencyData, EntryType, Operator,
};
pub use ledger_service::{EntryStore, LedgerService};
