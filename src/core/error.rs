// Error types shared across the economy engine.
//
// Lookups that can simply miss (currency by name, account by id) return
// Option instead of an error; these variants cover everything else a caller
// can run into, kept distinct so admin-facing commands can report precisely
// what went wrong.

use crate::core::account::AccountId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EconomyError {
    #[error("currency '{name}' is not registered")]
    UnknownCurrency { name: String },

    #[error("account {account} cannot hold currency '{currency}'")]
    CurrencyNotAllowed {
        account: AccountId,
        currency: String,
    },

    #[error("insufficient funds: need {required} '{currency}', but only have {available}")]
    InsufficientFunds {
        currency: String,
        required: i64,
        available: i64,
    },

    #[error("balance overflow in currency '{currency}'")]
    BalanceOverflow { currency: String },

    #[error("account {id} was not found")]
    AccountNotFound { id: AccountId },

    #[error("an account named '{name}' already exists")]
    DuplicateAccount { name: String },

    #[error("no account manager registered for kind '{kind}'")]
    ManagerNotRegistered { kind: String },

    #[error("an account manager for kind '{kind}' is already registered")]
    ManagerAlreadyRegistered { kind: String },

    #[error("invalid currency bundles: {0}")]
    InvalidBundle(String),

    #[error("transfers require two distinct accounts")]
    SelfTransfer,

    #[error("store error: {0}")]
    Store(String),
}
