// Currency module - currency value types and the server-wide registry

mod currency_models;
mod currency_registry;

pub use currency_models::{Currency, CurrencyBundle};
pub use currency_registry::CurrencyRegistry;
