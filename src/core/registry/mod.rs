// Registry module - maps account kinds to the managers that own them

mod account_registry;

pub use account_registry::AccountRegistry;
