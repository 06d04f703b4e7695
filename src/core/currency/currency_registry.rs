// The currency registry: owns the set of known currencies and the single
// designated main currency.

use super::currency_models::Currency;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;

/// Registry of every currency known to the deployment.
///
/// The main currency is fixed at construction, so a registry without one
/// cannot exist and `main_currency` never fails. Additional currencies are
/// registered by name; registration is idempotent and never overwrites.
pub struct CurrencyRegistry {
    main: Currency,
    currencies: DashMap<String, Currency>,
}

impl CurrencyRegistry {
    /// Create a registry with `main` as the deployment's main currency.
    /// The main currency is registered like any other.
    pub fn new(main: Currency) -> Self {
        let currencies = DashMap::new();
        currencies.insert(main.name().to_string(), main.clone());
        tracing::info!("currency registry created, main currency '{}'", main.name());
        Self { main, currencies }
    }

    /// The single designated main currency of the server.
    pub fn main_currency(&self) -> Currency {
        self.main.clone()
    }

    /// Look up a currency by name.
    pub fn currency(&self, name: &str) -> Option<Currency> {
        self.currencies.get(name).map(|c| c.value().clone())
    }

    /// Register a new currency if one with that name does not exist.
    ///
    /// Returns `true` if the currency was newly added, `false` if a currency
    /// with that name was already registered (the existing one is kept).
    pub fn create_currency(&self, currency: Currency) -> bool {
        match self.currencies.entry(currency.name().to_string()) {
            MapEntry::Occupied(_) => false,
            MapEntry::Vacant(slot) => {
                tracing::info!("registered currency '{}'", currency.name());
                slot.insert(currency);
                true
            }
        }
    }

    /// Is this currency present in the registry?
    pub fn is_registered(&self, currency: &Currency) -> bool {
        self.currencies.contains_key(currency.name())
    }

    /// All registered currencies, main included.
    pub fn all(&self) -> Vec<Currency> {
        self.currencies.iter().map(|c| c.value().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CurrencyRegistry {
        CurrencyRegistry::new(Currency::new("coins", "¤", 0))
    }

    #[test]
    fn main_currency_is_registered_at_construction() {
        let registry = registry();
        assert_eq!(registry.main_currency().name(), "coins");
        assert!(registry.is_registered(&registry.main_currency()));
        assert_eq!(registry.currency("coins").unwrap().name(), "coins");
    }

    #[test]
    fn created_currency_is_immediately_resolvable() {
        let registry = registry();
        let gold = Currency::new("gold", "G", 0);
        assert!(registry.create_currency(gold.clone()));
        assert!(registry.is_registered(&gold));
        assert_eq!(registry.currency("gold").unwrap(), gold);
    }

    #[test]
    fn create_currency_is_idempotent_not_an_overwrite() {
        let registry = registry();
        assert!(registry.create_currency(Currency::new("gold", "G", 0)));
        assert!(!registry.create_currency(Currency::new("gold", "g", 2)));

        // The original registration wins.
        let kept = registry.currency("gold").unwrap();
        assert_eq!(kept.symbol(), "G");
        assert_eq!(kept.decimal_places(), 0);
    }

    #[test]
    fn missing_currency_is_none_not_an_error() {
        assert!(registry().currency("mithril").is_none());
    }

    #[test]
    fn all_lists_every_registration() {
        let registry = registry();
        registry.create_currency(Currency::new("gold", "G", 0));
        let mut names: Vec<String> = registry.all().iter().map(|c| c.name().to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["coins", "gold"]);
    }
}
