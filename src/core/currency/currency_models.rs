// Currency value types.
//
// Amounts everywhere in the engine are i64 in minor units; a currency's
// decimal_places only affects how amounts are rendered for players.

use serde::{Deserialize, Serialize};

/// A named unit of value known to the server.
///
/// The name doubles as the registry key, so two currencies with the same name
/// are the same currency as far as the engine is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    name: String,
    symbol: String,
    decimal_places: u8,
}

impl Currency {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimal_places: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimal_places,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Display scaling only, e.g. 2 renders 1234 as "12.34".
    pub fn decimal_places(&self) -> u8 {
        self.decimal_places
    }

    /// Render a minor-unit amount for display, e.g. `12.34 G`.
    pub fn format_amount(&self, amount: i64) -> String {
        if self.decimal_places == 0 {
            return format!("{} {}", amount, self.symbol);
        }
        let scale = 10u64.pow(self.decimal_places as u32);
        let sign = if amount < 0 { "-" } else { "" };
        let abs = amount.unsigned_abs();
        format!(
            "{}{}.{:0width$} {}",
            sign,
            abs / scale,
            abs % scale,
            self.symbol,
            width = self.decimal_places as usize
        )
    }
}

/// A (currency, amount) pair: the atomic unit of every balance mutation.
///
/// Bundles reference currencies by name so they stay serializable without a
/// live currency object; operations validate the name against the registry
/// before touching any balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyBundle {
    pub currency: String,
    pub amount: i64,
}

impl CurrencyBundle {
    pub fn new(currency: &Currency, amount: i64) -> Self {
        Self {
            currency: currency.name().to_string(),
            amount,
        }
    }

    pub fn from_name(currency: impl Into<String>, amount: i64) -> Self {
        Self {
            currency: currency.into(),
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_whole_currency() {
        let gold = Currency::new("gold", "G", 0);
        assert_eq!(gold.format_amount(250), "250 G");
        assert_eq!(gold.format_amount(-3), "-3 G");
    }

    #[test]
    fn format_fractional_currency() {
        let gems = Currency::new("gems", "¤", 2);
        assert_eq!(gems.format_amount(12345), "123.45 ¤");
        assert_eq!(gems.format_amount(5), "0.05 ¤");
        assert_eq!(gems.format_amount(-5), "-0.05 ¤");
    }

    #[test]
    fn bundle_takes_currency_name() {
        let gold = Currency::new("gold", "G", 0);
        let bundle = CurrencyBundle::new(&gold, 50);
        assert_eq!(bundle.currency, "gold");
        assert_eq!(bundle.amount, 50);
    }
}
