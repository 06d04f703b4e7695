// Ledger entry models.
//
// Entries are the audit trail of the economy: every mutating account
// operation produces exactly one entry per account it touched. All state
// here is write-once at construction and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::account::AccountId;
use crate::core::currency::{Currency, CurrencyRegistry};
use crate::core::error::EconomyError;

/// The actor a mutation is attributed to when it is not a peer-account
/// transfer: the server itself, a player (typically an admin running a
/// command), or an external plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Server,
    Player { id: Uuid, name: String },
    Plugin { name: String },
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Server => write!(f, "server"),
            Operator::Player { name, .. } => write!(f, "player:{}", name),
            Operator::Plugin { name } => write!(f, "plugin:{}", name),
        }
    }
}

/// Who caused an entry: an operator, a peer account (the other side of a
/// transfer), or nobody in particular.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryActor {
    None,
    Operator(Operator),
    Account { id: AccountId, name: String },
}

/// What an entry did to the balances it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Add,
    Remove,
    Set,
}

impl EntryType {
    /// String form used by persistent stores.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Add => "add",
            EntryType::Remove => "remove",
            EntryType::Set => "set",
        }
    }

    /// Parse the stored string form.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "add" => Some(EntryType::Add),
            "remove" => Some(EntryType::Remove),
            "set" => Some(EntryType::Set),
            _ => None,
        }
    }
}

/// The mutation an extension asks for through the `custom` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomAction {
    /// Adds to the account's balance.
    Add,
    /// Removes from the account's balance.
    Remove,
    /// Sets the account's balance.
    Set,
}

impl CustomAction {
    /// The entry type recorded for this action.
    pub fn entry_type(&self) -> EntryType {
        match self {
            CustomAction::Add => EntryType::Add,
            CustomAction::Remove => EntryType::Remove,
            CustomAction::Set => EntryType::Set,
        }
    }
}

/// Balance snapshot for one currency within one entry.
///
/// Sign convention: `balance_change` is `balance_after - balance_before`,
/// so an increase is positive. The currency is kept by name so persisted
/// entries deserialize without a live currency object; [`Self::currency`]
/// re-links against whatever registry the caller passes in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCurrencyData {
    currency_name: String,
    balance_before: i64,
    balance_after: i64,
    balance_change: i64,
}

impl EntryCurrencyData {
    pub fn new(currency_name: impl Into<String>, balance_before: i64, balance_after: i64) -> Self {
        Self {
            currency_name: currency_name.into(),
            balance_before,
            balance_after,
            balance_change: balance_after - balance_before,
        }
    }

    /// Name of the currency this snapshot covers.
    pub fn currency_name(&self) -> &str {
        &self.currency_name
    }

    /// Resolve the live currency through the given registry.
    ///
    /// Fails with [`EconomyError::UnknownCurrency`] if the currency was
    /// never registered (or has not been registered yet) in that registry.
    pub fn currency(&self, currencies: &CurrencyRegistry) -> Result<Currency, EconomyError> {
        currencies
            .currency(&self.currency_name)
            .ok_or_else(|| EconomyError::UnknownCurrency {
                name: self.currency_name.clone(),
            })
    }

    pub fn balance_before(&self) -> i64 {
        self.balance_before
    }

    pub fn balance_after(&self) -> i64 {
        self.balance_after
    }

    pub fn balance_change(&self) -> i64 {
        self.balance_change
    }
}

/// One immutable audit record, produced as the return value of a mutating
/// account operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    id: Uuid,
    account_id: AccountId,
    entry_type: EntryType,
    currencies: Vec<EntryCurrencyData>,
    actor: EntryActor,
    info: Option<Value>,
    created_at: DateTime<Utc>,
}

impl Entry {
    /// Build a fresh entry. Intended for account managers; extensions get
    /// entries back from the operations that created them.
    pub fn new(
        account_id: AccountId,
        entry_type: EntryType,
        currencies: Vec<EntryCurrencyData>,
        actor: EntryActor,
        info: Option<Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            entry_type,
            currencies,
            actor,
            info,
            created_at: Utc::now(),
        }
    }

    /// Rehydrate a persisted entry. Intended for entry store implementations.
    pub fn restore(
        id: Uuid,
        account_id: AccountId,
        entry_type: EntryType,
        currencies: Vec<EntryCurrencyData>,
        actor: EntryActor,
        info: Option<Value>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account_id,
            entry_type,
            currencies,
            actor,
            info,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The account this entry was recorded against.
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// One balance snapshot per currency the operation touched.
    pub fn currencies(&self) -> &[EntryCurrencyData] {
        &self.currencies
    }

    pub fn actor(&self) -> &EntryActor {
        &self.actor
    }

    /// Free-form context supplied by whoever invoked the operation.
    pub fn info(&self) -> Option<&Value> {
        self.info.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_change_is_after_minus_before() {
        let gain = EntryCurrencyData::new("gold", 100, 150);
        assert_eq!(gain.balance_change(), 50);

        let loss = EntryCurrencyData::new("gold", 150, 100);
        assert_eq!(loss.balance_change(), -50);
    }

    #[test]
    fn currency_resolves_through_an_explicit_registry() {
        let registry = CurrencyRegistry::new(Currency::new("gold", "G", 0));
        let data = EntryCurrencyData::new("gold", 0, 10);
        assert_eq!(data.currency(&registry).unwrap().name(), "gold");

        let unknown = EntryCurrencyData::new("mithril", 0, 10);
        assert!(matches!(
            unknown.currency(&registry),
            Err(EconomyError::UnknownCurrency { .. })
        ));
    }

    #[test]
    fn custom_actions_map_onto_entry_types() {
        assert_eq!(CustomAction::Add.entry_type(), EntryType::Add);
        assert_eq!(CustomAction::Remove.entry_type(), EntryType::Remove);
        assert_eq!(CustomAction::Set.entry_type(), EntryType::Set);
    }

    #[test]
    fn entry_type_storage_form_round_trips() {
        for entry_type in [EntryType::Add, EntryType::Remove, EntryType::Set] {
            assert_eq!(EntryType::from_str(entry_type.as_str()), Some(entry_type));
        }
        assert_eq!(EntryType::from_str("mint"), None);
    }

    #[test]
    fn entries_survive_serialization() {
        let entry = Entry::new(
            AccountId::new(),
            EntryType::Add,
            vec![EntryCurrencyData::new("gold", 100, 150)],
            EntryActor::Operator(Operator::Server),
            Some(serde_json::json!({ "reason": "quest reward" })),
        );

        let raw = serde_json::to_string(&entry).unwrap();
        let back: Entry = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, entry);
    }
}
