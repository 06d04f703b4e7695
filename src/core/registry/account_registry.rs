// The account registry: which manager owns which account kind.
//
// Several account kinds coexist in one deployment (players, towns, a
// plugin's shops), each behind its own manager. The registry is how code
// holding an arbitrary account finds the manager responsible for it - the
// transfer credit leg relies on this to route cross-kind credits.

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::core::account::AccountManager;
use crate::core::error::EconomyError;

struct Registration {
    manager: Arc<dyn AccountManager>,
    // The same Arc again, type-erased differently, so `manager` can hand
    // back the concrete type without unsafe downcasting through the trait.
    concrete: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
}

/// Registry of every account manager known to the deployment, keyed by the
/// account kind each one owns.
///
/// Registration is first-wins: a second manager claiming an already
/// registered kind is rejected rather than silently rerouting that kind's
/// accounts to a different implementation mid-session.
#[derive(Default)]
pub struct AccountRegistry {
    managers: DashMap<String, Registration>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `manager` for the kind it reports.
    ///
    /// Fails with [`EconomyError::ManagerAlreadyRegistered`] when the kind
    /// is already claimed.
    pub fn register<M>(&self, manager: Arc<M>) -> Result<(), EconomyError>
    where
        M: AccountManager + 'static,
    {
        let kind = manager.kind().to_string();
        match self.managers.entry(kind.clone()) {
            MapEntry::Occupied(_) => Err(EconomyError::ManagerAlreadyRegistered { kind }),
            MapEntry::Vacant(slot) => {
                tracing::info!("registered account manager for kind '{}'", kind);
                slot.insert(Registration {
                    manager: manager.clone(),
                    concrete: manager,
                    type_id: TypeId::of::<M>(),
                });
                Ok(())
            }
        }
    }

    /// The manager responsible for accounts of `kind`.
    pub fn manager_for(&self, kind: &str) -> Option<Arc<dyn AccountManager>> {
        self.managers.get(kind).map(|r| r.manager.clone())
    }

    /// Look up a registered manager by its own concrete type.
    pub fn manager<M>(&self) -> Option<Arc<M>>
    where
        M: AccountManager + 'static,
    {
        self.managers
            .iter()
            .find(|r| r.type_id == TypeId::of::<M>())
            .and_then(|r| r.concrete.clone().downcast::<M>().ok())
    }

    /// Every registered account kind.
    pub fn kinds(&self) -> Vec<String> {
        self.managers.iter().map(|r| r.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::StandardAccountManager;
    use crate::infra::memory::InMemoryAccountStore;

    fn manager(kind: &str) -> Arc<StandardAccountManager<InMemoryAccountStore>> {
        Arc::new(StandardAccountManager::new(kind, InMemoryAccountStore::new()))
    }

    #[test]
    fn resolves_by_kind_after_registration() {
        let registry = AccountRegistry::new();
        registry.register(manager("player")).unwrap();

        assert_eq!(registry.manager_for("player").unwrap().kind(), "player");
        assert!(registry.manager_for("town").is_none());
    }

    #[test]
    fn duplicate_kinds_are_rejected_first_wins() {
        let registry = AccountRegistry::new();
        let first = manager("player");
        registry.register(first.clone()).unwrap();

        let result = registry.register(manager("player"));
        assert!(matches!(
            result,
            Err(EconomyError::ManagerAlreadyRegistered { kind }) if kind == "player"
        ));

        // The original registration is still the one resolved.
        let kept = registry.manager_for("player").unwrap();
        let first: Arc<dyn AccountManager> = first;
        assert!(Arc::ptr_eq(&kept, &first));
    }

    #[test]
    fn resolves_by_concrete_manager_type() {
        let registry = AccountRegistry::new();
        let players = manager("player");
        registry.register(players.clone()).unwrap();

        let found = registry
            .manager::<StandardAccountManager<InMemoryAccountStore>>()
            .unwrap();
        assert!(Arc::ptr_eq(&found, &players));
    }

    #[test]
    fn kinds_lists_every_registration() {
        let registry = AccountRegistry::new();
        registry.register(manager("player")).unwrap();
        registry.register(manager("town")).unwrap();

        let mut kinds = registry.kinds();
        kinds.sort();
        assert_eq!(kinds, vec!["player", "town"]);
    }
}
