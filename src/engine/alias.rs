use std::collections::HashMap;
use std::sync::RwLock;

use crate::engine::{AccountHandle, LedgerError};

/// Maps PIX keys to the account that owns them. One key per account,
/// one account per key.
#[derive(Debug, Default)]
pub struct AliasRegistry {
    aliases: RwLock<HashMap<String, AccountHandle>>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or replaces the alias of `account`, releasing its previous one.
    /// Re-setting the alias the account already owns still appends a log entry.
    pub fn set_alias(&self, account: &AccountHandle, new_alias: &str) -> Result<(), LedgerError> {
        self.install(account, new_alias, true)
    }

    /// Same as [`set_alias`](Self::set_alias) but leaves the account log alone.
    pub(crate) fn bind(&self, account: &AccountHandle, alias: &str) -> Result<(), LedgerError> {
        self.install(account, alias, false)
    }

    pub fn resolve(&self, alias: &str) -> Result<Option<AccountHandle>, LedgerError> {
        let aliases = self.aliases.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(aliases.get(alias).cloned())
    }

    pub fn len(&self) -> Result<usize, LedgerError> {
        let aliases = self.aliases.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(aliases.len())
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    /// Points `alias` at `account` without touching the account itself.
    #[cfg(test)]
    pub(crate) fn insert_raw(&self, alias: &str, account: &AccountHandle) -> Result<(), LedgerError> {
        let mut aliases = self.aliases.write().map_err(|_| LedgerError::Poisoned)?;
        aliases.insert(alias.to_owned(), account.clone());
        Ok(())
    }

    fn install(&self, account: &AccountHandle, alias: &str, log: bool) -> Result<(), LedgerError> {
        if alias.is_empty() {
            return Err(LedgerError::EmptyAlias);
        }

        // Registry lock first, account lock second
        let mut aliases = self.aliases.write().map_err(|_| LedgerError::Poisoned)?;
        if let Some(owner) = aliases.get(alias) {
            if owner.id() != account.id() {
                return Err(LedgerError::AliasTaken);
            }
        }

        let mut acc = account.lock()?;
        if let Some(previous) = acc.pix_key() {
            if previous != alias {
                aliases.remove(previous);
            }
        }
        aliases.insert(alias.to_owned(), account.clone());

        if log {
            acc.set_pix_key(alias.to_owned());
        } else {
            acc.assign_pix_key(alias.to_owned());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Amount, Directory};

    fn setup() -> (Directory, AliasRegistry, AccountHandle, AccountHandle) {
        let directory = Directory::new();
        let a = directory
            .insert("a", "hash".into(), "DF", Amount::ZERO)
            .unwrap();
        let b = directory
            .insert("b", "hash".into(), "DF", Amount::ZERO)
            .unwrap();
        (directory, AliasRegistry::new(), a, b)
    }

    #[test]
    fn test_that_empty_alias_is_rejected() {
        let (_dir, registry, a, _b) = setup();
        assert!(matches!(registry.set_alias(&a, ""), Err(LedgerError::EmptyAlias)));
        assert!(a.lock().unwrap().pix_key().is_none());
    }

    #[test]
    fn test_that_alias_taken_by_other_account_is_rejected_until_released() {
        let (_dir, registry, a, b) = setup();
        registry.set_alias(&a, "x").unwrap();

        assert!(matches!(registry.set_alias(&b, "x"), Err(LedgerError::AliasTaken)));
        assert!(b.lock().unwrap().pix_key().is_none());
        assert!(b.lock().unwrap().transactions().is_empty());

        registry.set_alias(&a, "y").unwrap();
        assert!(registry.resolve("x").unwrap().is_none());

        registry.set_alias(&b, "x").unwrap();
        assert_eq!(registry.resolve("x").unwrap().unwrap().id(), b.id());
        assert_eq!(registry.resolve("y").unwrap().unwrap().id(), a.id());
        assert_eq!(registry.len().unwrap(), 2);
    }

    #[test]
    fn test_that_resetting_own_alias_succeeds_and_still_logs() {
        let (_dir, registry, a, _b) = setup();
        registry.set_alias(&a, "x").unwrap();
        registry.set_alias(&a, "x").unwrap();

        let acc = a.lock().unwrap();
        assert_eq!(acc.pix_key(), Some("x"));
        assert_eq!(acc.transactions().len(), 2);
        assert!(acc.transactions().iter().all(|t| t.note == "PIX key set/updated"));
        drop(acc);
        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn test_that_bind_does_not_log() {
        let (_dir, registry, a, _b) = setup();
        registry.bind(&a, "seed").unwrap();

        let acc = a.lock().unwrap();
        assert_eq!(acc.pix_key(), Some("seed"));
        assert!(acc.transactions().is_empty());
    }

    #[test]
    fn test_that_unknown_alias_resolves_to_none() {
        let (_dir, registry, _a, _b) = setup();
        assert!(registry.resolve("nobody").unwrap().is_none());
        assert!(registry.is_empty().unwrap());
    }

    #[test]
    fn test_that_poisoned_registry_is_reported() {
        let (_dir, registry, a, _b) = setup();
        registry.set_alias(&a, "x").unwrap();

        std::thread::scope(|s| {
            let result = s
                .spawn(|| {
                    let _guard = registry.aliases.write().unwrap();
                    panic!("writer died holding the registry");
                })
                .join();
            assert!(result.is_err());
        });

        assert!(matches!(registry.len(), Err(LedgerError::Poisoned)));
        assert!(matches!(registry.is_empty(), Err(LedgerError::Poisoned)));
        assert!(matches!(registry.resolve("x"), Err(LedgerError::Poisoned)));
    }
}
