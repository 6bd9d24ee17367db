use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::engine::{Account, AccountId, AccountSnapshot, Amount, LedgerError};

/// Shared reference to an account owned by the [`Directory`].
#[derive(Debug, Clone)]
pub struct AccountHandle {
    id: AccountId,
    inner: Arc<Mutex<Account>>,
}

impl AccountHandle {
    fn new(account: Account) -> Self {
        AccountHandle {
            id: account.id(),
            inner: Arc::new(Mutex::new(account)),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Account>, LedgerError> {
        self.inner.lock().map_err(|_| LedgerError::Poisoned)
    }

    pub fn snapshot(&self) -> Result<AccountSnapshot, LedgerError> {
        Ok(self.lock()?.snapshot())
    }

    /// Locks two distinct accounts in ascending id order and returns the
    /// guards as `(a, b)`.
    pub(crate) fn lock_pair<'a>(
        a: &'a AccountHandle,
        b: &'a AccountHandle,
    ) -> Result<(MutexGuard<'a, Account>, MutexGuard<'a, Account>), LedgerError> {
        if a.id < b.id {
            let first = a.lock()?;
            let second = b.lock()?;
            Ok((first, second))
        } else {
            let first = b.lock()?;
            let second = a.lock()?;
            Ok((second, first))
        }
    }
}

/// Registry of every account, keyed by username.
#[derive(Debug, Default)]
pub struct Directory {
    accounts: RwLock<HashMap<String, AccountHandle>>,
    next_id: AtomicU32,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_available(&self, username: &str) -> Result<(), LedgerError> {
        let accounts = self.accounts.read().map_err(|_| LedgerError::Poisoned)?;
        if accounts.contains_key(username) {
            return Err(LedgerError::UsernameTaken);
        }
        Ok(())
    }

    pub fn insert(
        &self,
        username: &str,
        password_hash: String,
        agency: &str,
        credit_limit: Amount,
    ) -> Result<AccountHandle, LedgerError> {
        let mut accounts = self.accounts.write().map_err(|_| LedgerError::Poisoned)?;
        // Checked again under the write lock, the caller's check may be stale
        if accounts.contains_key(username) {
            return Err(LedgerError::UsernameTaken);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = AccountHandle::new(Account::new(
            id,
            username,
            password_hash,
            agency,
            credit_limit,
        ));
        accounts.insert(username.to_owned(), handle.clone());
        Ok(handle)
    }

    pub fn find(&self, username: &str) -> Result<Option<AccountHandle>, LedgerError> {
        let accounts = self.accounts.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(accounts.get(username).cloned())
    }

    /// All accounts, sorted by username.
    pub fn handles(&self) -> Result<Vec<AccountHandle>, LedgerError> {
        let accounts = self.accounts.read().map_err(|_| LedgerError::Poisoned)?;
        let mut entries: Vec<(&String, &AccountHandle)> = accounts.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        Ok(entries.into_iter().map(|(_, h)| h.clone()).collect())
    }

    pub fn len(&self) -> Result<usize, LedgerError> {
        let accounts = self.accounts.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(accounts.len())
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }
}
