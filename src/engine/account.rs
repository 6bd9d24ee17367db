use crate::engine::secret::{SecretError, SecretHasher};
use crate::engine::{AccountSnapshot, Amount, AmountError, Transaction, TransactionType};
use thiserror::Error;

/// Stable identifier assigned at registration, used to order account locks.
pub type AccountId = u32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("New limit cannot be lower than current credit used")]
    LimitBelowUsage,

    #[error("Incorrect current password")]
    WrongPassword,

    #[error("New password cannot be empty")]
    EmptyPassword,

    #[error("Balance arithmetic failed: {0}")]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Secret(#[from] SecretError),
}

// Client Account
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    username: String,
    password_hash: String,
    agency: String,
    balance: Amount,
    credit_limit: Amount,
    credit_used: Amount,
    pix_key: Option<String>,
    transactions: Vec<Transaction>,
}

impl Account {
    pub fn new(
        id: AccountId,
        username: impl Into<String>,
        password_hash: String,
        agency: impl Into<String>,
        credit_limit: Amount,
    ) -> Self {
        Account {
            id,
            username: username.into(),
            password_hash,
            agency: agency.into(),
            balance: Amount::ZERO,
            credit_limit,
            credit_used: Amount::ZERO,
            pix_key: None,
            transactions: Vec::new(),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn agency(&self) -> &str {
        &self.agency
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn credit_limit(&self) -> Amount {
        self.credit_limit
    }

    pub fn credit_used(&self) -> Amount {
        self.credit_used
    }

    pub fn credit_available(&self) -> Amount {
        // credit_used <= credit_limit, both non-negative
        Amount::from_cents(self.credit_limit.cents() - self.credit_used.cents())
    }

    pub fn pix_key(&self) -> Option<&str> {
        self.pix_key.as_deref()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            username: self.username.clone(),
            agency: self.agency.clone(),
            balance: self.balance.to_string(),
            credit_used: self.credit_used.to_string(),
            credit_limit: self.credit_limit.to_string(),
            pix_key: self.pix_key.clone().unwrap_or_default(),
        }
    }

    pub fn verify_password(&self, hasher: &dyn SecretHasher, plain: &str) -> bool {
        hasher.verify(plain, &self.password_hash)
    }

    pub fn deposit(&mut self, amount: Amount) -> Result<(), AccountError> {
        if !amount.is_positive() {
            return Err(AccountError::InvalidAmount);
        }
        self.balance = self.balance.add(&amount)?;
        self.log_transaction(Transaction::new(
            TransactionType::Deposit,
            amount,
            format!("Deposited {amount}. Balance: {}", self.balance),
        ));
        Ok(())
    }

    pub fn withdraw(&mut self, amount: Amount) -> Result<(), AccountError> {
        if !amount.is_positive() {
            return Err(AccountError::InvalidAmount);
        }
        if amount > self.balance {
            return Err(AccountError::InsufficientFunds);
        }
        self.balance = self.balance.sub(&amount)?;
        self.log_transaction(Transaction::new(
            TransactionType::Withdrawal,
            amount,
            format!("Withdrew {amount}. Balance: {}", self.balance),
        ));
        Ok(())
    }

    /// Moves `amount` from the credit line into the balance.
    /// Returns false without touching anything when the line is too short.
    pub fn draw_credit(&mut self, amount: Amount) -> Result<bool, AccountError> {
        if !amount.is_positive() {
            return Err(AccountError::InvalidAmount);
        }
        if amount > self.credit_available() {
            return Ok(false);
        }
        let balance = self.balance.add(&amount)?;
        self.credit_used = self.credit_used.add(&amount)?;
        self.balance = balance;
        self.log_transaction(Transaction::new(
            TransactionType::CreditDraw,
            amount,
            format!("Added {amount} to balance using credit"),
        ));
        Ok(true)
    }

    pub fn change_credit_limit(&mut self, new_limit: Amount) -> Result<(), AccountError> {
        // Cannot set lower than already used
        if new_limit < self.credit_used {
            return Err(AccountError::LimitBelowUsage);
        }
        self.credit_limit = new_limit;
        self.log_transaction(Transaction::event(
            TransactionType::CreditLimit,
            format!("Credit limit set to {new_limit}"),
        ));
        Ok(())
    }

    pub fn change_password(
        &mut self,
        hasher: &dyn SecretHasher,
        old: &str,
        new: &str,
    ) -> Result<(), AccountError> {
        if !hasher.verify(old, &self.password_hash) {
            return Err(AccountError::WrongPassword);
        }
        if new.is_empty() {
            return Err(AccountError::EmptyPassword);
        }
        self.password_hash = hasher.hash(new)?;
        self.log_transaction(Transaction::event(
            TransactionType::PasswordChange,
            "Password changed",
        ));
        Ok(())
    }

    /// Installs the alias without a log entry (bootstrap accounts).
    pub(crate) fn assign_pix_key(&mut self, key: String) {
        self.pix_key = Some(key);
    }

    pub(crate) fn set_pix_key(&mut self, key: String) {
        self.assign_pix_key(key);
        self.log_transaction(Transaction::event(
            TransactionType::AliasSet,
            "PIX key set/updated",
        ));
    }

    pub(crate) fn debit_for_transfer(
        &mut self,
        amount: Amount,
        recipient: &str,
    ) -> Result<(), AccountError> {
        if amount > self.balance {
            return Err(AccountError::InsufficientFunds);
        }
        self.balance = self.balance.sub(&amount)?;
        self.log_transaction(Transaction::new(
            TransactionType::TransferOut,
            amount,
            format!("Transferred {amount} to {recipient}"),
        ));
        Ok(())
    }

    /// Fails if receiving `amount` would overflow the balance.
    pub(crate) fn check_receivable(&self, amount: Amount) -> Result<(), AccountError> {
        self.balance.add(&amount)?;
        Ok(())
    }

    pub(crate) fn credit_from_transfer(
        &mut self,
        amount: Amount,
        sender: &str,
    ) -> Result<(), AccountError> {
        self.balance = self.balance.add(&amount)?;
        self.log_transaction(Transaction::new(
            TransactionType::TransferIn,
            amount,
            format!("Received {amount} from {sender}"),
        ));
        Ok(())
    }

    /// Appends to the log. Called last by the operation that changed state.
    fn log_transaction(&mut self, entry: Transaction) {
        self.transactions.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PlainHasher;

    impl SecretHasher for PlainHasher {
        fn hash(&self, plain: &str) -> Result<String, SecretError> {
            Ok(format!("h:{plain}"))
        }

        fn verify(&self, plain: &str, hash: &str) -> bool {
            hash == format!("h:{plain}")
        }
    }

    fn account() -> Account {
        Account::new(1, "alice", "h:pass".into(), "DF", Amount::from_cents(10000))
    }

    #[test]
    fn test_that_deposit_increases_balance_and_logs() {
        let mut acc = account();
        acc.deposit(Amount::from_cents(10000)).unwrap();

        assert_eq!(acc.balance(), Amount::from_cents(10000));
        assert_eq!(acc.transactions().len(), 1);
        assert_eq!(acc.transactions()[0].note, "Deposited 100.00. Balance: 100.00");
    }

    #[test]
    fn test_that_non_positive_deposit_is_rejected_without_log() {
        let mut acc = account();
        assert!(matches!(acc.deposit(Amount::ZERO), Err(AccountError::InvalidAmount)));
        assert!(matches!(
            acc.deposit(Amount::from_cents(-1)),
            Err(AccountError::InvalidAmount)
        ));
        assert!(acc.transactions().is_empty());
    }

    #[test]
    fn test_that_overflowing_deposit_leaves_account_untouched() {
        let mut acc = account();
        acc.deposit(Amount::from_cents(i64::MAX)).unwrap();

        let result = acc.deposit(Amount::from_cents(1));
        assert!(matches!(result, Err(AccountError::Amount(AmountError::Overflow))));
        assert_eq!(acc.balance(), Amount::from_cents(i64::MAX));
        assert_eq!(acc.transactions().len(), 1);
    }

    #[test]
    fn test_that_withdraw_checks_amount_then_funds() {
        let mut acc = account();
        acc.deposit(Amount::from_cents(10000)).unwrap();

        assert!(matches!(acc.withdraw(Amount::ZERO), Err(AccountError::InvalidAmount)));
        assert!(matches!(
            acc.withdraw(Amount::from_cents(15000)),
            Err(AccountError::InsufficientFunds)
        ));
        assert_eq!(acc.balance(), Amount::from_cents(10000));

        acc.withdraw(Amount::from_cents(10000)).unwrap();
        assert_eq!(acc.balance(), Amount::ZERO);
        assert_eq!(acc.transactions().len(), 2);
    }

    #[test]
    fn test_that_credit_draw_moves_both_counters() {
        let mut acc = account();

        assert!(acc.draw_credit(Amount::from_cents(6000)).unwrap());
        assert_eq!(acc.balance(), Amount::from_cents(6000));
        assert_eq!(acc.credit_used(), Amount::from_cents(6000));

        assert!(!acc.draw_credit(Amount::from_cents(4001)).unwrap());
        assert_eq!(acc.credit_used(), Amount::from_cents(6000));
        assert_eq!(acc.transactions().len(), 1);
    }

    #[test]
    fn test_that_credit_limit_cannot_go_below_usage() {
        let mut acc = account();
        acc.draw_credit(Amount::from_cents(5000)).unwrap();

        assert!(matches!(
            acc.change_credit_limit(Amount::from_cents(4999)),
            Err(AccountError::LimitBelowUsage)
        ));
        acc.change_credit_limit(Amount::from_cents(5000)).unwrap();
        assert_eq!(acc.credit_limit(), Amount::from_cents(5000));
        assert_eq!(acc.credit_available(), Amount::ZERO);
    }

    #[test]
    fn test_that_negative_credit_limit_is_rejected() {
        let mut acc = account();
        assert!(matches!(
            acc.change_credit_limit(Amount::from_cents(-100)),
            Err(AccountError::LimitBelowUsage)
        ));
    }

    #[test]
    fn test_that_password_change_requires_old_password() {
        let mut acc = account();
        let hasher = PlainHasher;

        assert!(matches!(
            acc.change_password(&hasher, "nope", "new"),
            Err(AccountError::WrongPassword)
        ));
        assert!(matches!(
            acc.change_password(&hasher, "pass", ""),
            Err(AccountError::EmptyPassword)
        ));
        acc.change_password(&hasher, "pass", "new").unwrap();

        assert!(acc.verify_password(&hasher, "new"));
        assert!(!acc.verify_password(&hasher, "pass"));
        assert_eq!(acc.transactions().len(), 1);
        assert_eq!(acc.transactions()[0].note, "Password changed");
    }
}
