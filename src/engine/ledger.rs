use std::io;

use anyhow::Result;
use thiserror::Error;

use crate::engine::{
    Account, AccountError, AccountHandle, AccountSnapshot, AliasRegistry, Amount, Argon2Hasher,
    Directory, LedgerConfig, SecretError, SecretHasher, StatementRecord, Transaction,
};

const FIXTURE: [(&str, &str); 2] = [("user1", "user1pix"), ("user2", "user2pix")];
const FIXTURE_PASSWORD: &str = "pass";
const FIXTURE_AGENCY: &str = "DF";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("Not enough credit available")]
    InsufficientCredit,

    #[error("You must set your own PIX key before making transfers")]
    NoOwnAlias,

    #[error("Target PIX key not found")]
    AliasNotFound,

    #[error("Target account has not set a PIX key")]
    DestinationAliasUnset,

    #[error("PIX key cannot be empty")]
    EmptyAlias,

    #[error("This PIX key is already registered to another account")]
    AliasTaken,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Agency is required")]
    EmptyAgency,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error("Account state lock was poisoned")]
    Poisoned,
}

/// Successful result of [`Ledger::transfer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The source targeted its own key and was funded from its credit line.
    CreditDrawn { amount: Amount, source: AccountSnapshot },
    /// Money moved to another account.
    Sent {
        amount: Amount,
        recipient: String,
        source: AccountSnapshot,
    },
}

/// The ledger engine. Owns the account directory and the alias registry;
/// every state change goes through one of its operations.
pub struct Ledger {
    config: LedgerConfig,
    directory: Directory,
    aliases: AliasRegistry,
    hasher: Box<dyn SecretHasher>,
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        let hasher = Argon2Hasher::new(config.hash_memory_kib, config.hash_iterations)?;
        Self::with_hasher(config, Box::new(hasher))
    }

    pub fn with_hasher(
        config: LedgerConfig,
        hasher: Box<dyn SecretHasher>,
    ) -> Result<Self, LedgerError> {
        let ledger = Ledger {
            config,
            directory: Directory::new(),
            aliases: AliasRegistry::new(),
            hasher,
        };
        if ledger.config.seed_fixture {
            ledger.seed()?;
        }
        Ok(ledger)
    }

    fn seed(&self) -> Result<(), LedgerError> {
        for (username, alias) in FIXTURE {
            let account = self.register(username, FIXTURE_PASSWORD, FIXTURE_AGENCY)?;
            self.aliases.bind(&account, alias)?;
        }
        log::debug!("Bootstrap accounts installed");
        Ok(())
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn aliases(&self) -> &AliasRegistry {
        &self.aliases
    }

    pub fn register(
        &self,
        username: &str,
        password: &str,
        agency: &str,
    ) -> Result<AccountHandle, LedgerError> {
        log::debug!("Registering account: {username}");
        let result = self.try_register(username, password, agency);
        audit("register", username, &result);
        result
    }

    fn try_register(
        &self,
        username: &str,
        password: &str,
        agency: &str,
    ) -> Result<AccountHandle, LedgerError> {
        if username.trim().is_empty() {
            return Err(LedgerError::EmptyUsername);
        }
        self.directory.ensure_available(username)?;
        if agency.trim().is_empty() {
            return Err(LedgerError::EmptyAgency);
        }

        let password_hash = self.hasher.hash(password)?;
        self.directory.insert(
            username,
            password_hash,
            agency,
            self.config.default_credit_limit,
        )
    }

    /// Unknown usernames and wrong passwords fail the same way.
    pub fn login(&self, username: &str, password: &str) -> Result<AccountHandle, LedgerError> {
        log::debug!("Login attempt: {username}");
        let Some(account) = self.directory.find(username)? else {
            log::warn!("Login rejected");
            return Err(LedgerError::InvalidCredentials);
        };

        let verified = account.lock()?.verify_password(self.hasher.as_ref(), password);
        if !verified {
            log::warn!("Login rejected");
            return Err(LedgerError::InvalidCredentials);
        }

        log::info!("Login succeeded for {username}");
        Ok(account)
    }

    pub fn deposit(
        &self,
        account: &AccountHandle,
        amount: Amount,
    ) -> Result<AccountSnapshot, LedgerError> {
        self.apply(account, "deposit", |acc| acc.deposit(amount))
    }

    pub fn withdraw(
        &self,
        account: &AccountHandle,
        amount: Amount,
    ) -> Result<AccountSnapshot, LedgerError> {
        self.apply(account, "withdraw", |acc| acc.withdraw(amount))
    }

    pub fn change_credit_limit(
        &self,
        account: &AccountHandle,
        new_limit: Amount,
    ) -> Result<AccountSnapshot, LedgerError> {
        self.apply(account, "change credit limit", |acc| {
            acc.change_credit_limit(new_limit)
        })
    }

    pub fn change_password(
        &self,
        account: &AccountHandle,
        old: &str,
        new: &str,
    ) -> Result<AccountSnapshot, LedgerError> {
        let hasher = self.hasher.as_ref();
        self.apply(account, "change password", |acc| {
            acc.change_password(hasher, old, new)
        })
    }

    pub fn set_alias(
        &self,
        account: &AccountHandle,
        alias: &str,
    ) -> Result<AccountSnapshot, LedgerError> {
        log::debug!("set alias on account #{}", account.id());
        let result = self
            .aliases
            .set_alias(account, alias)
            .and_then(|_| account.snapshot());
        audit("set alias", &format!("#{}", account.id()), &result);
        result
    }

    pub fn resolve_alias(&self, alias: &str) -> Result<Option<AccountHandle>, LedgerError> {
        self.aliases.resolve(alias)
    }

    /// Sends `amount` to the account owning `destination_alias`, or draws on
    /// the source's credit line when the alias is the source's own.
    pub fn transfer(
        &self,
        source: &AccountHandle,
        amount: Amount,
        destination_alias: &str,
    ) -> Result<TransferOutcome, LedgerError> {
        log::debug!(
            "transfer of {amount} from account #{} to key {destination_alias:?}",
            source.id()
        );
        let result = self.try_transfer(source, amount, destination_alias);
        audit("transfer", &format!("#{}", source.id()), &result);
        result
    }

    fn try_transfer(
        &self,
        source: &AccountHandle,
        amount: Amount,
        destination_alias: &str,
    ) -> Result<TransferOutcome, LedgerError> {
        {
            let mut src = source.lock()?;
            let own_alias = match src.pix_key() {
                Some(key) => key == destination_alias,
                None => return Err(LedgerError::NoOwnAlias),
            };
            if !amount.is_positive() {
                return Err(AccountError::InvalidAmount.into());
            }
            if own_alias {
                if !src.draw_credit(amount)? {
                    return Err(LedgerError::InsufficientCredit);
                }
                return Ok(TransferOutcome::CreditDrawn {
                    amount,
                    source: src.snapshot(),
                });
            }
        }

        let destination = self
            .aliases
            .resolve(destination_alias)?
            .ok_or(LedgerError::AliasNotFound)?;
        if destination.id() == source.id() {
            // The source took this key after the check above; nothing to move.
            return Err(LedgerError::AliasNotFound);
        }

        let (mut src, mut dst) = AccountHandle::lock_pair(source, &destination)?;
        if src.pix_key().is_none() {
            return Err(LedgerError::NoOwnAlias);
        }
        match dst.pix_key() {
            None => return Err(LedgerError::DestinationAliasUnset),
            Some(key) if key != destination_alias => return Err(LedgerError::AliasNotFound),
            Some(_) => {}
        }
        if amount > src.balance() {
            return Err(AccountError::InsufficientFunds.into());
        }
        dst.check_receivable(amount)?;

        // Both sides change while both locks are held
        let recipient = dst.username().to_owned();
        let sender = src.username().to_owned();
        src.debit_for_transfer(amount, &recipient)?;
        dst.credit_from_transfer(amount, &sender)?;

        Ok(TransferOutcome::Sent {
            amount,
            recipient,
            source: src.snapshot(),
        })
    }

    pub fn account_info(&self, account: &AccountHandle) -> Result<AccountSnapshot, LedgerError> {
        account.snapshot()
    }

    pub fn transactions(&self, account: &AccountHandle) -> Result<Vec<Transaction>, LedgerError> {
        Ok(account.lock()?.transactions().to_vec())
    }

    pub fn snapshots(&self) -> Result<Vec<AccountSnapshot>, LedgerError> {
        self.directory
            .handles()?
            .iter()
            .map(AccountHandle::snapshot)
            .collect()
    }

    pub fn write_snapshots<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        log::debug!("Starting account snapshot serialisation");
        for snapshot in self.snapshots()? {
            log::debug!("Serialising account snapshot: {snapshot:?}");
            wtr.serialize(snapshot)?;
        }
        wtr.flush()?;

        Ok(())
    }

    pub fn write_statement<W: io::Write>(&self, account: &AccountHandle, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let transactions = self.transactions(account)?;
        log::debug!(
            "Writing statement of account #{} with {} entries",
            account.id(),
            transactions.len()
        );
        for (seq, tx) in transactions.iter().enumerate() {
            wtr.serialize(StatementRecord::from_transaction(seq + 1, tx))?;
        }
        wtr.flush()?;

        Ok(())
    }

    fn apply<F>(
        &self,
        account: &AccountHandle,
        operation: &str,
        op: F,
    ) -> Result<AccountSnapshot, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<(), AccountError>,
    {
        log::debug!("{operation} on account #{}", account.id());
        let result = account.lock().and_then(|mut acc| {
            op(&mut acc)?;
            Ok(acc.snapshot())
        });
        audit(operation, &format!("#{}", account.id()), &result);
        result
    }
}

fn audit<T>(operation: &str, subject: &str, result: &Result<T, LedgerError>) {
    match result {
        Ok(_) => log::info!("{operation} succeeded for {subject}"),
        Err(e) => log::warn!("{operation} rejected for {subject}: {e}"),
    }
}
