mod account;
mod account_snapshot;
mod alias;
mod amount;
mod config;
mod directory;
mod ledger;
mod record;
mod secret;
mod transaction;

pub use account::{Account, AccountError, AccountId};
pub use account_snapshot::AccountSnapshot;
pub use alias::AliasRegistry;
pub use amount::{Amount, AmountError};
pub use config::{ConfigError, LedgerConfig};
pub use directory::{AccountHandle, Directory};
pub use ledger::{Ledger, LedgerError, TransferOutcome};
pub use record::StatementRecord;
pub use secret::{Argon2Hasher, SecretError, SecretHasher};
pub use transaction::{Transaction, TransactionType};
