use serde::{Deserialize, Serialize};

/// A Snapshot of an Account to easily view the content
/// It is used for decoupling ledger output from Account and easy serialisation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AccountSnapshot {
    pub username: String,
    pub agency: String,
    pub balance: String,
    pub credit_used: String,
    pub credit_limit: String,
    pub pix_key: String,
}
