use serde::{Deserialize, Serialize};

use crate::engine::Transaction;

/// One CSV row of an account statement.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StatementRecord {
    pub seq: usize,
    #[serde(rename = "type")]
    pub typ: String,
    pub amount: String,
    pub note: String,
}

impl StatementRecord {
    pub fn from_transaction(seq: usize, tx: &Transaction) -> Self {
        StatementRecord {
            seq,
            typ: tx.typ.tag().to_owned(),
            amount: tx.amount.to_string(),
            note: tx.note.clone(),
        }
    }
}
