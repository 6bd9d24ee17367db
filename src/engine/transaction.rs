use std::fmt;

use crate::engine::Amount;

/// One entry of an account's transaction log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub typ: TransactionType,
    pub amount: Amount,
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
    CreditDraw,
    CreditLimit,
    AliasSet,
    PasswordChange,
}

impl Transaction {
    pub fn new(typ: TransactionType, amount: Amount, note: impl Into<String>) -> Self {
        Transaction {
            typ,
            amount,
            note: note.into(),
        }
    }

    /// Entry that records a change without money moving.
    pub fn event(typ: TransactionType, note: impl Into<String>) -> Self {
        Self::new(typ, Amount::ZERO, note)
    }
}

impl TransactionType {
    pub fn tag(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAW",
            TransactionType::TransferOut => "XFER_OUT",
            TransactionType::TransferIn => "XFER_IN",
            TransactionType::CreditDraw => "CREDIT",
            TransactionType::CreditLimit => "LIMIT",
            TransactionType::AliasSet => "PIX",
            TransactionType::PasswordChange => "PASSWORD",
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}  {}", self.typ.tag(), self.amount, self.note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_that_entry_renders_tag_amount_and_note() {
        let tx = Transaction::new(
            TransactionType::TransferOut,
            Amount::from_cents(5000),
            "Transferred 50.00 to user2",
        );
        assert_eq!(tx.to_string(), "[XFER_OUT] 50.00  Transferred 50.00 to user2");

        let tx = Transaction::event(TransactionType::PasswordChange, "Password changed");
        assert_eq!(tx.to_string(), "[PASSWORD] 0.00  Password changed");
    }
}
