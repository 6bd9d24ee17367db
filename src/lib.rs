//! In-memory PIX ledger: accounts with balances and credit lines,
//! alias-routed transfers, and a line-oriented console over them.

pub mod engine;
pub mod shell;
