use std::env;
use std::str::FromStr;

use argon2::Params;
use thiserror::Error;

use crate::engine::{Amount, AmountError};

const CREDIT_LIMIT_VAR: &str = "PIX_LEDGER_CREDIT_LIMIT";
const SEED_VAR: &str = "PIX_LEDGER_SEED";
const HASH_MEMORY_VAR: &str = "PIX_LEDGER_HASH_MEMORY_KIB";
const HASH_ITERATIONS_VAR: &str = "PIX_LEDGER_HASH_ITERATIONS";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid amount: {source}")]
    Amount { var: &'static str, source: AmountError },

    #[error("{var} must not be negative")]
    NegativeAmount { var: &'static str },

    #[error("{var} is not a valid boolean: {value}")]
    Bool { var: &'static str, value: String },

    #[error("{var} is not a valid number: {value}")]
    Number { var: &'static str, value: String },
}

/// Runtime settings of a [`Ledger`](crate::engine::Ledger).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Credit line granted to every new account.
    pub default_credit_limit: Amount,
    /// Install the `user1`/`user2` accounts at construction.
    pub seed_fixture: bool,
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            default_credit_limit: Amount::from_cents(100_00),
            seed_fixture: true,
            hash_memory_kib: Params::DEFAULT_M_COST,
            hash_iterations: Params::DEFAULT_T_COST,
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the config from defaults overridden by whatever `lookup` returns.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LedgerConfig::default();

        if let Some(value) = lookup(CREDIT_LIMIT_VAR) {
            let limit = Amount::from_str(&value).map_err(|source| ConfigError::Amount {
                var: CREDIT_LIMIT_VAR,
                source,
            })?;
            if limit.is_negative() {
                return Err(ConfigError::NegativeAmount {
                    var: CREDIT_LIMIT_VAR,
                });
            }
            config.default_credit_limit = limit;
        }

        if let Some(value) = lookup(SEED_VAR) {
            config.seed_fixture = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => Err(ConfigError::Bool {
                    var: SEED_VAR,
                    value,
                })?,
            };
        }

        if let Some(value) = lookup(HASH_MEMORY_VAR) {
            config.hash_memory_kib = parse_number(HASH_MEMORY_VAR, value)?;
        }

        if let Some(value) = lookup(HASH_ITERATIONS_VAR) {
            config.hash_iterations = parse_number(HASH_ITERATIONS_VAR, value)?;
        }

        Ok(config)
    }
}

fn parse_number(var: &'static str, value: String) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::Number { var, value })
}
