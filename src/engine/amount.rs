use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Amount of money held by an account, counted in cents.
/// It is using internally an i64 in order to avoid floating point rounding error.
/// The Amount precision is two places past the decimal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    cents: i64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount parsing error: {0}")]
    Parse(String),

    #[error("Overflow error while computing Amount")]
    Overflow,

    #[error("Underflow error while computing Amount")]
    Underflow,
}

impl Amount {
    pub const ZERO: Amount = Amount { cents: 0 };

    pub const fn from_cents(cents: i64) -> Self {
        Amount { cents }
    }

    pub const fn cents(&self) -> i64 {
        self.cents
    }

    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    pub fn add(&self, other: &Amount) -> Result<Amount, AmountError> {
        match self.cents.checked_add(other.cents) {
            Some(total) => Ok(Amount { cents: total }),
            None => Err(AmountError::Overflow)?,
        }
    }

    pub fn sub(&self, other: &Amount) -> Result<Amount, AmountError> {
        match self.cents.checked_sub(other.cents) {
            Some(total) => Ok(Amount { cents: total }),
            None => Err(AmountError::Underflow)?,
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Err(AmountError::Parse(s.into()))?
        }

        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let mut parts = unsigned.split('.');
        let left_part = parts.next().unwrap_or_default();
        let decimal_part = parts.next();

        // Checking for extra '.'
        if parts.next().is_some() {
            Err(AmountError::Parse(s.into()))?
        }

        // ".5" is accepted, "." and "-" are not
        if left_part.is_empty() && decimal_part.is_none_or(str::is_empty) {
            Err(AmountError::Parse(s.into()))?
        }

        let left_str = if left_part.is_empty() { "0" } else { left_part };
        if !left_str.chars().all(|c| c.is_ascii_digit()) {
            Err(AmountError::Parse(s.into()))?
        }

        let mut dec_str = decimal_part.unwrap_or_default().to_owned();
        if !dec_str.chars().all(|c| c.is_ascii_digit()) {
            Err(AmountError::Parse(s.into()))?
        }

        // Extra fractional digits are dropped, no rounding
        dec_str.truncate(2);
        while dec_str.len() < 2 {
            dec_str.push('0');
        }

        let whole = left_str
            .parse::<i64>()
            .map_err(|_| AmountError::Overflow)?;
        let fraction = dec_str
            .parse::<i64>()
            .map_err(|_| AmountError::Parse(s.into()))?;

        let cents = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(fraction))
            .ok_or(AmountError::Overflow)?;

        Ok(Self {
            cents: if negative { -cents } else { cents },
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.cents;
        let abs_val = value.unsigned_abs();

        let left_part = abs_val / 100;
        let decimal_part = abs_val % 100;

        if value < 0 {
            write!(f, "-{}.{:02}", left_part, decimal_part)
        } else {
            write!(f, "{}.{:02}", left_part, decimal_part)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Amount, AmountError};

    #[test]
    fn test_that_valid_string_can_be_parsed() {
        let amount = Amount::from_str("0");
        assert_eq!(amount.unwrap().cents, 0);

        let amount = Amount::from_str("0.");
        assert_eq!(amount.unwrap().cents, 0);

        let amount = Amount::from_str(".5");
        assert_eq!(amount.unwrap().cents, 50);

        let amount = Amount::from_str("5");
        assert_eq!(amount.unwrap().cents, 500);

        let amount = Amount::from_str(" 5.1 ");
        assert_eq!(amount.unwrap().cents, 510);

        let amount = Amount::from_str("5.129");
        assert_eq!(amount.unwrap().cents, 512);

        let amount = Amount::from_str("-.05");
        assert_eq!(amount.unwrap().cents, -5);

        let amount = Amount::from_str("+05.05");
        assert_eq!(amount.unwrap().cents, 505);

        let amount = Amount::from_str("-12345.1234567");
        assert_eq!(amount.unwrap().cents, -1234512);
    }

    #[test]
    fn test_that_invalid_string_parsing_returns_error() {
        for input in ["test", "123.12test", "12test.123", "1 .1 2", "", ".", "-", "1.2.3", "--1"] {
            let amount = Amount::from_str(input);
            assert!(
                matches!(amount, Err(AmountError::Parse(_))),
                "expected parse error for {input:?}"
            );
        }

        // Fits in i64 but not once scaled to cents
        let amount = Amount::from_str("92233720368547759");
        assert!(matches!(amount, Err(AmountError::Overflow)));

        // Largest representable value
        let amount = Amount::from_str("92233720368547758.07");
        assert_eq!(amount.unwrap().cents, i64::MAX);

        // Whole part fits, fraction pushes it over
        let amount = Amount::from_str("92233720368547758.08");
        assert!(matches!(amount, Err(AmountError::Overflow)));

        let amount = Amount::from_str("9223372036854775808");
        assert!(matches!(amount, Err(AmountError::Overflow)));
    }

    #[test]
    fn test_that_amount_is_displayed_with_two_places() {
        assert_eq!(Amount::from_cents(10000).to_string(), "100.00");
        assert_eq!(Amount::from_cents(5).to_string(), "0.05");
        assert_eq!(Amount::from_cents(-1205).to_string(), "-12.05");
        assert_eq!(Amount::from_cents(i64::MIN).to_string(), "-92233720368547758.08");
    }

    #[test]
    fn test_that_amount_can_be_added_and_substracted() {
        let a = Amount::from_str("200.12").unwrap();
        let b = Amount::from_str("100.03").unwrap();

        assert_eq!(a.add(&b).unwrap().to_string(), "300.15");
        assert_eq!(a.sub(&b).unwrap().to_string(), "100.09");
        assert_eq!(b.sub(&a).unwrap().to_string(), "-100.09");
    }

    #[test]
    fn test_that_overflow_and_underflow_return_error() {
        let max = Amount::from_cents(i64::MAX);
        let min = Amount::from_cents(i64::MIN);
        let one = Amount::from_cents(1);

        assert!(matches!(max.add(&one), Err(AmountError::Overflow)));
        assert!(matches!(min.sub(&one), Err(AmountError::Underflow)));
    }
}
