//! Fixed-point token amounts.
//!
//! An [`Amount`] counts indivisible units with [`AMOUNT_DECIMALS`] fractional
//! digits. All arithmetic is exact and checked: overflow and underflow are
//! reported as errors rather than wrapped or saturated.

use {
    crate::{
        constants::{AMOUNT_DECIMALS, AMOUNT_SCALE},
        error::{Result, StakeAccountingError},
    },
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Deserializer, Serialize, Serializer},
    std::{fmt, str::FromStr},
};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const MAX: Amount = Amount(u64::MAX);

    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    pub const fn units(self) -> u64 {
        self.0
    }

    /// `tokens × 10^6` units.
    pub fn from_whole_tokens(tokens: u64) -> Result<Self> {
        tokens
            .checked_mul(AMOUNT_SCALE)
            .map(Self)
            .ok_or(StakeAccountingError::ArithmeticOverflow)
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Result<Amount> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(StakeAccountingError::ArithmeticOverflow)
    }

    pub fn checked_sub(self, other: Amount) -> Result<Amount> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(StakeAccountingError::ArithmeticUnderflow)
    }

    /// `floor(self × numerator / denominator)` with a 128-bit intermediate.
    pub fn mul_div_floor(self, numerator: u64, denominator: u64) -> Result<Amount> {
        let product = u128::from(self.0)
            .checked_mul(u128::from(numerator))
            .ok_or(StakeAccountingError::ArithmeticOverflow)?;
        let quotient = product
            .checked_div(u128::from(denominator))
            .ok_or(StakeAccountingError::ArithmeticOverflow)?;
        u64::try_from(quotient)
            .map(Self)
            .map_err(|_| StakeAccountingError::ArithmeticOverflow)
    }

    pub fn checked_sum<I: IntoIterator<Item = Amount>>(amounts: I) -> Result<Amount> {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, amount| acc.checked_add(amount))
    }
}

fn parse_error(input: &str, reason: &str) -> StakeAccountingError {
    StakeAccountingError::ParseError {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_integer_part(input: &str, integer: &str) -> Result<u64> {
    if integer.is_empty() {
        return Err(parse_error(input, "missing integer part"));
    }
    let digits = if integer.contains(',') {
        let mut groups = integer.split(',');
        let leading = groups.next().unwrap_or_default();
        if leading.is_empty() || leading.len() > 3 {
            return Err(parse_error(input, "misplaced thousands separator"));
        }
        if leading.starts_with('0') {
            return Err(parse_error(input, "leading zero in grouped amount"));
        }
        let mut digits = leading.to_string();
        for group in groups {
            if group.len() != 3 {
                return Err(parse_error(input, "misplaced thousands separator"));
            }
            digits.push_str(group);
        }
        digits
    } else {
        integer.to_string()
    };
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(parse_error(input, "non-numeric character"));
    }
    digits
        .parse::<u64>()
        .map_err(|_| parse_error(input, "amount too large"))
}

fn parse_fractional_part(input: &str, fraction: &str) -> Result<u64> {
    if fraction.is_empty() {
        return Err(parse_error(input, "missing fractional digits"));
    }
    if fraction.len() > AMOUNT_DECIMALS as usize {
        return Err(parse_error(input, "more than 6 fractional digits"));
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(parse_error(input, "non-numeric character"));
    }
    let padded = format!("{fraction:0<width$}", width = AMOUNT_DECIMALS as usize);
    padded
        .parse::<u64>()
        .map_err(|_| parse_error(input, "non-numeric character"))
}

impl FromStr for Amount {
    type Err = StakeAccountingError;

    /// Accepts `1234`, `1,234`, `1234.5`, `1,234.567891`.
    fn from_str(input: &str) -> Result<Self> {
        let (integer, fraction) = match input.split_once('.') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (input, None),
        };
        let whole = parse_integer_part(input, integer)?;
        let fractional = match fraction {
            Some(fraction) => parse_fractional_part(input, fraction)?,
            None => 0,
        };
        whole
            .checked_mul(AMOUNT_SCALE)
            .and_then(|units| units.checked_add(fractional))
            .map(Self)
            .ok_or_else(|| parse_error(input, "amount too large"))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = (self.0 / AMOUNT_SCALE).to_string();
        let fractional = self.0 % AMOUNT_SCALE;

        let mut grouped = String::with_capacity(whole.len().saturating_add(whole.len() / 3));
        for (i, digit) in whole.chars().enumerate() {
            let remaining = whole.len().saturating_sub(i);
            if i > 0 && remaining % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }
        f.write_str(&grouped)?;

        if fractional != 0 {
            let digits = format!("{fractional:06}");
            write!(f, ".{}", digits.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = <String as Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
