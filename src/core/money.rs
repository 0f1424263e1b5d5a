use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

use crate::core::errors::LedgerError;

/// Currencies a group can keep its books in.
///
/// Every amount in the ledger is stored as an integer number of minor units
/// of one of these currencies. Conversion between currencies is not handled
/// here; a group uses exactly one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Currency::Inr => "₹",
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
        }
    }

    /// Number of fraction digits in one major unit.
    pub const fn minor_units(self) -> u32 {
        match self {
            Currency::Inr | Currency::Usd | Currency::Eur | Currency::Gbp => 2,
        }
    }

    fn scale(self) -> i64 {
        10_i64.pow(self.minor_units())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            other => Err(LedgerError::InvalidCurrency(other.to_string())),
        }
    }
}

/// Signed amount in integer minor units (paise, cents, pence).
///
/// The ledger never touches floating point: splits are computed by integer
/// division so the parts always add back up to the whole.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Builds an amount from whole major units, e.g. `from_major(12, Inr)` is 1200 paise.
    pub fn from_major(major: i64, currency: Currency) -> Option<Self> {
        major.checked_mul(currency.scale()).map(Money)
    }

    /// Parses a decimal string such as `"12.50"` or `"12,5"` into minor units.
    ///
    /// At most `currency.minor_units()` fractional digits are accepted, so
    /// `"0.001"` is rejected rather than rounded.
    pub fn parse(input: &str, currency: Currency) -> Result<Self, LedgerError> {
        let invalid = |reason: &str| LedgerError::InvalidAmount(format!("{reason}: {input:?}"));

        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if digits.is_empty() {
            return Err(invalid("empty amount"));
        }

        let normalized = digits.replace(',', ".");
        let (whole, frac) = match normalized.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (normalized.as_str(), ""),
        };
        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("invalid amount"));
        }
        if !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("invalid amount"));
        }
        let digits_allowed = currency.minor_units() as usize;
        if frac.len() > digits_allowed {
            return Err(invalid("too many decimals"));
        }

        let whole: i64 = whole.parse().map_err(|_| invalid("amount too large"))?;
        let frac_value: i64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<digits_allowed$}");
            padded.parse().map_err(|_| invalid("invalid amount"))?
        };

        let total = whole
            .checked_mul(currency.scale())
            .and_then(|v| v.checked_add(frac_value))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -total } else { total }))
    }

    /// Formats the amount with the currency symbol, e.g. `-₹12.05`.
    pub fn display(self, currency: Currency) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = currency.scale().unsigned_abs();
        let width = currency.minor_units() as usize;
        format!(
            "{sign}{}{}.{:0width$}",
            currency.symbol(),
            abs / scale,
            abs % scale
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
