//! Money amounts in integer cents and the escrow fee split.

use super::TaskDomainError;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-negative amount of US dollars held as integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(0);

    /// Wraps an amount already expressed in cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Converts a positive dollar amount, rounding half away from zero to
    /// the nearest cent.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAmount`] when the amount is not
    /// positive, rounds to zero, or does not fit in cents.
    pub fn from_decimal(dollars: Decimal) -> Result<Self, TaskDomainError> {
        let invalid = || TaskDomainError::InvalidAmount(dollars.to_string());
        if dollars <= Decimal::ZERO {
            return Err(invalid());
        }
        let cents = dollars
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|value| value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|value| value.to_u64())
            .ok_or_else(invalid)?;
        if cents == 0 {
            return Err(invalid());
        }
        Ok(Self(cents))
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Returns the amount in dollars.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), 2)
    }

    /// Subtracts `other`, returning `None` on underflow.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.to_decimal())
    }
}

/// Platform commission as a percentage of the task price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePercent(Decimal);

impl FeePercent {
    /// Creates a validated percentage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidFeePercent`] unless the value lies
    /// in `0..=100`.
    pub fn new(percent: Decimal) -> Result<Self, TaskDomainError> {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(TaskDomainError::InvalidFeePercent(percent.to_string()));
        }
        Ok(Self(percent))
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Splits `total` into the platform fee and the helper's share.
    ///
    /// The fee is rounded half away from zero to whole cents; the helper
    /// receives the remainder.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AmountOverflow`] if the arithmetic cannot
    /// be represented.
    pub fn split(self, total: Money) -> Result<EscrowSplit, TaskDomainError> {
        let platform_fee = Decimal::from(total.cents())
            .checked_mul(self.0)
            .and_then(|value| value.checked_div(Decimal::ONE_HUNDRED))
            .map(|value| value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|value| value.to_u64())
            .map(Money::from_cents)
            .ok_or(TaskDomainError::AmountOverflow)?;
        let helper_amount = total
            .checked_sub(platform_fee)
            .ok_or(TaskDomainError::AmountOverflow)?;
        Ok(EscrowSplit {
            total,
            platform_fee,
            helper_amount,
        })
    }
}

impl Default for FeePercent {
    fn default() -> Self {
        Self(Decimal::from(15))
    }
}

impl fmt::Display for FeePercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Division of an escrowed payment between platform and helper.
///
/// Always satisfies `platform_fee + helper_amount == total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowSplit {
    total: Money,
    platform_fee: Money,
    helper_amount: Money,
}

impl EscrowSplit {
    /// Returns the amount charged to the poster.
    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }

    /// Returns the platform's commission.
    #[must_use]
    pub const fn platform_fee(&self) -> Money {
        self.platform_fee
    }

    /// Returns the amount released to the helper on completion.
    #[must_use]
    pub const fn helper_amount(&self) -> Money {
        self.helper_amount
    }
}
