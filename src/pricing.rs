//! Booking duration, amount and commission arithmetic.
//!
//! All money values are `i64` amounts in minor currency units, so the
//! commission split is exact: `commission + provider_amount == amount`.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_COMMISSION_RATE_BPS: u32 = 1_000;

const BPS_DENOMINATOR: i64 = 10_000;
const SECONDS_PER_HOUR: i64 = 3_600;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PricingError {
    #[error("End time must be after start time")]
    NonPositiveDuration,
    #[error("Hourly rate must be positive")]
    InvalidRate,
    #[error("Amount must not be negative")]
    NegativeAmount,
    #[error("Amount is too large")]
    Overflow,
    #[error("Commission rate must be between 0 and 10000 basis points, got {0}")]
    InvalidCommissionRate(u32),
}

/// Platform commission expressed in basis points (1000 = 10%).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionRate(u32);

impl CommissionRate {
    pub fn from_bps(bps: u32) -> Result<Self, PricingError> {
        if i64::from(bps) > BPS_DENOMINATOR {
            return Err(PricingError::InvalidCommissionRate(bps));
        }
        Ok(Self(bps))
    }

    pub fn bps(self) -> u32 {
        self.0
    }

    /// Splits `amount` into the platform commission and the provider's share.
    /// The commission is rounded half up to the nearest minor unit.
    pub fn split(self, amount: i64) -> Result<CommissionSplit, PricingError> {
        if amount < 0 {
            return Err(PricingError::NegativeAmount);
        }

        let scaled = amount
            .checked_mul(i64::from(self.0))
            .and_then(|v| v.checked_add(BPS_DENOMINATOR / 2))
            .ok_or(PricingError::Overflow)?;
        let commission = scaled / BPS_DENOMINATOR;

        Ok(CommissionSplit {
            amount,
            commission,
            provider_amount: amount - commission,
        })
    }
}

impl Default for CommissionRate {
    fn default() -> Self {
        Self(DEFAULT_COMMISSION_RATE_BPS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSplit {
    pub amount: i64,
    pub commission: i64,
    pub provider_amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingQuote {
    pub duration_hours: i32,
    pub hourly_rate: i64,
    pub total_amount: i64,
    pub commission: i64,
    pub provider_amount: i64,
}

/// Whole hours billed for a window on a single day; partial hours round up.
pub fn billable_hours(start: NaiveTime, end: NaiveTime) -> Result<i32, PricingError> {
    if end <= start {
        return Err(PricingError::NonPositiveDuration);
    }

    let seconds = end.signed_duration_since(start).num_seconds();
    if seconds <= 0 {
        // sub-second windows
        return Err(PricingError::NonPositiveDuration);
    }

    let hours = (seconds + SECONDS_PER_HOUR - 1) / SECONDS_PER_HOUR;
    i32::try_from(hours).map_err(|_| PricingError::Overflow)
}

pub fn booking_amount(hours: i32, hourly_rate: i64) -> Result<i64, PricingError> {
    if hourly_rate <= 0 {
        return Err(PricingError::InvalidRate);
    }
    hourly_rate
        .checked_mul(i64::from(hours))
        .ok_or(PricingError::Overflow)
}

pub fn quote(
    start: NaiveTime,
    end: NaiveTime,
    hourly_rate: i64,
    rate: CommissionRate,
) -> Result<BookingQuote, PricingError> {
    let duration_hours = billable_hours(start, end)?;
    let total_amount = booking_amount(duration_hours, hourly_rate)?;
    let split = rate.split(total_amount)?;

    Ok(BookingQuote {
        duration_hours,
        hourly_rate,
        total_amount,
        commission: split.commission,
        provider_amount: split.provider_amount,
    })
}
