//! Time-decayed rental refunds.
//!
//! A rental returned on day `d` (day 1 is the pickup day) refunds a fixed
//! share of its price. After the six-day rental window the item counts as
//! bought and nothing is refunded.

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use chrono::{DateTime, Utc};

use super::errors::DomainError;

/// Length of the rental window in days.
pub const RENTAL_DAYS: i64 = 6;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Refund percentage by rental day, days 1 through 6.
const SCHEDULE_PERCENT: [i64; RENTAL_DAYS as usize] = [80, 72, 64, 56, 48, 40];

/// Fraction of the price refunded on `day`.
pub fn refund_fraction(day: i64) -> Result<BigDecimal, DomainError> {
    if day <= 0 {
        return Err(DomainError::OutOfRange(day));
    }
    if day > RENTAL_DAYS {
        return Ok(BigDecimal::zero());
    }
    let percent = SCHEDULE_PERCENT[(day - 1) as usize];
    Ok(BigDecimal::from(percent) / BigDecimal::from(100))
}

/// Refund owed for a rental of `price` returned on `day`.
///
/// Days past the rental window saturate to zero. The result is exact;
/// use [`to_currency`] when presenting it.
pub fn refund(price: &BigDecimal, day: i64) -> Result<BigDecimal, DomainError> {
    let fraction = refund_fraction(day)?;
    Ok(price * fraction)
}

/// 1-based rental day for a return at `now`: whole days since pickup,
/// rounded up, and never less than 1.
pub fn rental_day(picked_up_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed = (now - picked_up_at).num_milliseconds();
    if elapsed <= 0 {
        return 1;
    }
    let days = (elapsed + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
    days.max(1)
}

pub fn refund_at(
    price: &BigDecimal,
    picked_up_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<BigDecimal, DomainError> {
    refund(price, rental_day(picked_up_at, now))
}

/// Round to two decimals for display.
pub fn to_currency(amount: &BigDecimal) -> BigDecimal {
    // Rounding drops the scale of zero, so build it at cent precision.
    if amount.is_zero() {
        return BigDecimal::new(0.into(), 2);
    }
    amount.with_scale_round(2, RoundingMode::HalfUp)
}
