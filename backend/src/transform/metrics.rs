//! Conversion rate computation.

use crate::models::{LandingPageRecord, PageCandidate};

/// `transactions / sessions * 100`, rounded half-up to two decimals.
///
/// Computed in integer hundredths of a percent, so values such as
/// 1.005% round the same way on every platform. Returns 0.0 when
/// `sessions` is not positive; the business rules never let such rows
/// through.
pub fn conversion_rate(transactions: i64, sessions: i64) -> f64 {
    if sessions <= 0 {
        return 0.0;
    }

    let numerator = i128::from(transactions) * 10_000;
    let denominator = i128::from(sessions);
    // Half-up: floor((2n + d) / 2d) for non-negative n
    let hundredths = if numerator >= 0 {
        (2 * numerator + denominator) / (2 * denominator)
    } else {
        -((2 * -numerator + denominator) / (2 * denominator))
    };

    hundredths as f64 / 100.0
}

/// Attach the conversion rate, producing the read-only record.
pub fn enrich(candidate: PageCandidate) -> LandingPageRecord {
    let rate = conversion_rate(candidate.transactions, candidate.sessions);
    LandingPageRecord::new(candidate, rate)
}
