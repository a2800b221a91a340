use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{Amount, Charges, StayDuration};

const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_MINUTE: i64 = 60_000;

pub const DEFAULT_BASE_RATE: u64 = 500;
pub const DEFAULT_EXTRA_RATE: u64 = 300;

/// Outcome of pricing a single stay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub duration: StayDuration,
    pub charges: Charges,
    pub total_amount: Amount,
    pub clock_skew: bool,
}

/// Linear parking tariff: the first hour (or any part of it) costs
/// `base_rate`, every further hour or fraction of an hour costs `extra_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCalculator {
    base_rate: Amount,
    extra_rate: Amount,
}

impl FeeCalculator {
    pub fn new(base_rate: Amount, extra_rate: Amount) -> Self {
        Self {
            base_rate,
            extra_rate,
        }
    }

    /// Price the stay between `entry_time` and `exit_time`.
    ///
    /// A negative interval is clamped to zero and reported through
    /// `clock_skew`, so the charge is the minimum `base_rate`.
    pub fn compute_fee(&self, entry_time: DateTime<Utc>, exit_time: DateTime<Utc>) -> FeeBreakdown {
        let elapsed_ms = (exit_time - entry_time).num_milliseconds();
        let clock_skew = elapsed_ms < 0;
        let elapsed_ms = elapsed_ms.max(0);

        let full_hours = (elapsed_ms / MILLIS_PER_HOUR) as u64;
        let remainder_ms = elapsed_ms % MILLIS_PER_HOUR;
        // ceil(remainder in minutes); zero only when the stay is a whole number of hours
        let extra_minutes = ((remainder_ms + MILLIS_PER_MINUTE - 1) / MILLIS_PER_MINUTE) as u64;
        let billed_hours = full_hours + u64::from(remainder_ms > 0);

        let mut extra_charge = Amount::zero();
        if full_hours >= 1 {
            extra_charge = extra_charge.add(self.extra_rate.times(full_hours - 1));
            if extra_minutes > 0 {
                extra_charge = extra_charge.add(self.extra_rate);
            }
        }
        let total_amount = self.base_rate.add(extra_charge);

        FeeBreakdown {
            duration: StayDuration {
                hours: full_hours,
                minutes: extra_minutes,
                total_hours: billed_hours,
            },
            charges: Charges {
                base_hour: self.base_rate,
                extra_hours: self.extra_rate.times(billed_hours.saturating_sub(1)),
                total_amount,
            },
            total_amount,
            clock_skew,
        }
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self::new(
            Amount::new(DEFAULT_BASE_RATE),
            Amount::new(DEFAULT_EXTRA_RATE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn stay(duration: Duration) -> FeeBreakdown {
        let entry = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        FeeCalculator::default().compute_fee(entry, entry + duration)
    }

    #[test]
    fn test_short_stay_charges_base_rate() {
        let fee = stay(Duration::minutes(30));
        assert_eq!(fee.total_amount, Amount::new(500));
        assert_eq!(fee.duration.hours, 0);
        assert_eq!(fee.duration.minutes, 30);
        assert_eq!(fee.duration.total_hours, 1);
        assert_eq!(fee.charges.extra_hours, Amount::zero());
    }

    #[test]
    fn test_exactly_one_hour() {
        let fee = stay(Duration::minutes(60));
        assert_eq!(fee.total_amount, Amount::new(500));
        assert_eq!(fee.duration.minutes, 0);
        assert_eq!(fee.duration.total_hours, 1);
    }

    #[test]
    fn test_one_minute_over_the_hour() {
        let fee = stay(Duration::minutes(61));
        assert_eq!(fee.total_amount, Amount::new(800));
        assert_eq!(fee.charges.extra_hours, Amount::new(300));
        assert_eq!(fee.duration.total_hours, 2);
    }

    #[test]
    fn test_two_hours_five_minutes() {
        let fee = stay(Duration::minutes(125));
        assert_eq!(fee.duration.hours, 2);
        assert_eq!(fee.duration.minutes, 5);
        assert_eq!(fee.duration.total_hours, 3);
        assert_eq!(fee.charges.extra_hours, Amount::new(600));
        assert_eq!(fee.total_amount, Amount::new(1100));
        assert_eq!(fee.charges.total_amount, Amount::new(1100));
    }

    #[test]
    fn test_whole_hours_display_matches_total() {
        for hours in 1..=24 {
            let fee = stay(Duration::hours(hours));
            assert_eq!(
                fee.charges.base_hour.add(fee.charges.extra_hours),
                fee.total_amount,
                "mismatch at {hours}h"
            );
        }

        let fee = stay(Duration::minutes(120));
        assert_eq!(fee.total_amount, Amount::new(800));
        assert_eq!(fee.charges.extra_hours, Amount::new(300));
    }

    #[test]
    fn test_partial_minute_rounds_up() {
        let fee = stay(Duration::minutes(60) + Duration::milliseconds(1));
        assert_eq!(fee.duration.minutes, 1);
        assert_eq!(fee.total_amount, Amount::new(800));

        let fee = stay(Duration::minutes(119) + Duration::seconds(30));
        assert_eq!(fee.duration.hours, 1);
        assert_eq!(fee.duration.minutes, 60);
        assert_eq!(fee.total_amount, Amount::new(800));
    }

    #[test]
    fn test_zero_length_stay() {
        let fee = stay(Duration::zero());
        assert_eq!(fee.total_amount, Amount::new(500));
        assert_eq!(fee.duration.total_hours, 0);
        assert!(!fee.clock_skew);
    }

    #[test]
    fn test_negative_elapsed_is_clamped_and_flagged() {
        let fee = stay(Duration::minutes(-90));
        assert!(fee.clock_skew);
        assert_eq!(fee.total_amount, Amount::new(500));
        assert_eq!(fee.duration.hours, 0);
        assert_eq!(fee.duration.minutes, 0);
    }

    #[test]
    fn test_huge_tariff_does_not_overflow() {
        let calculator = FeeCalculator::new(Amount::new(500), Amount::new(u64::MAX));
        let entry = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let fee = calculator.compute_fee(entry, entry + Duration::days(3));
        assert_eq!(fee.total_amount, Amount::new(u64::MAX));
        assert_eq!(fee.charges.extra_hours, Amount::new(u64::MAX));
    }

    #[test]
    fn test_custom_tariff() {
        let calculator = FeeCalculator::new(Amount::new(1000), Amount::new(250));
        let entry = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let fee = calculator.compute_fee(entry, entry + Duration::minutes(185));
        assert_eq!(fee.total_amount, Amount::new(1000 + 2 * 250 + 250));
    }
}
