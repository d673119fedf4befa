//! Time-based billing.
//!
//! An occupancy is billed in whole hours with a minimum of one. `Rounding`
//! decides what happens to a started hour: `Ceil` bills it, `Floor` drops it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const HOUR_MS: u64 = 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// Every started hour is billed: 61 min is 2 hours, exactly 2 h is 2 hours.
    #[default]
    Ceil,
    /// Only full hours count beyond the first: 1 h 59 min is 1 hour.
    Floor,
}

/// Result of a fee computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub fee: u64,
    pub billed_hours: u64,
}

/// Whole hours billed for `elapsed`. Never less than 1, also for a
/// non-positive duration.
pub fn billed_hours(elapsed: Duration, rounding: Rounding) -> u64 {
    let ms = u64::try_from(elapsed.num_milliseconds()).unwrap_or(0);
    let hours = match rounding {
        Rounding::Ceil => ms.div_ceil(HOUR_MS),
        Rounding::Floor => ms / HOUR_MS,
    };
    hours.max(1)
}

/// Price an occupancy that started at `entry` and is billed at `exit`.
pub fn quote(
    entry: DateTime<Utc>,
    exit: DateTime<Utc>,
    unit_rate: u64,
    rounding: Rounding,
) -> FeeQuote {
    let billed_hours = billed_hours(exit - entry, rounding);
    FeeQuote {
        fee: billed_hours.saturating_mul(unit_rate),
        billed_hours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(m: i64) -> Duration {
        Duration::minutes(m)
    }

    #[test]
    fn ceil_bills_every_started_hour() {
        let cases = [(59, 1), (60, 1), (61, 2), (90, 2), (119, 2), (120, 2), (121, 3), (180, 3)];
        for (elapsed, expected) in cases {
            assert_eq!(
                billed_hours(minutes(elapsed), Rounding::Ceil),
                expected,
                "{elapsed} min"
            );
        }
    }

    #[test]
    fn floor_truncates_partial_hours() {
        let cases = [(59, 1), (61, 1), (119, 1), (120, 2), (121, 2), (179, 2), (180, 3)];
        for (elapsed, expected) in cases {
            assert_eq!(
                billed_hours(minutes(elapsed), Rounding::Floor),
                expected,
                "{elapsed} min"
            );
        }
    }

    #[test]
    fn tiny_and_negative_durations_bill_one_hour() {
        for rounding in [Rounding::Ceil, Rounding::Floor] {
            assert_eq!(billed_hours(Duration::seconds(3), rounding), 1);
            assert_eq!(billed_hours(Duration::zero(), rounding), 1);
            assert_eq!(billed_hours(minutes(-30), rounding), 1);
        }
    }

    #[test]
    fn ceil_sees_sub_minute_overrun() {
        let elapsed = minutes(120) + Duration::seconds(1);
        assert_eq!(billed_hours(elapsed, Rounding::Ceil), 3);
    }

    #[test]
    fn quote_multiplies_by_rate() {
        let entry = DateTime::parse_from_rfc3339("2024-05-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let q = quote(entry, entry + minutes(90), 5000, Rounding::Ceil);
        assert_eq!(q, FeeQuote { fee: 10_000, billed_hours: 2 });

        let q = quote(entry, entry + minutes(90), 5000, Rounding::Floor);
        assert_eq!(q, FeeQuote { fee: 5000, billed_hours: 1 });
    }

    #[test]
    fn rounding_config_names() {
        let r: Rounding = serde_json::from_str("\"floor\"").unwrap();
        assert_eq!(r, Rounding::Floor);
        assert_eq!(Rounding::default(), Rounding::Ceil);
    }

    #[test]
    fn quote_wire_format() {
        let json = serde_json::to_value(FeeQuote { fee: 10_000, billed_hours: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"fee": 10000, "billedHours": 2}));
    }
}
