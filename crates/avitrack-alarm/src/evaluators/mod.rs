//! One evaluator per alarm type. Each takes the farm, its active
//! configuration, and the evaluation date, and returns the alarms it
//! created. Dedup against live alarms makes every evaluator idempotent:
//! re-running over unchanged data creates nothing.

pub mod missing_records;
pub mod mortality;
pub mod stock;
pub mod weight;

use chrono::{Duration, NaiveDate};

/// Evaluation window in whole days, at least one, ending on `today`.
pub(crate) fn window_days(evaluation_period_hours: i32) -> i64 {
    let days = (i64::from(evaluation_period_hours) + 23) / 24;
    days.max(1)
}

pub(crate) fn window_start(today: NaiveDate, evaluation_period_hours: i32) -> NaiveDate {
    today - Duration::days(window_days(evaluation_period_hours) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_rounds_hours_up_to_whole_days() {
        assert_eq!(window_days(24), 1);
        assert_eq!(window_days(25), 2);
        assert_eq!(window_days(48), 2);
        assert_eq!(window_days(168), 7);
        // Degenerate configs still look at today.
        assert_eq!(window_days(0), 1);
        assert_eq!(window_days(1), 1);
    }

    #[test]
    fn window_start_includes_today() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        assert_eq!(window_start(today, 24), today);
        assert_eq!(
            window_start(today, 72),
            NaiveDate::from_ymd_opt(2026, 8, 26).unwrap()
        );
    }
}
