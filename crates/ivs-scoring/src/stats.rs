//! Aggregations behind the statistics endpoints.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};

use crate::evaluation::is_passing;

/// Mean of the scores, `None` when there are none.
pub fn mean(scores: &[i32]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let total: i64 = scores.iter().map(|s| i64::from(*s)).sum();
    Some(total as f64 / scores.len() as f64)
}

/// Share of passing scores, from 0.0 to 1.0.
pub fn correct_rate(scores: &[i32]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let passed = scores.iter().filter(|s| is_passing(**s)).count();
    passed as f64 / scores.len() as f64
}

/// Round to one decimal place (scores).
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places (rates).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Length of the run of consecutive active days ending today.
///
/// A streak is still alive when the last active day is yesterday: the user
/// has not missed a day until today is over.
pub fn current_streak(active_days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let start = if active_days.contains(&today) {
        today
    } else {
        match today.checked_sub_days(Days::new(1)) {
            Some(yesterday) if active_days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    let mut day = start;
    while active_days.contains(&day) {
        streak += 1;
        match day.checked_sub_days(Days::new(1)) {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

/// Longest run of consecutive active days.
pub fn longest_streak(active_days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in active_days {
        current = match previous {
            Some(prev) if prev.checked_add_days(Days::new(1)) == Some(*day) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(*day);
    }
    longest
}

/// The `days` calendar days ending at `end`, oldest first.
pub fn date_window(end: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .rev()
        .filter_map(|offset| end.checked_sub_days(Days::new(u64::from(offset))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn days(list: &[&str]) -> BTreeSet<NaiveDate> {
        list.iter().map(|d| date(d)).collect()
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[80, 90, 100]), Some(90.0));
        assert_eq!(mean(&[75, 80]), Some(77.5));
    }

    #[test]
    fn test_correct_rate() {
        assert_eq!(correct_rate(&[]), 0.0);
        assert_eq!(correct_rate(&[59, 60, 90, 10]), 0.5);
        assert_eq!(correct_rate(&[100]), 1.0);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round1(78.46), 78.5);
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }

    #[test]
    fn test_current_streak_including_today() {
        let active = days(&["2024-01-13", "2024-01-14", "2024-01-15"]);
        assert_eq!(current_streak(&active, date("2024-01-15")), 3);
    }

    #[test]
    fn test_current_streak_ending_yesterday() {
        let active = days(&["2024-01-13", "2024-01-14"]);
        assert_eq!(current_streak(&active, date("2024-01-15")), 2);
    }

    #[test]
    fn test_current_streak_broken() {
        let active = days(&["2024-01-10", "2024-01-11"]);
        assert_eq!(current_streak(&active, date("2024-01-15")), 0);
        assert_eq!(current_streak(&BTreeSet::new(), date("2024-01-15")), 0);
    }

    #[test]
    fn test_longest_streak() {
        let active = days(&[
            "2024-01-01",
            "2024-01-02",
            "2024-01-05",
            "2024-01-06",
            "2024-01-07",
            "2024-01-09",
        ]);
        assert_eq!(longest_streak(&active), 3);
        assert_eq!(longest_streak(&BTreeSet::new()), 0);
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let active = days(&["2024-02-28", "2024-02-29", "2024-03-01"]);
        assert_eq!(longest_streak(&active), 3);
        assert_eq!(current_streak(&active, date("2024-03-01")), 3);
    }

    #[test]
    fn test_date_window() {
        let window = date_window(date("2024-03-02"), 3);
        assert_eq!(
            window,
            vec![date("2024-02-29"), date("2024-03-01"), date("2024-03-02")]
        );
        assert!(date_window(date("2024-03-02"), 0).is_empty());
    }
}
