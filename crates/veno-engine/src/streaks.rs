//! Daily activity streaks.
//!
//! Day-granularity: one qualifying activity per day keeps the streak
//! alive, consecutive days extend it, a missed day resets it. Dates come
//! from the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakTracker {
    current: u32,
    longest: u32,
    last_active: Option<NaiveDate>,
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn longest(&self) -> u32 {
        self.longest
    }

    pub fn last_active(&self) -> Option<NaiveDate> {
        self.last_active
    }

    /// Record qualifying activity on `date`. Returns `true` if the streak
    /// length changed. Repeat activity on the same day is a no-op, and
    /// reports for days before the last recorded one are ignored.
    pub fn record_activity(&mut self, date: NaiveDate) -> bool {
        let changed = match self.last_active {
            Some(last) => match (date - last).num_days() {
                days if days <= 0 => return false,
                1 => {
                    self.current += 1;
                    true
                }
                _ => {
                    debug!(current = self.current, "streak broken");
                    self.current = 1;
                    true
                }
            },
            None => {
                self.current = 1;
                true
            }
        };
        self.last_active = Some(date);
        self.longest = self.longest.max(self.current);
        changed
    }

    /// Whether the streak has lapsed as of `today`: more than one day has
    /// passed since the last activity.
    pub fn has_lapsed(&self, today: NaiveDate) -> bool {
        match self.last_active {
            Some(last) => (today - last).num_days() > 1,
            None => false,
        }
    }

    /// The streak length still claimable as of `today` (zero once lapsed).
    pub fn current_as_of(&self, today: NaiveDate) -> u32 {
        if self.has_lapsed(today) {
            0
        } else {
            self.current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_activity_starts_streak_of_one() {
        let mut streak = StreakTracker::new();
        assert!(streak.record_activity(day(2026, 8, 7)));
        assert_eq!(streak.current(), 1);
        assert_eq!(streak.longest(), 1);
        assert_eq!(streak.last_active(), Some(day(2026, 8, 7)));
    }

    #[test]
    fn consecutive_days_extend_streak() {
        let mut streak = StreakTracker::new();
        streak.record_activity(day(2026, 8, 5));
        streak.record_activity(day(2026, 8, 6));
        streak.record_activity(day(2026, 8, 7));
        assert_eq!(streak.current(), 3);
        assert_eq!(streak.longest(), 3);
    }

    #[test]
    fn same_day_repeat_is_a_no_op() {
        let mut streak = StreakTracker::new();
        streak.record_activity(day(2026, 8, 7));
        assert!(!streak.record_activity(day(2026, 8, 7)));
        assert_eq!(streak.current(), 1);
    }

    #[test]
    fn gap_resets_to_one_but_longest_survives() {
        let mut streak = StreakTracker::new();
        streak.record_activity(day(2026, 8, 1));
        streak.record_activity(day(2026, 8, 2));
        streak.record_activity(day(2026, 8, 3));
        streak.record_activity(day(2026, 8, 6));
        assert_eq!(streak.current(), 1);
        assert_eq!(streak.longest(), 3);
    }

    #[test]
    fn month_boundary_counts_as_consecutive() {
        let mut streak = StreakTracker::new();
        streak.record_activity(day(2026, 1, 31));
        streak.record_activity(day(2026, 2, 1));
        assert_eq!(streak.current(), 2);
    }

    #[test]
    fn year_boundary_counts_as_consecutive() {
        let mut streak = StreakTracker::new();
        streak.record_activity(day(2025, 12, 31));
        streak.record_activity(day(2026, 1, 1));
        assert_eq!(streak.current(), 2);
    }

    #[test]
    fn out_of_order_reports_are_ignored() {
        let mut streak = StreakTracker::new();
        streak.record_activity(day(2026, 8, 7));
        assert!(!streak.record_activity(day(2026, 8, 5)));
        assert_eq!(streak.current(), 1);
        assert_eq!(streak.last_active(), Some(day(2026, 8, 7)));
    }

    #[test]
    fn lapse_detection() {
        let mut streak = StreakTracker::new();
        streak.record_activity(day(2026, 8, 5));
        streak.record_activity(day(2026, 8, 6));

        assert!(!streak.has_lapsed(day(2026, 8, 6)));
        assert!(!streak.has_lapsed(day(2026, 8, 7)));
        assert!(streak.has_lapsed(day(2026, 8, 8)));

        assert_eq!(streak.current_as_of(day(2026, 8, 7)), 2);
        assert_eq!(streak.current_as_of(day(2026, 8, 8)), 0);
    }

    #[test]
    fn fresh_tracker_has_not_lapsed() {
        let streak = StreakTracker::new();
        assert!(!streak.has_lapsed(day(2026, 8, 7)));
        assert_eq!(streak.current_as_of(day(2026, 8, 7)), 0);
    }

    #[test]
    fn serde_round_trip() {
        let mut streak = StreakTracker::new();
        streak.record_activity(day(2026, 8, 6));
        streak.record_activity(day(2026, 8, 7));

        let json = serde_json::to_string(&streak).unwrap();
        let parsed: StreakTracker = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, streak);
    }
}
