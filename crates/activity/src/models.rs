//! Activity record and aggregate stats

use chrono::{DateTime, Datelike, Utc};

/// Activity of a single user or group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    /// Telegram user id, or chat id for groups
    pub user_id: i64,
    pub is_group: bool,
    pub last_activity: DateTime<Utc>,
    /// Messages seen during the current day
    pub daily: i64,
    /// Messages seen during the current ISO week
    pub weekly: i64,
    /// Messages seen during the current month
    pub monthly: i64,
    /// Messages seen during the current year
    pub yearly: i64,
}

impl ActivityRecord {
    /// Record created on first contact
    pub fn new(user_id: i64, is_group: bool, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            is_group,
            last_activity: now,
            daily: 0,
            weekly: 0,
            monthly: 0,
            yearly: 0,
        }
    }

    /// Register another contact at `now`
    ///
    /// Each counter restarts when `now` falls into a different period than
    /// the previous activity, then all counters are incremented.
    pub fn touch(&mut self, is_group: bool, now: DateTime<Utc>) {
        let prev = self.last_activity;

        if prev.year() != now.year() {
            self.yearly = 0;
        }
        if (prev.year(), prev.month()) != (now.year(), now.month()) {
            self.monthly = 0;
        }
        if prev.iso_week() != now.iso_week() {
            self.weekly = 0;
        }
        if prev.date_naive() != now.date_naive() {
            self.daily = 0;
        }

        self.daily += 1;
        self.weekly += 1;
        self.monthly += 1;
        self.yearly += 1;
        self.is_group |= is_group;
        self.last_activity = now;
    }
}

/// Usage report numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityStats {
    /// Records active within the last day
    pub daily: u64,
    /// Records active within the last 7 days
    pub weekly: u64,
    /// Records active within the last 30 days
    pub monthly: u64,
    /// Records active within the last 365 days
    pub yearly: u64,
    pub total_groups: u64,
    pub total_records: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_new_record_starts_at_zero() {
        let r = ActivityRecord::new(1, false, at(2024, 5, 1, 10));
        assert_eq!((r.daily, r.weekly, r.monthly, r.yearly), (0, 0, 0, 0));
    }

    #[test]
    fn test_touch_same_day_accumulates() {
        let mut r = ActivityRecord::new(1, false, at(2024, 5, 1, 10));
        r.touch(false, at(2024, 5, 1, 11));
        r.touch(false, at(2024, 5, 1, 12));
        assert_eq!((r.daily, r.weekly, r.monthly, r.yearly), (2, 2, 2, 2));
        assert_eq!(r.last_activity, at(2024, 5, 1, 12));
    }

    #[test]
    fn test_touch_rolls_periods() {
        // Wednesday 2024-05-01
        let mut r = ActivityRecord::new(1, false, at(2024, 5, 1, 10));
        r.touch(false, at(2024, 5, 1, 11));

        // Next day, same week
        r.touch(false, at(2024, 5, 2, 9));
        assert_eq!((r.daily, r.weekly, r.monthly, r.yearly), (1, 2, 2, 2));

        // Next Monday, same month
        r.touch(false, at(2024, 5, 6, 9));
        assert_eq!((r.daily, r.weekly, r.monthly, r.yearly), (1, 1, 3, 3));

        // Next month
        r.touch(false, at(2024, 6, 6, 9));
        assert_eq!((r.daily, r.weekly, r.monthly, r.yearly), (1, 1, 1, 4));

        // Next year
        r.touch(false, at(2025, 6, 6, 9));
        assert_eq!((r.daily, r.weekly, r.monthly, r.yearly), (1, 1, 1, 1));
    }

    #[test]
    fn test_group_flag_is_sticky() {
        let mut r = ActivityRecord::new(-100, false, at(2024, 5, 1, 10));
        r.touch(true, at(2024, 5, 1, 11));
        assert!(r.is_group);
        r.touch(false, at(2024, 5, 1, 12));
        assert!(r.is_group);
    }
}
