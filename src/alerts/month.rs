use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The calendar-month window an evaluation runs against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthWindow {
    /// First day of the month at 00:00 UTC, the lower bound for expense
    /// aggregation.
    pub start: DateTime<Utc>,
    pub days_in_month: u32,
    pub day_of_month: u32,
}

impl MonthWindow {
    pub fn containing(now: DateTime<Utc>) -> Self {
        let start = Utc
            .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(now);
        Self {
            start,
            days_in_month: days_in_month(now.year(), now.month()),
            day_of_month: now.day(),
        }
    }

    pub fn days_remaining(&self) -> u32 {
        self.days_in_month.saturating_sub(self.day_of_month)
    }

    /// True when `when` falls inside this window's month and year.
    pub fn contains(&self, when: DateTime<Utc>) -> bool {
        when.year() == self.start.year() && when.month() == self.start.month()
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first = chrono::NaiveDate::from_ymd_opt(year, month, 1);
    let next = chrono::NaiveDate::from_ymd_opt(next_year, next_month, 1);
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 30,
    }
}
