// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Date resolution for catalog searches.
//!
//! Customers give either a day-of-month pair ("del 20 al 21") or a weekend
//! phrase; both resolve to an epoch-millisecond `[check-in, check-out)` pair.
//! Day pairs are interpreted against the current month and year with no
//! cross-month rollover: "del 30 al 2" yields an inverted range that matches
//! nothing, and a day earlier than today stays in the current month. That
//! mirrors the observed production behavior rather than guessing "next
//! occurrence".

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Timelike, Utc};

fn to_midnight_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Next weekend: Saturday 00:00 through Monday 00:00 (two nights).
///
/// On a Saturday before noon, "this weekend" is today; from noon on it rolls
/// to the following weekend.
pub fn next_weekend(now: DateTime<Utc>) -> (i64, i64) {
    let day = now.weekday().num_days_from_sunday(); // 0 = Sunday, 6 = Saturday
    let mut days_until_saturday = (6 - day) % 7;
    if days_until_saturday == 0 && now.hour() >= 12 {
        days_until_saturday = 7;
    }
    let saturday = now
        .date_naive()
        .checked_add_days(Days::new(u64::from(days_until_saturday)))
        .unwrap_or_else(|| now.date_naive());
    let monday = saturday
        .checked_add_days(Days::new(2))
        .unwrap_or(saturday);
    (to_midnight_ms(saturday), to_midnight_ms(monday))
}

/// Resolve a day-of-month pair against the current month and year.
///
/// Check-out is the day after `day_end` at 00:00; a `day_end` past the end of
/// the month spills into the next one (so "del 30 al 31" in a 31-day month
/// ends on the 1st). Returns `None` when either day is outside 1..=31.
pub fn day_pair_range(now: DateTime<Utc>, day_start: u32, day_end: u32) -> Option<(i64, i64)> {
    if !(1..=31).contains(&day_start) || !(1..=31).contains(&day_end) {
        return None;
    }
    let first_of_month = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)?;
    let starts = first_of_month.checked_add_days(Days::new(u64::from(day_start - 1)))?;
    let ends = first_of_month.checked_add_days(Days::new(u64::from(day_end)))?;
    Some((to_midnight_ms(starts), to_midnight_ms(ends)))
}
