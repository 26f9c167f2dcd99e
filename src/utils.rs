use chrono::{DateTime, FixedOffset, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::consts::{MINUTES_PER_HOUR, STANDARD_SHIFT_MINUTES};

/// First day of the month and first day of the following month
///
/// Returns `None` when `month` is not within `1..=12` or the year is out of range
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = start.checked_add_months(Months::new(1))?;

    Some((start, end))
}

/// Splits a check-in/check-out pair into (working minutes, overtime minutes)
///
/// Overtime is whatever goes past a standard shift, so it is always a part of the working minutes.
pub fn split_shift(check_in: &DateTime<FixedOffset>, check_out: &DateTime<FixedOffset>) -> Option<(i32, i32)> {
    if check_out < check_in {
        return None;
    }

    let working = i32::try_from((*check_out - *check_in).num_minutes()).ok()?;
    let overtime = (working - STANDARD_SHIFT_MINUTES).max(0);

    Some((working, overtime))
}

pub fn minutes_to_hours(minutes: i64) -> Decimal {
    Decimal::from(minutes) / Decimal::from(MINUTES_PER_HOUR)
}
