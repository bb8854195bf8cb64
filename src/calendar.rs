use chrono::{Datelike, Days, Months, NaiveDate};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Dates for a Sunday-first month grid, padded with neighbouring months so
/// every row is complete. `month` is zero based.
pub fn calendar_days(year: i32, month: u32) -> Option<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1)?;
    let next_first = first.checked_add_months(Months::new(1))?;
    let days_in_month = (next_first - first).num_days() as u32;

    let leading = first.weekday().num_days_from_sunday();
    let total = (leading + days_in_month).div_ceil(7) * 7;
    let start = first.checked_sub_days(Days::new(leading.into()))?;

    Some(start.iter_days().take(total as usize).collect())
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Accepts only canonical, zero padded keys.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    if key.len() != 10 {
        return None;
    }
    let date = NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()?;
    (date_key(date) == key).then_some(date)
}

pub fn is_same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month as usize).copied()
}

/// Moves a (year, zero based month) pair by `delta` months.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let absolute = year as i64 * 12 + month as i64 + delta as i64;
    (absolute.div_euclid(12) as i32, absolute.rem_euclid(12) as u32)
}

/// Zero based month index of a date, as used by the grid.
pub fn month_index(date: NaiveDate) -> u32 {
    date.month0()
}
