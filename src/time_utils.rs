use chrono::{Datelike, Duration, NaiveDate};

/// First and last day of a month, `None` for an invalid year/month.
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next - Duration::days(1)))
}

/// Monday-based week of the month; week 1 contains the 1st.
pub fn week_of_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    let offset = first.weekday().num_days_from_monday();
    (date.day() - 1 + offset) / 7 + 1
}

/// Dates covered by `week` of the month, clipped to the month.
pub fn week_range(year: i32, month: u32, week: u32) -> Option<(NaiveDate, NaiveDate)> {
    if week == 0 {
        return None;
    }
    let (first, last) = month_range(year, month)?;
    let offset = first.weekday().num_days_from_monday() as i64;
    let start = first - Duration::days(offset) + Duration::weeks(week as i64 - 1);
    if start > last {
        return None;
    }
    let end = start + Duration::days(6);
    Some((start.max(first), end.min(last)))
}

/// Every week of the month, in order.
pub fn week_ranges(year: i32, month: u32) -> Vec<(u32, NaiveDate, NaiveDate)> {
    (1..=6)
        .filter_map(|week| week_range(year, month, week).map(|(start, end)| (week, start, end)))
        .collect()
}

pub fn format_hms(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
