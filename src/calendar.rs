use chrono::{Datelike, Duration, NaiveDate};

/// Days of a month laid out for a Sunday-first grid. Leading `None`s pad the
/// first week. Returns `None` for an invalid year/month.
pub fn month_grid(year: i32, month: u32) -> Option<Vec<Option<NaiveDate>>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let padding = first.weekday().num_days_from_sunday() as usize;

    let mut grid = vec![None; padding];
    grid.extend(month_dates(first).map(Some));
    Some(grid)
}

pub fn month_dates(first: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let month = first.month();
    (0..31)
        .map(move |offset| first + Duration::days(offset))
        .take_while(move |date| date.month() == month)
}

pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 { (year - 1, 12) } else { (year, month - 1) }
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 { (year + 1, 1) } else { (year, month + 1) }
}
