pub mod jalali;

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

use self::jalali::JalaliDate;

/// Fixed Tehran offset (UTC+3:30). No daylight-saving rules apply.
pub fn tehran_offset() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600 + 30 * 60).unwrap()
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// The local civil day containing `at`. This is the day identity used for
/// deduplication and daily report boundaries.
pub fn local_day(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&tehran_offset()).date_naive()
}

/// Render an instant as user-facing Jalali date and local time,
/// `YYYY/MM/DD` and `HH:MM:SS`.
pub fn to_local_civil(at: DateTime<Utc>) -> (String, String) {
    let local = at.with_timezone(&tehran_offset());
    let date = JalaliDate::from_gregorian(local.date_naive());
    (date.format(), local.format("%H:%M:%S").to_string())
}

/// Half-open `[start, end)` interval of the local day containing `at`.
pub fn day_bounds(at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_midnight(local_day(at));
    (start, start + Duration::days(1))
}

/// Half-open `[start, end)` interval of a Jalali month, rolling over to the
/// next year after month 12.
pub fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = jalali::to_gregorian(year, month, 1)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = jalali::to_gregorian(next_year, next_month, 1)?;
    Ok((local_midnight(start), local_midnight(end)))
}

/// Parse a Jalali `YYYY-MM` period token (`YYYY/MM` is also accepted).
pub fn parse_period_token(text: &str) -> Result<(i32, u32)> {
    let token = text.trim();
    let (year, month) = token
        .split_once(['-', '/'])
        .ok_or_else(|| Error::Validation(format!("malformed period token: {token}")))?;
    let year: i32 = year
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("malformed period token: {token}")))?;
    let month: u32 = month
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("malformed period token: {token}")))?;
    if !(1..=3000).contains(&year) {
        return Err(Error::Validation(format!("year out of range: {year}")));
    }
    if !(1..=12).contains(&month) {
        return Err(Error::Validation(format!("month out of range: {month}")));
    }
    Ok((year, month))
}

fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).unwrap();
    tehran_offset()
        .from_local_datetime(&naive)
        .unwrap()
        .to_utc()
}
