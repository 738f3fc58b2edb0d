use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate};

// Jalali leap years follow the 33-year cycle with the break years below
// (the jalaali arithmetic, valid for years -61..3178).
const BREAKS: [i32; 20] = [
    -61, 9, 38, 199, 426, 686, 756, 818, 1111, 1181, 1210, 1635, 2060, 2097, 2192, 2262, 2324,
    2394, 2456, 3178,
];

/// A civil date in the Jalali (Persian solar) calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl JalaliDate {
    pub fn from_gregorian(date: NaiveDate) -> JalaliDate {
        from_day_number(date.num_days_from_ce())
    }

    /// Fixed user-facing rendering, `YYYY/MM/DD`.
    pub fn format(&self) -> String {
        format!("{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

pub fn to_gregorian(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    if !(1..=3176).contains(&year) {
        return Err(Error::Validation(format!("year out of range: {year}")));
    }
    if !(1..=12).contains(&month) {
        return Err(Error::Validation(format!("month out of range: {month}")));
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(Error::Validation(format!("day out of range: {day}")));
    }
    let number = to_day_number(year, month as i32, day as i32);
    Ok(NaiveDate::from_num_days_from_ce_opt(number).unwrap())
}

pub fn is_leap_year(year: i32) -> bool {
    jal_cal(year).leap == 0
}

/// Months 1-6 have 31 days, 7-11 have 30, month 12 has 29 or 30.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1..=6 => 31,
        7..=11 => 30,
        _ => {
            if is_leap_year(year) {
                30
            } else {
                29
            }
        }
    }
}

struct JalCal {
    /// Years until the next leap year; 0 in a leap year itself.
    leap: i32,
    /// Gregorian year of this Jalali year's first day.
    gy: i32,
    /// March day of Farvardin 1st.
    march: i32,
}

fn jal_cal(jy: i32) -> JalCal {
    debug_assert!(jy > BREAKS[0] && jy < BREAKS[BREAKS.len() - 1]);

    let gy = jy + 621;
    let mut leap_j = -14;
    let mut jp = BREAKS[0];
    let mut jump = 0;

    for &jm in &BREAKS[1..] {
        jump = jm - jp;
        if jy < jm {
            break;
        }
        leap_j += jump / 33 * 8 + jump % 33 / 4;
        jp = jm;
    }
    let mut n = jy - jp;

    leap_j += n / 33 * 8 + (n % 33 + 3) / 4;
    if jump % 33 == 4 && jump - n == 4 {
        leap_j += 1;
    }

    let leap_g = gy / 4 - (gy / 100 + 1) * 3 / 4 - 150;
    let march = 20 + leap_j - leap_g;

    if jump - n < 6 {
        n = n - jump + (jump + 4) / 33 * 33;
    }
    let mut leap = ((n + 1) % 33 - 1) % 4;
    if leap == -1 {
        leap = 4;
    }

    JalCal { leap, gy, march }
}

// Gregorian day handling delegates to chrono's proleptic day count; only the
// Jalali year shape comes from the break-table arithmetic.

fn farvardin_first(r: &JalCal) -> i32 {
    NaiveDate::from_ymd_opt(r.gy, 3, r.march as u32)
        .unwrap()
        .num_days_from_ce()
}

fn to_day_number(jy: i32, jm: i32, jd: i32) -> i32 {
    let r = jal_cal(jy);
    farvardin_first(&r) + (jm - 1) * 31 - jm / 7 * (jm - 7) + jd - 1
}

fn from_day_number(number: i32) -> JalaliDate {
    let gy = NaiveDate::from_num_days_from_ce_opt(number).unwrap().year();
    let mut jy = gy - 621;
    let r = jal_cal(jy);

    let mut k = number - farvardin_first(&r);
    if k >= 0 {
        if k <= 185 {
            return JalaliDate {
                year: jy,
                month: (1 + k / 31) as u32,
                day: (k % 31 + 1) as u32,
            };
        }
        k -= 186;
    } else {
        jy -= 1;
        k += 179;
        if r.leap == 1 {
            k += 1;
        }
    }
    JalaliDate {
        year: jy,
        month: (7 + k / 30) as u32,
        day: (k % 30 + 1) as u32,
    }
}
