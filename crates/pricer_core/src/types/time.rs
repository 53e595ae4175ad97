//! Time types for simulation calendars.
//!
//! This module provides:
//! - `Date`: Type-safe date wrapper around chrono::NaiveDate
//! - `Tenor`: Period length used by rate indices and schedules
//! - `DayCountConvention`: Year fraction conventions used by curves and models
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::time::{Date, DayCountConvention, Tenor};
//!
//! let start = Date::from_ymd(2024, 1, 1).unwrap();
//! let end = start.add_tenor(Tenor::months(6)).unwrap();
//! assert_eq!(end, Date::from_ymd(2024, 7, 1).unwrap());
//!
//! let yf = DayCountConvention::ActualActual365.year_fraction_dates(start, end);
//! assert!((yf - 0.4986).abs() < 0.001);
//! ```

use chrono::{Datelike, Days, Months, NaiveDate};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

use super::error::DateError;

/// Type-safe date wrapper around chrono::NaiveDate.
///
/// Dates are the only notion of time exchanged between products, simulators
/// and the valuation coordinator. Ordering is chronological, so sorted and
/// de-duplicated `Vec<Date>` values serve as simulation calendars.
///
/// # Examples
///
/// ```
/// use pricer_core::types::time::Date;
///
/// let date = Date::from_ymd(2024, 6, 15).unwrap();
/// assert_eq!(date.year(), 2024);
///
/// let parsed: Date = "2024-06-15".parse().unwrap();
/// assert_eq!(date, parsed);
///
/// let later = date.add_days(10).unwrap();
/// assert_eq!(later - date, 10);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a Date from year, month, and day components.
    ///
    /// # Returns
    /// `Ok(Date)` if the date is valid, `Err(DateError::InvalidDate)` otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_core::types::time::Date;
    ///
    /// assert!(Date::from_ymd(2024, 2, 29).is_ok());
    /// assert!(Date::from_ymd(2024, 2, 30).is_err());
    /// ```
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or(DateError::InvalidDate { year, month, day })
    }

    /// Parses a date from ISO 8601 format string (YYYY-MM-DD).
    pub fn parse(s: &str) -> Result<Self, DateError> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Date)
            .map_err(|e| DateError::ParseError(e.to_string()))
    }

    /// Returns the underlying NaiveDate.
    pub fn into_inner(self) -> NaiveDate {
        self.0
    }

    /// Returns the year component.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Shifts the date by a signed number of calendar days.
    ///
    /// # Errors
    /// `DateError::OutOfRange` if the result leaves chrono's representable range.
    pub fn add_days(self, days: i64) -> Result<Self, DateError> {
        let shifted = if days >= 0 {
            self.0.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.0.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        shifted.map(Date).ok_or(DateError::OutOfRange {
            date: self.to_string(),
            shift: format!("{days}D"),
        })
    }

    /// Shifts the date by a number of calendar months, clamping to month end.
    ///
    /// ```
    /// use pricer_core::types::time::Date;
    ///
    /// let jan31 = Date::from_ymd(2024, 1, 31).unwrap();
    /// assert_eq!(jan31.add_months(1).unwrap(), Date::from_ymd(2024, 2, 29).unwrap());
    /// ```
    pub fn add_months(self, months: i32) -> Result<Self, DateError> {
        let shifted = if months >= 0 {
            self.0.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            self.0.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        shifted.map(Date).ok_or(DateError::OutOfRange {
            date: self.to_string(),
            shift: format!("{months}M"),
        })
    }

    /// Shifts the date forward by a tenor (months first, then days).
    pub fn add_tenor(self, tenor: Tenor) -> Result<Self, DateError> {
        self.add_months(tenor.months)?.add_days(i64::from(tenor.days))
    }
}

impl Sub for Date {
    type Output = i64;

    /// Returns the number of days between two dates.
    ///
    /// The result is positive if `self` is after `other`, negative otherwise.
    fn sub(self, other: Self) -> i64 {
        (self.0 - other.0).num_days()
    }
}

impl FromStr for Date {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, DateError> {
        Date::parse(s)
    }
}

impl fmt::Display for Date {
    /// Formats the date as ISO 8601 (YYYY-MM-DD).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

/// A period length expressed in months and days.
///
/// Rate indices carry a tenor (3M JIBAR, 6M EURIBOR) and it is part of their
/// identity as a market observable.
///
/// ```
/// use pricer_core::types::time::Tenor;
///
/// assert_eq!(Tenor::months(3).to_string(), "3M");
/// assert_eq!("1Y".parse::<Tenor>().unwrap(), Tenor::months(12));
/// assert_eq!("2W".parse::<Tenor>().unwrap(), Tenor::days(14));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tenor {
    /// Whole months
    pub months: i32,
    /// Additional days
    pub days: i32,
}

impl Tenor {
    /// A tenor of whole months.
    pub const fn months(months: i32) -> Self {
        Self { months, days: 0 }
    }

    /// A tenor of whole days.
    pub const fn days(days: i32) -> Self {
        Self { months: 0, days }
    }

    /// Approximate length in years (months / 12 + days / 365).
    pub fn year_fraction(&self) -> f64 {
        f64::from(self.months) / 12.0 + f64::from(self.days) / 365.0
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.months, self.days) {
            (m, 0) => write!(f, "{m}M"),
            (0, d) => write!(f, "{d}D"),
            (m, d) => write!(f, "{m}M{d}D"),
        }
    }
}

impl FromStr for Tenor {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, DateError> {
        let s = s.trim().to_uppercase();
        let invalid = || DateError::ParseError(format!("invalid tenor: {s}"));
        let unit = s.chars().last().ok_or_else(invalid)?;
        let count: i32 = s[..s.len() - unit.len_utf8()]
            .parse()
            .map_err(|_| invalid())?;
        match unit {
            'D' => Ok(Tenor::days(count)),
            'W' => Ok(Tenor::days(7 * count)),
            'M' => Ok(Tenor::months(count)),
            'Y' => Ok(Tenor::months(12 * count)),
            _ => Err(invalid()),
        }
    }
}

/// Day Count Convention (year fraction convention).
///
/// # Variants
/// - `ActualActual365`: Actual days / 365 (simulation time steps, discounting)
/// - `ActualActual360`: Actual days / 360 (money market accruals)
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DayCountConvention {
    /// Actual/365 Fixed: actual_days / 365.0
    #[default]
    ActualActual365,

    /// Actual/360: actual_days / 360.0
    ActualActual360,
}

impl DayCountConvention {
    /// Returns the standard convention name.
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::ActualActual365 => "ACT/365",
            DayCountConvention::ActualActual360 => "ACT/360",
        }
    }

    /// Calculates the year fraction between two dates.
    ///
    /// Returns a negative value when `start > end`.
    ///
    /// ```
    /// use pricer_core::types::time::{Date, DayCountConvention};
    ///
    /// let start = Date::from_ymd(2024, 1, 1).unwrap();
    /// let end = Date::from_ymd(2024, 7, 1).unwrap();
    /// let yf = DayCountConvention::ActualActual360.year_fraction_dates(start, end);
    /// assert!((yf - 0.5056).abs() < 0.001);
    /// ```
    pub fn year_fraction_dates(&self, start: Date, end: Date) -> f64 {
        let days = (end - start) as f64;
        match self {
            DayCountConvention::ActualActual365 => days / 365.0,
            DayCountConvention::ActualActual360 => days / 360.0,
        }
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Sorts dates chronologically and removes duplicates in place.
///
/// Simulation calendars are always kept in this normal form.
pub fn normalise_dates(dates: &mut Vec<Date>) {
    dates.sort_unstable();
    dates.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_date_from_ymd_invalid() {
        match Date::from_ymd(2023, 2, 29) {
            Err(DateError::InvalidDate { year, month, day }) => {
                assert_eq!((year, month, day), (2023, 2, 29));
            }
            other => panic!("Expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn test_date_parse_and_display() {
        let d: Date = "2024-06-15".parse().unwrap();
        assert_eq!(d.to_string(), "2024-06-15");
        assert!(Date::parse("15/06/2024").is_err());
    }

    #[test]
    fn test_add_days_both_directions() {
        let d = date(2024, 3, 1);
        assert_eq!(d.add_days(-1).unwrap(), date(2024, 2, 29));
        assert_eq!(d.add_days(31).unwrap(), date(2024, 4, 1));
        assert_eq!(d.add_days(0).unwrap(), d);
    }

    #[test]
    fn test_add_months_clamps_month_end() {
        assert_eq!(date(2023, 1, 31).add_months(1).unwrap(), date(2023, 2, 28));
        assert_eq!(date(2024, 5, 31).add_months(-3).unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn test_add_tenor() {
        let d = date(2024, 1, 15);
        assert_eq!(d.add_tenor(Tenor::months(3)).unwrap(), date(2024, 4, 15));
        assert_eq!(d.add_tenor(Tenor::days(14)).unwrap(), date(2024, 1, 29));
    }

    #[test]
    fn test_tenor_parse() {
        assert_eq!("3m".parse::<Tenor>().unwrap(), Tenor::months(3));
        assert_eq!("1D".parse::<Tenor>().unwrap(), Tenor::days(1));
        assert!("M".parse::<Tenor>().is_err());
        assert!("3Q".parse::<Tenor>().is_err());
    }

    #[test]
    fn test_tenor_display() {
        assert_eq!(Tenor::months(6).to_string(), "6M");
        assert_eq!(Tenor::days(7).to_string(), "7D");
        assert_eq!(Tenor { months: 1, days: 2 }.to_string(), "1M2D");
    }

    #[test]
    fn test_year_fraction_dates_negative() {
        let a = date(2024, 1, 1);
        let b = date(2025, 1, 1);
        let yf = DayCountConvention::ActualActual365.year_fraction_dates(b, a);
        assert!((yf + 366.0 / 365.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalise_dates() {
        let mut dates = vec![date(2024, 3, 1), date(2024, 1, 1), date(2024, 3, 1)];
        normalise_dates(&mut dates);
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 3, 1)]);
    }

    proptest! {
        #[test]
        fn test_add_days_matches_subtraction(offset in -20_000i64..20_000) {
            let base = date(2024, 6, 30);
            let shifted = base.add_days(offset).unwrap();
            prop_assert_eq!(shifted - base, offset);
        }
    }
}
