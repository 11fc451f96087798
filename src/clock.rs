// 🕰️ Clock & month windows
//
// "Current month" is always read from an injected Clock so budget checks
// can be tested against a fixed date.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

use crate::error::{FinanceError, Result};

pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a given instant (tests, replays).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Midnight at the start of `date`.
    pub fn on(date: NaiveDate) -> Self {
        FixedClock(date.and_time(NaiveTime::default()))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

// ============================================================================
// MONTH WINDOW
// ============================================================================

/// Inclusive date range covering one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    first: NaiveDate,
    last: NaiveDate,
}

impl MonthWindow {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(FinanceError::validation(
                "Invalid month. Please enter a number between 1 and 12.",
            ));
        }

        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| FinanceError::validation(format!("Invalid year: {}", year)))?;
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| FinanceError::validation(format!("Invalid year: {}", year)))?;

        Ok(MonthWindow { first, last })
    }

    /// Month containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let last = first
            .checked_add_months(chrono::Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(date);
        MonthWindow { first, last }
    }

    pub fn first(&self) -> NaiveDate {
        self.first
    }

    pub fn last(&self) -> NaiveDate {
        self.last
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    pub fn previous(&self) -> Self {
        Self::containing(self.first.pred_opt().unwrap_or(self.first))
    }

    pub fn next(&self) -> Self {
        Self::containing(self.last.succ_opt().unwrap_or(self.last))
    }
}

impl fmt::Display for MonthWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year(), self.month())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_window_bounds() {
        let june = MonthWindow::new(2025, 6).unwrap();
        assert_eq!(june.first(), d(2025, 6, 1));
        assert_eq!(june.last(), d(2025, 6, 30));
        assert_eq!(june.to_string(), "2025-06");

        let feb_leap = MonthWindow::new(2024, 2).unwrap();
        assert_eq!(feb_leap.last(), d(2024, 2, 29));

        let december = MonthWindow::new(2025, 12).unwrap();
        assert_eq!(december.last(), d(2025, 12, 31));
    }

    #[test]
    fn test_month_window_rejects_bad_month() {
        assert!(matches!(MonthWindow::new(2025, 0), Err(FinanceError::Validation(_))));
        assert!(matches!(MonthWindow::new(2025, 13), Err(FinanceError::Validation(_))));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let june = MonthWindow::new(2025, 6).unwrap();
        assert!(june.contains(d(2025, 6, 1)));
        assert!(june.contains(d(2025, 6, 30)));
        assert!(!june.contains(d(2025, 5, 31)));
        assert!(!june.contains(d(2025, 7, 1)));
        assert!(!june.contains(d(2024, 6, 15)));
    }

    #[test]
    fn test_containing_and_navigation() {
        let w = MonthWindow::containing(d(2025, 1, 17));
        assert_eq!(w, MonthWindow::new(2025, 1).unwrap());
        assert_eq!(w.previous(), MonthWindow::new(2024, 12).unwrap());
        assert_eq!(w.next(), MonthWindow::new(2025, 2).unwrap());
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::on(d(2025, 6, 15));
        assert_eq!(clock.today(), d(2025, 6, 15));
        assert_eq!(MonthWindow::containing(clock.today()).to_string(), "2025-06");
    }
}
