//! Calendar offsets for stepping through a series
//!
//! Monthly data steps by month ends, everything else by calendar days.
//! Month-end stepping follows the usual anchored-offset rule: moving a date
//! that is not itself a month end to the end of its month counts as the
//! first step.

use crate::config::Frequency;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};

/// An anchored calendar step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarOffset {
    /// Add a number of calendar days
    Days(u32),
    /// Roll forward by a number of month ends
    MonthEnd(u32),
}

impl CalendarOffset {
    fn for_frequency(freq: Frequency, n: u32) -> Self {
        match freq {
            Frequency::Monthly => CalendarOffset::MonthEnd(n),
            Frequency::Daily => CalendarOffset::Days(n),
        }
    }

    /// Apply the offset to a date
    pub fn apply(&self, date: NaiveDate) -> Result<NaiveDate> {
        let shifted = match *self {
            CalendarOffset::Days(n) => date.checked_add_days(Days::new(u64::from(n))),
            CalendarOffset::MonthEnd(n) => roll_month_ends(date, n),
        };

        shifted.ok_or_else(|| {
            ForecastError::DataError(format!("Date {} is out of range after {:?}", date, self))
        })
    }
}

/// Last day of the month containing `date`
pub fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

fn roll_month_ends(date: NaiveDate, n: u32) -> Option<NaiveDate> {
    let end = month_end(date)?;
    let remaining = if end != date { n.saturating_sub(1) } else { n };
    if remaining == 0 {
        return Some(end);
    }

    let first_of_month = NaiveDate::from_ymd_opt(end.year(), end.month(), 1)?;
    month_end(first_of_month.checked_add_months(Months::new(remaining))?)
}

/// The three steps a backtest needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offsets {
    /// One period of the series
    pub one_period: CalendarOffset,
    /// The whole prediction horizon
    pub horizon: CalendarOffset,
    /// Distance between two window cutoffs
    pub stride: CalendarOffset,
}

/// Map a frequency and the horizon/stride counts to calendar offsets
pub fn resolve_offsets(freq: Frequency, prediction_length: u32, stride: u32) -> Offsets {
    Offsets {
        one_period: CalendarOffset::for_frequency(freq, 1),
        horizon: CalendarOffset::for_frequency(freq, prediction_length),
        stride: CalendarOffset::for_frequency(freq, stride),
    }
}

/// The `n` dates following `last`, one period apart
pub fn future_dates(last: NaiveDate, one_period: CalendarOffset, n: usize) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(n);
    let mut current = last;
    for _ in 0..n {
        current = one_period.apply(current)?;
        dates.push(current);
    }
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2020, 1, 15), 1, date(2020, 1, 31))]
    #[case(date(2020, 1, 31), 1, date(2020, 2, 29))]
    #[case(date(2020, 1, 15), 3, date(2020, 3, 31))]
    #[case(date(2020, 1, 31), 3, date(2020, 4, 30))]
    #[case(date(2019, 11, 30), 2, date(2020, 1, 31))]
    #[case(date(2021, 2, 1), 12, date(2022, 1, 31))]
    fn test_month_end_rolls(#[case] start: NaiveDate, #[case] n: u32, #[case] expected: NaiveDate) {
        assert_eq!(CalendarOffset::MonthEnd(n).apply(start).unwrap(), expected);
    }

    #[test]
    fn test_days_offset() {
        assert_eq!(
            CalendarOffset::Days(12).apply(date(2020, 2, 25)).unwrap(),
            date(2020, 3, 8)
        );
        assert!(CalendarOffset::Days(1).apply(NaiveDate::MAX).is_err());
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let a = resolve_offsets(Frequency::Monthly, 6, 2);
        let b = resolve_offsets(Frequency::Monthly, 6, 2);
        assert_eq!(a, b);
        assert_eq!(a.one_period, CalendarOffset::MonthEnd(1));
        assert_eq!(a.horizon, CalendarOffset::MonthEnd(6));
        assert_eq!(a.stride, CalendarOffset::MonthEnd(2));

        let daily = resolve_offsets(Frequency::Daily, 12, 7);
        assert_eq!(daily.horizon, CalendarOffset::Days(12));
        assert_eq!(daily.stride, CalendarOffset::Days(7));
    }

    #[test]
    fn test_future_dates() {
        let dates = future_dates(date(2020, 1, 31), CalendarOffset::MonthEnd(1), 3).unwrap();
        assert_eq!(dates, vec![date(2020, 2, 29), date(2020, 3, 31), date(2020, 4, 30)]);

        let dates = future_dates(date(2020, 12, 30), CalendarOffset::Days(1), 2).unwrap();
        assert_eq!(dates, vec![date(2020, 12, 31), date(2021, 1, 1)]);
    }
}
