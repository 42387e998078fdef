//! Walk-forward windows over a series table

use crate::data::SeriesTable;
use crate::error::Result;
use crate::offsets::{CalendarOffset, Offsets};
use chrono::NaiveDate;

/// One evaluation window
#[derive(Debug, Clone)]
pub struct Window {
    /// First date of the actual slice
    pub cutoff: NaiveDate,
    /// Rows dated strictly before the cutoff
    pub history: SeriesTable,
    /// Rows dated in `[cutoff, cutoff + horizon)`
    pub actual: SeriesTable,
}

/// Lazily yields windows in increasing cutoff order.
///
/// The first cutoff is one period after `start`; a cutoff is produced as long
/// as `cutoff + horizon <= last date + one period`. The input table is not
/// touched: the walker sorts its own copy.
#[derive(Debug)]
pub struct WindowWalker {
    sorted: SeriesTable,
    dates: Vec<NaiveDate>,
    horizon: CalendarOffset,
    stride: CalendarOffset,
    bound: Option<NaiveDate>,
    cursor: Option<NaiveDate>,
}

impl WindowWalker {
    pub fn new(
        series: &SeriesTable,
        start: NaiveDate,
        horizon: CalendarOffset,
        one_period: CalendarOffset,
        stride: CalendarOffset,
    ) -> Result<Self> {
        let sorted = series.sorted_by_date()?;
        let dates = sorted.dates()?;

        let (bound, cursor) = match dates.last() {
            Some(&end) => (Some(one_period.apply(end)?), Some(one_period.apply(start)?)),
            None => (None, None),
        };

        Ok(Self {
            sorted,
            dates,
            horizon,
            stride,
            bound,
            cursor,
        })
    }

    /// Walker using the resolved offsets of a backtest
    pub fn with_offsets(series: &SeriesTable, start: NaiveDate, offsets: &Offsets) -> Result<Self> {
        Self::new(
            series,
            start,
            offsets.horizon,
            offsets.one_period,
            offsets.stride,
        )
    }

    fn window_at(&self, cutoff: NaiveDate, window_end: NaiveDate) -> Window {
        let history_len = self.dates.partition_point(|d| *d < cutoff);
        let actual_end = self.dates.partition_point(|d| *d < window_end);

        Window {
            cutoff,
            history: self.sorted.slice(0, history_len),
            actual: self.sorted.slice(history_len, actual_end - history_len),
        }
    }
}

impl Iterator for WindowWalker {
    type Item = Result<Window>;

    fn next(&mut self) -> Option<Self::Item> {
        let cutoff = self.cursor.take()?;
        let bound = self.bound?;

        let window_end = match self.horizon.apply(cutoff) {
            Ok(date) => date,
            Err(e) => return Some(Err(e)),
        };
        if window_end > bound {
            return None;
        }

        // A cutoff that cannot be advanced ends the walk after this window
        self.cursor = self.stride.apply(cutoff).ok();
        Some(Ok(self.window_at(cutoff, window_end)))
    }
}
