//! Rolling-origin (expanding window) splits

use crate::data::{SeriesSlice, TimeSeries};

/// One backtest window: everything before `train_end` and the next `horizon` points
#[derive(Debug, Clone, Copy)]
pub struct WindowPair<'a> {
    /// Zero-based position of this window in the sequence
    pub index: usize,
    /// Exclusive end of the training prefix
    pub train_end: usize,
    pub train: SeriesSlice<'a>,
    pub test: SeriesSlice<'a>,
}

/// Generates expanding-window (train, test) pairs over a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingOriginSplitter {
    horizon: usize,
    min_train_size: usize,
}

impl RollingOriginSplitter {
    pub fn new(horizon: usize, min_train_size: usize) -> Self {
        Self {
            horizon,
            min_train_size,
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn min_train_size(&self) -> usize {
        self.min_train_size
    }

    /// Number of windows for a series of length `n`: `max(0, n - h - m + 1)`
    pub fn window_count(&self, n: usize) -> usize {
        if self.horizon == 0 {
            return 0;
        }
        (n + 1).saturating_sub(self.horizon + self.min_train_size)
    }

    /// Lazily iterate the windows of `series`
    ///
    /// Calling this again restarts from the first window.
    pub fn splits<'a>(&self, series: &'a TimeSeries) -> Splits<'a> {
        Splits {
            series,
            horizon: self.horizon,
            next_train_end: self.min_train_size,
            last_train_end: series.len().checked_sub(self.horizon),
            index: 0,
        }
    }
}

/// Iterator over the windows of one series, in increasing `train_end` order
#[derive(Debug, Clone)]
pub struct Splits<'a> {
    series: &'a TimeSeries,
    horizon: usize,
    next_train_end: usize,
    last_train_end: Option<usize>,
    index: usize,
}

impl<'a> Iterator for Splits<'a> {
    type Item = WindowPair<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.horizon == 0 {
            return None;
        }
        let last = self.last_train_end?;
        let train_end = self.next_train_end;
        if train_end > last {
            return None;
        }

        let window = WindowPair {
            index: self.index,
            train_end,
            train: self.series.slice(0, train_end),
            test: self.series.slice(train_end, train_end + self.horizon),
        };
        self.next_train_end += 1;
        self.index += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.last_train_end {
            Some(last) if self.horizon > 0 && self.next_train_end <= last => {
                last - self.next_train_end + 1
            }
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Splits<'_> {}
