//! Time series data handling: frequencies, series and the aggregating loader

use crate::error::{BenchError, Result};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Regular sampling frequency of an aggregated series
///
/// Each variant labels a period by its anchor date, following the pandas
/// offset aliases used by the data pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    /// Calendar day (`D`)
    Daily,
    /// Week ending on Sunday, labelled by the Sunday (`W`, `W-SUN`)
    Weekly,
    /// Calendar month labelled by its first day (`MS`)
    MonthStart,
    /// Calendar month labelled by its last day (`M`, `ME`)
    MonthEnd,
    /// Calendar quarter labelled by its first day (`QS`)
    QuarterStart,
    /// Calendar year labelled by January 1st (`YS`, `AS`)
    YearStart,
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::MonthStart
    }
}

impl FromStr for Frequency {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "D" | "1D" | "DAILY" => Ok(Frequency::Daily),
            "W" | "W-SUN" | "1W" | "WEEKLY" => Ok(Frequency::Weekly),
            "MS" | "MONTHLY" => Ok(Frequency::MonthStart),
            "M" | "ME" => Ok(Frequency::MonthEnd),
            "QS" | "QS-JAN" | "QUARTERLY" => Ok(Frequency::QuarterStart),
            "YS" | "AS" | "YS-JAN" | "AS-JAN" | "YEARLY" => Ok(Frequency::YearStart),
            other => Err(BenchError::Configuration(format!(
                "Unsupported frequency: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

impl Frequency {
    /// The pandas alias for this frequency
    pub fn alias(&self) -> &'static str {
        match self {
            Frequency::Daily => "D",
            Frequency::Weekly => "W-SUN",
            Frequency::MonthStart => "MS",
            Frequency::MonthEnd => "ME",
            Frequency::QuarterStart => "QS",
            Frequency::YearStart => "YS",
        }
    }

    /// Label of the period that contains `date`
    pub fn anchor(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Daily => date,
            Frequency::Weekly => {
                let to_sunday = 6 - date.weekday().num_days_from_monday() as i64;
                date + Duration::days(to_sunday)
            }
            Frequency::MonthStart => first_of_month(date),
            Frequency::MonthEnd => last_of_month(date),
            Frequency::QuarterStart => {
                let month = (date.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
            }
            Frequency::YearStart => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }

    /// Label of the period following the one labelled `label`
    pub fn next(&self, label: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => label.checked_add_signed(Duration::days(1)),
            Frequency::Weekly => label.checked_add_signed(Duration::days(7)),
            Frequency::MonthStart => first_of_month(label).checked_add_months(Months::new(1)),
            Frequency::MonthEnd => first_of_month(label)
                .checked_add_months(Months::new(1))
                .map(last_of_month),
            Frequency::QuarterStart => label.checked_add_months(Months::new(3)),
            Frequency::YearStart => label.checked_add_months(Months::new(12)),
        }
    }

    /// The `count` labels following `last`
    pub fn future_labels(&self, last: NaiveDate, count: usize) -> Vec<NaiveDate> {
        let mut labels = Vec::with_capacity(count);
        let mut current = last;
        for _ in 0..count {
            match self.next(current) {
                Some(next) => {
                    labels.push(next);
                    current = next;
                }
                None => break,
            }
        }
        labels
    }

    /// Code used by foundation models: 0 high, 1 medium, 2 low frequency
    pub fn frequency_code(&self) -> u32 {
        match self {
            Frequency::Daily => 0,
            Frequency::Weekly | Frequency::MonthStart | Frequency::MonthEnd => 1,
            Frequency::QuarterStart | Frequency::YearStart => 2,
        }
    }

    /// Checks that `dates` are anchored labels exactly one period apart
    pub fn is_regular(&self, dates: &[NaiveDate]) -> bool {
        dates.iter().all(|d| self.anchor(*d) == *d)
            && dates.windows(2).all(|w| self.next(w[0]) == Some(w[1]))
    }

    /// Infer the frequency of a regularly spaced index
    ///
    /// Needs at least three dates; returns `None` when no candidate fits.
    pub fn infer(dates: &[NaiveDate]) -> Option<Frequency> {
        if dates.len() < 3 {
            return None;
        }

        [
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::MonthStart,
            Frequency::MonthEnd,
            Frequency::QuarterStart,
            Frequency::YearStart,
        ]
        .into_iter()
        .find(|freq| freq.is_regular(dates))
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// A regularly spaced numeric time series
///
/// Timestamps are unique, ascending and exactly one frequency unit apart.
/// Built once per run and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    frequency: Frequency,
    timestamps: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series, checking that the index is regular at `frequency`
    pub fn new(
        name: impl Into<String>,
        frequency: Frequency,
        timestamps: Vec<NaiveDate>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(BenchError::DataQuality(format!(
                "Series has {} timestamps but {} values",
                timestamps.len(),
                values.len()
            )));
        }
        if !frequency.is_regular(&timestamps) {
            return Err(BenchError::DataQuality(format!(
                "Timestamps are not a gap-free {} index",
                frequency
            )));
        }

        Ok(Self {
            name: name.into(),
            frequency,
            timestamps,
            values,
        })
    }

    /// Create a series of `values` whose first period contains `start`
    pub fn from_start(
        name: impl Into<String>,
        frequency: Frequency,
        start: NaiveDate,
        values: Vec<f64>,
    ) -> Result<Self> {
        let mut timestamps = Vec::with_capacity(values.len());
        if !values.is_empty() {
            let first = frequency.anchor(start);
            timestamps.push(first);
            timestamps.extend(frequency.future_labels(first, values.len() - 1));
        }
        Self::new(name, frequency, timestamps, values)
    }

    /// Name of the value column the series was built from
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the whole series
    pub fn as_slice(&self) -> SeriesSlice<'_> {
        self.slice(0, self.len())
    }

    /// Borrow the points `start..end`
    ///
    /// Bounds are clamped to the series length.
    pub fn slice(&self, start: usize, end: usize) -> SeriesSlice<'_> {
        let end = end.min(self.len());
        let start = start.min(end);
        SeriesSlice {
            frequency: self.frequency,
            timestamps: &self.timestamps[start..end],
            values: &self.values[start..end],
        }
    }
}

/// A read-only view over consecutive points of a [`TimeSeries`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSlice<'a> {
    frequency: Frequency,
    timestamps: &'a [NaiveDate],
    values: &'a [f64],
}

impl<'a> SeriesSlice<'a> {
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn timestamps(&self) -> &'a [NaiveDate] {
        self.timestamps
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDate> {
        self.timestamps.last().copied()
    }

    /// Mean of the values, `None` when empty
    pub fn mean(&self) -> Option<f64> {
        series_math::mean(self.values)
    }
}

/// Loader that turns a date/value table into a [`TimeSeries`]
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file and aggregate it to `frequency`
    pub fn from_csv<P: AsRef<Path>>(
        path: P,
        date_column: &str,
        value_column: &str,
        frequency: Frequency,
    ) -> Result<TimeSeries> {
        let file = File::open(path.as_ref())?;
        // Every column is read as text; parsing happens below so bad cells are reported, not coerced
        let df = CsvReader::new(file)
            .infer_schema(Some(0))
            .has_header(true)
            .finish()?;

        debug!(
            path = %path.as_ref().display(),
            rows = df.height(),
            "Loaded input table"
        );
        Self::from_dataframe(&df, date_column, value_column, frequency)
    }

    /// Aggregate an in-memory table to `frequency`
    pub fn from_dataframe(
        df: &DataFrame,
        date_column: &str,
        value_column: &str,
        frequency: Frequency,
    ) -> Result<TimeSeries> {
        let column_names = df.get_column_names();
        for required in [date_column, value_column] {
            if !column_names.contains(&required) {
                return Err(BenchError::Schema(format!(
                    "Column '{}' not found (available: {})",
                    required,
                    column_names.join(", ")
                )));
            }
        }

        let dates = Self::text_column(df, date_column)?;
        let values = Self::text_column(df, value_column)?;

        let mut records = Vec::with_capacity(dates.len());
        for (row, (date, value)) in dates.iter().zip(values.iter()).enumerate() {
            let date = date
                .as_deref()
                .and_then(parse_date)
                .ok_or_else(|| {
                    BenchError::DataQuality(format!(
                        "Invalid date in row {}: {:?}",
                        row + 1,
                        date
                    ))
                })?;
            let value = value
                .as_deref()
                .and_then(parse_value)
                .ok_or_else(|| {
                    BenchError::DataQuality(format!(
                        "Non-numeric value in row {}: {:?}",
                        row + 1,
                        value
                    ))
                })?;
            records.push((date, value));
        }

        Ok(Self::aggregate(&records, frequency, value_column))
    }

    /// Sum `records` per period and zero-fill the periods without rows
    pub fn aggregate(records: &[(NaiveDate, f64)], frequency: Frequency, name: &str) -> TimeSeries {
        let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for (date, value) in records {
            *buckets.entry(frequency.anchor(*date)).or_insert(0.0) += value;
        }

        let mut timestamps = Vec::with_capacity(buckets.len());
        let mut values = Vec::with_capacity(buckets.len());

        if let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) {
            let mut current = Some(first);
            while let Some(label) = current {
                if label > last {
                    break;
                }
                timestamps.push(label);
                values.push(buckets.get(&label).copied().unwrap_or(0.0));
                current = frequency.next(label);
            }
        }

        TimeSeries {
            name: name.to_string(),
            frequency,
            timestamps,
            values,
        }
    }

    /// Read a column as optional strings, whatever its stored type
    fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
        let column = df.column(name)?.cast(&DataType::Utf8)?;
        let text = column.utf8()?;
        Ok(text
            .into_iter()
            .map(|cell| cell.map(|s| s.to_string()))
            .collect())
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%Y%m%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a date in any of the accepted layouts
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").ok())
}

/// Parse a finite number
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
