use chrono::NaiveDate;
use forecast_bench::{BenchError, DataLoader, Frequency, TimeSeries};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_monthly_aggregation_sums_and_zero_fills() {
    let file = csv_file(&[
        "date,value",
        "2021-01-05,3",
        "2021-01-20,4",
        "2021-03-02,5.5",
    ]);

    let series = DataLoader::from_csv(file.path(), "date", "value", Frequency::MonthStart).unwrap();
    assert_eq!(
        series.timestamps(),
        &[date(2021, 1, 1), date(2021, 2, 1), date(2021, 3, 1)]
    );
    assert_eq!(series.values(), &[7.0, 0.0, 5.5]);
    assert_eq!(series.name(), "value");
}

#[test]
fn test_compact_dates_are_read() {
    let file = csv_file(&["date,value", "20210105,2", "20210218,3"]);

    let series = DataLoader::from_csv(file.path(), "date", "value", Frequency::MonthStart).unwrap();
    assert_eq!(series.timestamps(), &[date(2021, 1, 1), date(2021, 2, 1)]);
    assert_eq!(series.values(), &[2.0, 3.0]);
}

#[test]
fn test_custom_columns_and_unsorted_rows() {
    let file = csv_file(&[
        "cid,day,count",
        "a,2021-02-10,1",
        "b,2021-01-03,2",
        "c,2021-01-01,3",
    ]);

    let series = DataLoader::from_csv(file.path(), "day", "count", Frequency::Weekly).unwrap();
    // 2021-01-01 is a Friday, so the first week ends Sunday 2021-01-03
    assert_eq!(series.timestamps()[0], date(2021, 1, 3));
    assert_eq!(series.values()[0], 5.0);
    assert_eq!(*series.values().last().unwrap(), 1.0);
    assert_eq!(series.len(), 7);
}

#[test]
fn test_missing_column_is_schema_error() {
    let file = csv_file(&["date,amount", "2021-01-05,3"]);

    let err = DataLoader::from_csv(file.path(), "date", "value", Frequency::MonthStart).unwrap_err();
    assert!(matches!(err, BenchError::Schema(_)));
    assert!(err.to_string().contains("value"));
    assert!(err.is_fatal());
}

#[test]
fn test_bad_date_is_data_quality_error() {
    let file = csv_file(&["date,value", "2021-01-05,3", "next tuesday,4"]);

    let err = DataLoader::from_csv(file.path(), "date", "value", Frequency::MonthStart).unwrap_err();
    assert!(matches!(err, BenchError::DataQuality(_)));
}

#[test]
fn test_bad_value_is_data_quality_error() {
    let file = csv_file(&["date,value", "2021-01-05,three"]);

    let err = DataLoader::from_csv(file.path(), "date", "value", Frequency::MonthStart).unwrap_err();
    assert!(matches!(err, BenchError::DataQuality(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = DataLoader::from_csv(
        "/nonexistent/input.csv",
        "date",
        "value",
        Frequency::MonthStart,
    )
    .unwrap_err();
    assert!(matches!(err, BenchError::Io(_)));
}

#[test]
fn test_empty_records_give_empty_series() {
    let series = DataLoader::aggregate(&[], Frequency::MonthStart, "value");
    assert!(series.is_empty());
}

#[test]
fn test_irregular_index_is_rejected() {
    let result = TimeSeries::new(
        "v",
        Frequency::MonthStart,
        vec![date(2021, 1, 1), date(2021, 3, 1)],
        vec![1.0, 2.0],
    );
    assert!(matches!(result, Err(BenchError::DataQuality(_))));
}

#[test]
fn test_frequency_aliases() {
    assert_eq!("MS".parse::<Frequency>().unwrap(), Frequency::MonthStart);
    assert_eq!("w-sun".parse::<Frequency>().unwrap(), Frequency::Weekly);
    assert_eq!("AS".parse::<Frequency>().unwrap(), Frequency::YearStart);
    assert!(matches!(
        "fortnightly".parse::<Frequency>(),
        Err(BenchError::Configuration(_))
    ));
}
