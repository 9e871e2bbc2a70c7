//! Parquet codec for price bars
//!
//! Columns: `Date`, `Open`, `High`, `Low`, `Close`, `Volume`. On read, `Date`
//! may be a timestamp (s/ms/us/ns), a Date32, or a `YYYY-MM-DD` string, and
//! `Volume` may be float or integer.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Date32Array, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
    TimestampMillisecondArray, TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use tempfile::NamedTempFile;

use crate::backtest::types::{PriceBar, PriceSeries};
use crate::error::{BacktestError, Result};

/// Read a bar file into a validated series
pub fn read_bars(path: &Path) -> Result<PriceSeries> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut bars = Vec::new();
    for batch in reader {
        let batch = batch?;
        let dates = timestamp_column(&batch)?;
        let opens = float_column(&batch, "Open")?;
        let highs = float_column(&batch, "High")?;
        let lows = float_column(&batch, "Low")?;
        let closes = float_column(&batch, "Close")?;
        let volumes = float_column(&batch, "Volume")?;

        for i in 0..batch.num_rows() {
            bars.push(PriceBar {
                timestamp: dates[i],
                open: opens[i],
                high: highs[i],
                low: lows[i],
                close: closes[i],
                volume: volumes[i],
            });
        }
    }

    PriceSeries::new(bars)
        .map_err(|e| BacktestError::data(format!("{}: {}", path.display(), e)))
}

/// Write a series through a temp file in the same directory, then rename it
/// over `path`
pub fn write_bars(path: &Path, series: &PriceSeries) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Date", DataType::Timestamp(TimeUnit::Millisecond, None), false),
        Field::new("Open", DataType::Float64, false),
        Field::new("High", DataType::Float64, false),
        Field::new("Low", DataType::Float64, false),
        Field::new("Close", DataType::Float64, false),
        Field::new("Volume", DataType::Float64, false),
    ]));

    let bars = series.bars();
    let values = |f: fn(&PriceBar) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(bars.iter().map(f).collect::<Vec<f64>>()))
    };
    let dates: ArrayRef = Arc::new(TimestampMillisecondArray::from(
        bars.iter().map(|b| b.timestamp.timestamp_millis()).collect::<Vec<i64>>(),
    ));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            dates,
            values(|b| b.open),
            values(|b| b.high),
            values(|b| b.low),
            values(|b| b.close),
            values(|b| b.volume),
        ],
    )?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    let mut writer = ArrowWriter::try_new(tmp.as_file_mut(), schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| BacktestError::data(format!("missing column {}", name)))
}

/// Numeric column as f64; nulls become NaN and are rejected by series validation
fn float_column(batch: &RecordBatch, name: &str) -> Result<Vec<f64>> {
    let col = column(batch, name)?;
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        return Ok((0..arr.len())
            .map(|i| if arr.is_null(i) { f64::NAN } else { arr.value(i) })
            .collect());
    }
    if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        return Ok((0..arr.len())
            .map(|i| if arr.is_null(i) { f64::NAN } else { arr.value(i) as f64 })
            .collect());
    }
    Err(BacktestError::data(format!(
        "column {} has unsupported type {}",
        name,
        col.data_type()
    )))
}

fn timestamp_column(batch: &RecordBatch) -> Result<Vec<DateTime<Utc>>> {
    let col = column(batch, "Date")?;
    let any = col.as_any();

    let values: Vec<Option<DateTime<Utc>>> = match col.data_type() {
        DataType::Timestamp(TimeUnit::Second, _) => any
            .downcast_ref::<TimestampSecondArray>()
            .map(|arr| (0..arr.len()).map(|i| DateTime::from_timestamp(arr.value(i), 0)).collect::<Vec<_>>()),
        DataType::Timestamp(TimeUnit::Millisecond, _) => any
            .downcast_ref::<TimestampMillisecondArray>()
            .map(|arr| (0..arr.len()).map(|i| DateTime::from_timestamp_millis(arr.value(i))).collect::<Vec<_>>()),
        DataType::Timestamp(TimeUnit::Microsecond, _) => any
            .downcast_ref::<TimestampMicrosecondArray>()
            .map(|arr| (0..arr.len()).map(|i| DateTime::from_timestamp_micros(arr.value(i))).collect::<Vec<_>>()),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => any
            .downcast_ref::<TimestampNanosecondArray>()
            .map(|arr| (0..arr.len()).map(|i| from_nanos(arr.value(i))).collect::<Vec<_>>()),
        DataType::Date32 => any.downcast_ref::<Date32Array>().map(|arr| {
            (0..arr.len())
                .map(|i| DateTime::from_timestamp(arr.value(i) as i64 * 86_400, 0))
                .collect::<Vec<_>>()
        }),
        DataType::Utf8 => any.downcast_ref::<StringArray>().map(|arr| {
            (0..arr.len())
                .map(|i| {
                    NaiveDate::parse_from_str(arr.value(i), "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|dt| dt.and_utc())
                })
                .collect::<Vec<_>>()
        }),
        _ => None,
    }
    .ok_or_else(|| BacktestError::data(format!("Date column has unsupported type {}", col.data_type())))?;

    if col.null_count() > 0 {
        return Err(BacktestError::data("Date column contains nulls"));
    }
    values
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| BacktestError::data("Date column contains unparseable values"))
}

fn from_nanos(ns: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ns.div_euclid(1_000_000_000), ns.rem_euclid(1_000_000_000) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::fs;
    use tempfile::tempdir;

    fn sample_series() -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let bars = (0..5)
            .map(|i| PriceBar {
                timestamp: start + Duration::days(i),
                open: 10.0 + i as f64,
                high: 11.0 + i as f64,
                low: 9.0 + i as f64,
                close: 10.5 + i as f64,
                volume: 1_000.0 * (i + 1) as f64,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bars.parquet");
        let series = sample_series();
        write_bars(&path, &series).unwrap();
        assert_eq!(read_bars(&path).unwrap(), series);
        // only the finished file is left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bars.parquet");
        fs::write(&path, b"stale").unwrap();

        let series = sample_series();
        write_bars(&path, &series).unwrap();
        write_bars(&path, &series).unwrap();
        assert_eq!(read_bars(&path).unwrap(), series);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_concurrent_writers_leave_a_readable_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.parquet");
        let series = sample_series();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| write_bars(&path, &series).unwrap());
            }
        });

        assert_eq!(read_bars(&path).unwrap(), series);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_read_string_dates_and_int_volume() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("strings.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("Date", DataType::Utf8, false),
            Field::new("Open", DataType::Float64, false),
            Field::new("High", DataType::Float64, false),
            Field::new("Low", DataType::Float64, false),
            Field::new("Close", DataType::Float64, false),
            Field::new("Volume", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["2024-01-02", "2024-01-03"])),
                Arc::new(Float64Array::from(vec![1.0, 2.0])),
                Arc::new(Float64Array::from(vec![1.5, 2.5])),
                Arc::new(Float64Array::from(vec![0.5, 1.5])),
                Arc::new(Float64Array::from(vec![1.2, 2.2])),
                Arc::new(Int64Array::from(vec![100, 200])),
            ],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let series = read_bars(&path).unwrap();
        assert_eq!(series.closes(), vec![1.2, 2.2]);
        assert_eq!(series.bars()[1].volume, 200.0);
        assert_eq!(series.first().timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = read_bars(&dir.path().join("does-not-exist.parquet")).unwrap_err();
        assert_eq!(err.category(), "io");
    }
}
