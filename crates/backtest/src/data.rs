use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use smc_trade_core::Candle;
use std::path::Path;
use std::str::FromStr;

/// Loads candles from a CSV file with header
/// `time,open,high,low,close,volume` (RFC 3339 timestamps), sorts them
/// chronologically, and validates OHLC bounds.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, a row fails to parse,
/// or a candle violates its bounds.
pub fn load_candles_csv(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open candle file {}", path.display()))?;
    let mut candles = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("read csv row {}", row + 1))?;
        let candle = parse_record(&record)
            .with_context(|| format!("parse csv row {}", row + 1))?;
        candle.validate()?;
        candles.push(candle);
    }

    candles.sort_by_key(|c| c.time);
    tracing::info!(count = candles.len(), file = %path.display(), "loaded candles");
    Ok(candles)
}

fn parse_record(record: &csv::StringRecord) -> Result<Candle> {
    let time: DateTime<Utc> = record
        .get(0)
        .context("missing time column")?
        .parse()
        .context("parse timestamp")?;
    let field = |i: usize, name: &str| -> Result<Decimal> {
        Decimal::from_str(record.get(i).with_context(|| format!("missing {name} column"))?)
            .with_context(|| format!("parse {name}"))
    };

    Ok(Candle {
        time,
        open: field(1, "open")?,
        high: field(2, "high")?,
        low: field(3, "low")?,
        close: field(4, "close")?,
        volume: field(5, "volume")?,
    })
}
