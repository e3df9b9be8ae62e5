//! Historical OHLCV loader.
//!
//! Reads `timestamp,open,high,low,close,volume` rows. A header row, `#`
//! comment lines, blank lines and trailing `# ...` comments are tolerated.
//! Timestamps are either epoch milliseconds or `YYYY-MM-DD HH:MM:SS` in UTC.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use common::{Candle, Error, Result};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const COLUMNS: usize = 6;

/// Load candles from a CSV file. I/O failures propagate as [`Error::Io`].
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let candles = parse_csv(file)?;
    info!(path = %path.display(), candles = candles.len(), "Loaded historical data");
    Ok(candles)
}

/// Parse candles from any CSV source, in file order.
///
/// Rows whose timestamp does not advance past the previous row are dropped
/// with a warning. Malformed rows fail the whole load with [`Error::Data`].
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Candle>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut candles: Vec<Candle> = Vec::new();
    let mut first = true;

    for result in rdr.records() {
        let record = result.map_err(csv_error)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let fields = strip_comment(&record);

        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }

        if std::mem::take(&mut first) && is_header(&fields) {
            continue;
        }

        let candle = parse_row(&fields).map_err(|e| Error::Data(format!("line {line}: {e}")))?;

        if let Some(prev) = candles.last() {
            if candle.timestamp() <= prev.timestamp() {
                warn!(line, timestamp = candle.timestamp(), "Skipping out-of-order candle");
                continue;
            }
        }
        candles.push(candle);
    }

    Ok(candles)
}

/// Fields up to the first one containing `#`, with the comment cut off.
fn strip_comment(record: &csv::StringRecord) -> Vec<&str> {
    let mut fields = Vec::with_capacity(record.len());
    for field in record.iter() {
        match field.split_once('#') {
            Some((before, _)) => {
                fields.push(before.trim());
                break;
            }
            None => fields.push(field),
        }
    }
    fields
}

fn is_header(fields: &[&str]) -> bool {
    fields
        .first()
        .is_some_and(|f| parse_timestamp(f).is_err() && f.chars().any(|c| c.is_ascii_alphabetic()))
}

fn parse_row(fields: &[&str]) -> std::result::Result<Candle, String> {
    if fields.len() < COLUMNS {
        return Err(format!("expected {COLUMNS} columns, found {}", fields.len()));
    }
    let timestamp = parse_timestamp(fields[0])?;
    let open = parse_price("open", fields[1])?;
    let high = parse_price("high", fields[2])?;
    let low = parse_price("low", fields[3])?;
    let close = parse_price("close", fields[4])?;
    let volume: u64 = fields[5]
        .parse()
        .map_err(|_| format!("invalid volume '{}'", fields[5]))?;

    Candle::new(timestamp, open, high, low, close, volume).map_err(|e| e.to_string())
}

fn parse_price(column: &str, raw: &str) -> std::result::Result<f64, String> {
    raw.parse().map_err(|_| format!("invalid {column} '{raw}'"))
}

/// Epoch milliseconds, or a UTC `YYYY-MM-DD HH:MM:SS` datetime.
fn parse_timestamp(raw: &str) -> std::result::Result<i64, String> {
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(ms);
    }
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
        .map(|dt| dt.and_utc().timestamp_millis())
        .map_err(|_| format!("invalid timestamp '{raw}'"))
}

fn csv_error(e: csv::Error) -> Error {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => Error::Io(io),
        other => Error::Data(format!("{other:?}")),
    }
}
