use serde::Deserialize;

use common::{Candle, CandleUpdate, Error, Result};

const CANDLE_UPDATE: &str = "candle_update";

/// Decode one text frame from the market-data feed.
///
/// Only `candle_update` messages carry candles; every other message type
/// decodes to an empty list. Each entry of `data` is decoded on its own so a
/// bad symbol does not drop the rest of the batch.
///
/// Returns `Err` only when the frame itself is not a JSON object.
pub fn decode_message(text: &str) -> Result<Vec<Result<CandleUpdate>>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let Some(object) = value.as_object() else {
        return Err(Error::Data("feed message is not a JSON object".into()));
    };

    if object.get("type").and_then(|t| t.as_str()) != Some(CANDLE_UPDATE) {
        return Ok(Vec::new());
    }

    let Some(entries) = object.get("data").and_then(|d| d.as_array()) else {
        return Err(Error::Data("candle_update without a data array".into()));
    };

    Ok(entries.iter().map(decode_entry).collect())
}

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct UpdateEntry {
    symbol: String,
    timestamp: i64,
    #[serde(rename = "1m")]
    bar: Bar,
}

#[derive(Deserialize)]
struct Bar {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

fn decode_entry(entry: &serde_json::Value) -> Result<CandleUpdate> {
    let symbol = entry.get("symbol").and_then(|s| s.as_str()).unwrap_or("?");
    let parsed = UpdateEntry::deserialize(entry)
        .map_err(|e| Error::Data(format!("{symbol}: malformed candle update: {e}")))?;

    let bar = parsed.bar;
    let candle = Candle::new(parsed.timestamp, bar.open, bar.high, bar.low, bar.close, bar.volume)
        .map_err(|e| Error::Data(format!("{}: {e}", parsed.symbol)))?;

    Ok(CandleUpdate {
        symbol: parsed.symbol,
        candle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = r#"{
        "type": "candle_update",
        "data": [
            {"symbol": "NIFTY", "timestamp": 1704186900000,
             "1m": {"open": 21700.5, "high": 21710.0, "low": 21695.0, "close": 21705.25, "volume": 12000, "vwap": 21705.25},
             "5m": {"open": 21690.0, "high": 21712.0, "low": 21688.0, "close": 21705.25, "volume": 50000},
             "pcr": 1.1},
            {"symbol": "BANKNIFTY", "timestamp": 1704186900000,
             "1m": {"open": 47800, "high": 47850, "low": 47790, "close": 47840, "volume": 8000}}
        ]
    }"#;

    #[test]
    fn decodes_every_symbol_in_a_batch() {
        let updates: Vec<CandleUpdate> = decode_message(BATCH)
            .unwrap()
            .into_iter()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].symbol, "NIFTY");
        assert_eq!(updates[0].candle.close(), 21705.25);
        assert_eq!(updates[0].candle.volume(), 12000);
        assert_eq!(updates[1].symbol, "BANKNIFTY");
        assert_eq!(updates[1].candle.high(), 47850.0);
    }

    #[test]
    fn other_message_types_are_ignored() {
        let decoded = decode_message(r#"{"type": "market_breadth", "timestamp": 1, "data": {"advance": 10}}"#).unwrap();
        assert!(decoded.is_empty());
        assert!(decode_message(r#"{"data": []}"#).unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_a_json_error() {
        assert!(matches!(decode_message("{not json"), Err(Error::Json(_))));
    }

    #[test]
    fn non_object_frame_is_a_data_error() {
        assert!(matches!(decode_message("[1, 2, 3]"), Err(Error::Data(_))));
    }

    #[test]
    fn bad_entry_does_not_drop_the_batch() {
        let text = r#"{"type": "candle_update", "data": [
            {"symbol": "BAD", "timestamp": 1, "1m": {"open": 100, "high": 99, "low": 95, "close": 98, "volume": 1}},
            {"symbol": "HALF", "timestamp": 1, "1m": {"open": 100}},
            {"symbol": "GOOD", "timestamp": 1, "1m": {"open": 100, "high": 101, "low": 99, "close": 100.5, "volume": 1}}
        ]}"#;
        let decoded = decode_message(text).unwrap();
        assert_eq!(decoded.len(), 3);

        match &decoded[0] {
            Err(Error::Data(msg)) => assert!(msg.starts_with("BAD:"), "{msg}"),
            other => panic!("expected Data error, got {other:?}"),
        }
        assert!(matches!(&decoded[1], Err(Error::Data(msg)) if msg.starts_with("HALF:")));
        assert_eq!(decoded[2].as_ref().unwrap().symbol, "GOOD");
    }

    #[test]
    fn candle_update_without_data_is_a_data_error() {
        assert!(matches!(decode_message(r#"{"type": "candle_update"}"#), Err(Error::Data(_))));
    }
}
