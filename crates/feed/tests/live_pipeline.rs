use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use common::{Candle, CandleUpdate, Position, TradeSignal};
use feed::{FeedStream, SignalSession};
use policy::{PolicyEngine, RiskConfig};
use strategy::StrategyRegistry;

fn update(symbol: &str, ts: i64, open: f64, high: f64, low: f64, close: f64, volume: u64) -> CandleUpdate {
    CandleUpdate {
        symbol: symbol.into(),
        candle: Candle::new(ts, open, high, low, close, volume).unwrap(),
    }
}

fn frame(symbol: &str, ts: i64, open: f64, high: f64, low: f64, close: f64, volume: u64) -> String {
    serde_json::json!({
        "type": "candle_update",
        "data": [{
            "symbol": symbol,
            "timestamp": ts,
            "1m": {"open": open, "high": high, "low": low, "close": close, "volume": volume}
        }]
    })
    .to_string()
}

#[tokio::test]
async fn session_emits_signal_and_stops_when_feed_ends() {
    let session = SignalSession::new(PolicyEngine::reference(), 50).unwrap();
    let (update_tx, update_rx) = mpsc::channel(64);
    let (signal_tx, mut signal_rx) = mpsc::channel::<TradeSignal>(8);
    let handle = tokio::spawn(session.run(update_rx, signal_tx));

    for ts in 0..20 {
        update_tx.send(update("RELIANCE", ts, 100.0, 105.0, 95.0, 100.0, 1000)).await.unwrap();
    }
    update_tx.send(update("RELIANCE", 20, 95.0, 96.0, 93.0, 94.0, 3000)).await.unwrap();
    drop(update_tx);

    let signal = signal_rx.recv().await.expect("signal expected");
    assert_eq!(signal.symbol.as_deref(), Some("RELIANCE"));
    assert_eq!(signal.strategy_name, "Range Break");
    assert_eq!(signal.position, Position::Short);
    assert_eq!(signal.entry_price, 94.0);
    assert_eq!(signal.stop_loss, 95.0);
    assert_eq!(signal.take_profit, 84.0);

    handle.await.unwrap();
    assert!(signal_rx.recv().await.is_none());
}

#[test]
fn session_uses_configured_sizing() {
    let policy = PolicyEngine::new(StrategyRegistry::reference(), RiskConfig::new(50_000.0, 0.02).unwrap());
    let mut session = SignalSession::new(policy, 50).unwrap();

    for ts in 0..20 {
        assert!(session.on_update(update("TCS", ts, 100.0, 105.0, 95.0, 100.0, 1000)).is_none());
    }
    let signal = session
        .on_update(update("TCS", 20, 105.0, 107.0, 104.0, 106.0, 2500))
        .expect("signal expected");
    // 1 000 at risk over a 1-point stop.
    assert_eq!(signal.position_size, 1000.0);
}

#[tokio::test]
async fn session_stops_when_signal_receiver_is_dropped() {
    let session = SignalSession::new(PolicyEngine::reference(), 50).unwrap();
    let (update_tx, update_rx) = mpsc::channel(64);
    let (signal_tx, signal_rx) = mpsc::channel::<TradeSignal>(1);
    drop(signal_rx);
    let handle = tokio::spawn(session.run(update_rx, signal_tx));

    for ts in 0..20 {
        update_tx.send(update("INFY", ts, 100.0, 105.0, 95.0, 100.0, 1000)).await.unwrap();
    }
    update_tx.send(update("INFY", 20, 105.0, 107.0, 104.0, 106.0, 2500)).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("session did not stop")
        .unwrap();
}

#[tokio::test]
async fn feed_forwards_candles_from_a_websocket_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
        ws.send(Message::Text(r#"{"type": "heartbeat"}"#.into())).await.unwrap();
        ws.send(Message::Text(frame("NIFTY", 60_000, 100.0, 101.0, 99.0, 100.5, 1200)))
            .await
            .unwrap();
        ws.send(Message::Text(frame("NIFTY", 120_000, 100.5, 100.0, 99.0, 99.5, 900)))
            .await
            .unwrap();
        ws.send(Message::Text(frame("NIFTY", 180_000, 99.5, 100.2, 99.1, 100.0, 700)))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
    });

    let (update_tx, mut update_rx) = mpsc::channel(16);
    let feed = tokio::spawn(FeedStream::new(format!("ws://{addr}"), update_tx).run());

    let first = tokio::time::timeout(Duration::from_secs(5), update_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.symbol, "NIFTY");
    assert_eq!(first.candle.timestamp(), 60_000);
    assert_eq!(first.candle.close(), 100.5);

    // The second frame has high below open and is dropped.
    let second = tokio::time::timeout(Duration::from_secs(5), update_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.candle.timestamp(), 180_000);

    drop(update_rx);
    tokio::time::timeout(Duration::from_secs(10), feed)
        .await
        .expect("feed did not stop")
        .unwrap();
}
