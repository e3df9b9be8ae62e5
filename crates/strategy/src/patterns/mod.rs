pub mod failed_breakout;
pub mod range_break;
pub mod second_chance;

pub use failed_breakout::FailedBreakout;
pub use range_break::RangeBreak;
pub use second_chance::SecondChanceScalp;

use common::Candle;

/// The trailing `lookback` candles of `window`, or `None` if it is too short.
pub(crate) fn tail(window: &[Candle], lookback: usize) -> Option<&[Candle]> {
    if lookback == 0 || window.len() < lookback {
        return None;
    }
    Some(&window[window.len() - lookback..])
}

/// Highest high over a range. Callers pass non-empty ranges.
pub(crate) fn resistance(range: &[Candle]) -> f64 {
    range.iter().map(Candle::high).fold(f64::NEG_INFINITY, f64::max)
}

/// Lowest low over a range. Callers pass non-empty ranges.
pub(crate) fn support(range: &[Candle]) -> f64 {
    range.iter().map(Candle::low).fold(f64::INFINITY, f64::min)
}

pub(crate) fn average_volume(range: &[Candle]) -> f64 {
    if range.is_empty() {
        return 0.0;
    }
    range.iter().map(|c| c.volume() as f64).sum::<f64>() / range.len() as f64
}


#[cfg(test)]
mod tests {
    use super::fixtures::bar;
    use super::*;

    #[test]
    fn levels_over_range() {
        let range = vec![
            bar(0, 100.0, 103.0, 98.0, 101.0, 10),
            bar(1, 101.0, 105.0, 99.0, 104.0, 20),
            bar(2, 104.0, 104.5, 97.0, 98.0, 30),
        ];
        assert_eq!(resistance(&range), 105.0);
        assert_eq!(support(&range), 97.0);
        assert_eq!(average_volume(&range), 20.0);
    }

    #[test]
    fn tail_requires_full_lookback() {
        let window = vec![bar(0, 1.0, 1.0, 1.0, 1.0, 1); 3];
        assert!(tail(&window, 4).is_none());
        assert!(tail(&window, 0).is_none());
        assert_eq!(tail(&window, 2).map(<[Candle]>::len), Some(2));
    }
}
