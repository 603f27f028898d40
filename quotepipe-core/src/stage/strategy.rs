//! Strategy stage: pops ticks from the market-data ring, applies the spread/mid-price
//! decision rule, and pushes BUY/SELL signals to the signal ring. HOLD is dropped here.
//!
//! The thresholds below are placeholder policy constants preserved verbatim from the
//! source for test parity (§4.4, §9 decision 4) — they are not wired to `TradingConfig`.

use crate::ring::{Consumer, Producer};
use crate::wire::{MarketData, Signal, SignalKind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use tracing::warn;

const TIGHT_SPREAD_CEILING: f64 = 0.05;
const BUY_BELOW_MID: f64 = 190.0;
const SELL_ABOVE_MID: f64 = 190.0005;
const FIXED_QUANTITY: u64 = 100;

/// Apply the decision rule to one tick. Returns `None` for both the wide-spread and the
/// in-dead-band cases (both are HOLD, dropped here rather than further downstream).
pub fn decide(tick: &MarketData) -> Option<Signal> {
    let spread = tick.ask - tick.bid;
    let mid = (tick.ask + tick.bid) / 2.0;

    if spread >= TIGHT_SPREAD_CEILING {
        return None;
    }

    let (kind, price) = if mid < BUY_BELOW_MID {
        (SignalKind::Buy, tick.ask)
    } else if mid > SELL_ABOVE_MID {
        (SignalKind::Sell, tick.bid)
    } else {
        return None;
    };

    Some(Signal {
        symbol: tick.symbol,
        kind,
        price,
        quantity: FIXED_QUANTITY,
        timestamp_ns: tick.timestamp_ns,
    })
}

/// Drain `ticks` and feed `signals` until `running` clears. Drops a signal (with a warning)
/// if the signal ring is full rather than blocking — a deliberate bounded-loss policy at
/// this boundary (§4.1 tie-breaks).
pub fn run<const N: usize, const M: usize>(
    ticks: Consumer<MarketData, N>,
    signals: Producer<Signal, M>,
    running: &AtomicBool,
    signals_generated: &AtomicU64,
) {
    while running.load(Ordering::Acquire) {
        match ticks.try_pop() {
            Some(tick) => {
                if let Some(signal) = decide(&tick) {
                    if signals.try_push(signal) {
                        signals_generated.fetch_add(1, Ordering::Relaxed);
                    } else {
                        warn!(symbol = %signal_symbol_str(&signal), "signal queue full, dropping signal");
                    }
                }
            }
            None => thread::yield_now(),
        }
    }
}

fn signal_symbol_str(signal: &Signal) -> String {
    String::from_utf8_lossy(&signal.symbol)
        .trim_end_matches('\0')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(bid: f64, ask: f64) -> MarketData {
        MarketData::new(1, "AAPL", bid, ask, 1000)
    }

    #[test]
    fn tight_spread_below_mid_buys_at_ask() {
        let signal = decide(&tick(189.90, 189.94)).unwrap();
        assert_eq!(signal.kind, SignalKind::Buy);
        assert_eq!(signal.price, 189.94);
        assert_eq!(signal.quantity, 100);
    }

    #[test]
    fn tight_spread_above_mid_sells_at_bid() {
        let signal = decide(&tick(190.00, 190.02)).unwrap();
        assert_eq!(signal.kind, SignalKind::Sell);
        assert_eq!(signal.price, 190.00);
    }

    #[test]
    fn dead_band_holds() {
        assert!(decide(&tick(190.0000, 190.0004)).is_none());
    }

    #[test]
    fn wide_spread_holds_regardless_of_mid() {
        assert!(decide(&tick(189.00, 189.10)).is_none());
    }

    #[test]
    fn spread_boundary_is_strict_ceiling_exclusive() {
        // spread == 0.05 exactly must not emit (rule is strict `<` on the ceiling check,
        // i.e. `>=` is the drop condition).
        assert!(decide(&tick(190.00, 190.05)).is_none());
    }

    #[test]
    fn mid_boundary_at_buy_threshold_is_not_buy() {
        // mid == 190.0 must not trigger BUY (strict `<`).
        assert!(decide(&tick(189.999, 190.001)).is_none());
    }

    #[test]
    fn mid_boundary_at_sell_threshold_is_not_sell() {
        // mid == 190.0005 must not trigger SELL (strict `>`).
        let t = tick(190.0000, 190.0010);
        assert!(decide(&t).is_none());
    }
}
