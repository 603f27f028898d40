//! Execution stage: pops signals, materializes orders with a fresh monotonic id and a
//! current monotonic-clock timestamp, and (notionally) emits them downstream.
//!
//! Sending the order over an outbound channel is stubbed, as in the source (§4.5) — this
//! stage logs and counts the order instead.

use crate::ring::Consumer;
use crate::wire::{Order, Side, Signal, SignalKind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Instant;
use tracing::info;

/// Build an `Order` from a `Signal`, drawing a fresh id from `order_id_counter`.
///
/// `order_id_counter` is owned by the `Controller` and shared across calls (never a
/// `static`), per the re-architecture note in §9.
pub fn materialize(signal: &Signal, order_id_counter: &AtomicU64, epoch: Instant) -> Order {
    let side = match signal.kind {
        SignalKind::Buy => Side::Buy,
        SignalKind::Sell => Side::Sell,
        SignalKind::Hold => unreachable!("HOLD signals are never enqueued (§3.2 invariant)"),
    };

    Order {
        order_id: order_id_counter.fetch_add(1, Ordering::Relaxed),
        symbol: signal.symbol,
        side,
        price: signal.price,
        quantity: signal.quantity,
        timestamp_ns: epoch.elapsed().as_nanos() as u64,
    }
}

/// Drain `signals` until `running` clears, materializing and logging each order.
pub fn run<const M: usize>(
    signals: Consumer<Signal, M>,
    running: &AtomicBool,
    order_id_counter: &AtomicU64,
    orders_sent: &AtomicU64,
) {
    let epoch = Instant::now();

    while running.load(Ordering::Acquire) {
        match signals.try_pop() {
            Some(signal) => {
                let order = materialize(&signal, order_id_counter, epoch);
                info!(
                    order_id = order.order_id,
                    side = ?order.side,
                    quantity = order.quantity,
                    price = order.price,
                    "executing order"
                );
                orders_sent.fetch_add(1, Ordering::Relaxed);
            }
            None => thread::yield_now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(kind: SignalKind) -> Signal {
        Signal {
            symbol: *b"AAPL\0\0\0\0",
            kind,
            price: 189.94,
            quantity: 100,
            timestamp_ns: 1000,
        }
    }

    #[test]
    fn order_ids_are_monotonic_across_calls() {
        let counter = AtomicU64::new(1);
        let epoch = Instant::now();
        let o1 = materialize(&signal(SignalKind::Buy), &counter, epoch);
        let o2 = materialize(&signal(SignalKind::Sell), &counter, epoch);
        assert!(o1.order_id < o2.order_id);
    }

    #[test]
    fn side_is_derived_from_signal_kind() {
        let counter = AtomicU64::new(1);
        let epoch = Instant::now();
        let buy = materialize(&signal(SignalKind::Buy), &counter, epoch);
        let sell = materialize(&signal(SignalKind::Sell), &counter, epoch);
        assert_eq!(buy.side, Side::Buy);
        assert_eq!(sell.side, Side::Sell);
    }

    #[test]
    fn order_preserves_signal_price_quantity_and_symbol() {
        let counter = AtomicU64::new(1);
        let order = materialize(&signal(SignalKind::Buy), &counter, Instant::now());
        assert_eq!(order.price, 189.94);
        assert_eq!(order.quantity, 100);
        assert_eq!(&order.symbol, b"AAPL\0\0\0\0");
    }
}
