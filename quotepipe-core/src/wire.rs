//! On-wire tick format and the in-process `Signal`/`Order` records derived from it.
//!
//! `MarketData` is the only type that actually touches the network; `Signal` and
//! `Order` never leave the process. All three are plain data, `Copy`, and carry no
//! serde impl — the wire format is a fixed 40-byte layout, not a serialized
//! structure, so encode/decode is hand-written at the one boundary that needs it.

pub const SYMBOL_LEN: usize = 8;
/// `seq_num`(8) + `symbol`(8) + `bid`(8) + `ask`(8) + `timestamp_ns`(8) = 40 bytes.
///
/// §3.1 of the spec states "36 bytes" while its own §6.1 field table (five 8-byte
/// fields) sums to 40; `original_source`'s `#pragma pack(1) struct MarketData` has
/// five `uint64_t`/`double`/`char[8]` members and is genuinely 40 bytes. The field
/// table and the original source agree with each other and with the actual field
/// widths, so 40 is taken as authoritative and the "36" in §3.1 as a typo.
pub const WIRE_SIZE: usize = 40;

/// A single tick: best bid/ask for a symbol at an instant.
///
/// `timestamp_ns` is host-endian nanoseconds; its epoch is whatever the producer
/// chose (the synthetic server in this crate uses an increasing counter, not a
/// wall-clock read — see `SPEC_FULL.md` §9.2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketData {
    pub seq_num: u64,
    pub symbol: [u8; SYMBOL_LEN],
    pub bid: f64,
    pub ask: f64,
    pub timestamp_ns: u64,
}

impl MarketData {
    pub fn new(seq_num: u64, symbol: &str, bid: f64, ask: f64, timestamp_ns: u64) -> Self {
        Self {
            seq_num,
            symbol: pack_symbol(symbol),
            bid,
            ask,
            timestamp_ns,
        }
    }

    pub fn symbol_str(&self) -> String {
        String::from_utf8_lossy(&self.symbol)
            .trim_end_matches('\0')
            .to_string()
    }

    /// Encode to the 40-byte host-endian wire layout (§6.1).
    pub fn encode(&self) -> [u8; WIRE_SIZE] {
        let mut buf = [0u8; WIRE_SIZE];
        buf[0..8].copy_from_slice(&self.seq_num.to_ne_bytes());
        buf[8..16].copy_from_slice(&self.symbol);
        buf[16..24].copy_from_slice(&self.bid.to_ne_bytes());
        buf[24..32].copy_from_slice(&self.ask.to_ne_bytes());
        buf[32..40].copy_from_slice(&self.timestamp_ns.to_ne_bytes());
        buf
    }

    /// Decode from a 40-byte host-endian wire buffer.
    pub fn decode(buf: &[u8; WIRE_SIZE]) -> Self {
        let mut symbol = [0u8; SYMBOL_LEN];
        symbol.copy_from_slice(&buf[8..16]);
        Self {
            seq_num: u64::from_ne_bytes(buf[0..8].try_into().unwrap()),
            symbol,
            bid: f64::from_ne_bytes(buf[16..24].try_into().unwrap()),
            ask: f64::from_ne_bytes(buf[24..32].try_into().unwrap()),
            timestamp_ns: u64::from_ne_bytes(buf[32..40].try_into().unwrap()),
        }
    }
}

fn pack_symbol(symbol: &str) -> [u8; SYMBOL_LEN] {
    let mut out = [0u8; SYMBOL_LEN];
    let bytes = symbol.as_bytes();
    let len = bytes.len().min(SYMBOL_LEN);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

/// Side of the market a `Signal`/`Order` trades on, or the non-actionable case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Buy,
    Sell,
    Hold,
}

/// Side an `Order` executes on — always one of the two actionable `SignalKind`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// Trading directive produced by the strategy stage from one tick.
///
/// Only `Buy`/`Sell` signals are ever enqueued to the signal ring (§3.2); `Hold`
/// exists purely as the return value of the decision rule and is dropped at the
/// strategy stage boundary before anything is pushed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub symbol: [u8; SYMBOL_LEN],
    pub kind: SignalKind,
    pub price: f64,
    pub quantity: u64,
    pub timestamp_ns: u64,
}

/// A materialized order produced by the execution stage from one signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    pub order_id: u64,
    pub symbol: [u8; SYMBOL_LEN],
    pub side: Side,
    pub price: f64,
    pub quantity: u64,
    pub timestamp_ns: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_round_trips_through_wire_format() {
        let tick = MarketData::new(42, "AAPL", 189.90, 189.94, 1_000);
        let decoded = MarketData::decode(&tick.encode());
        assert_eq!(decoded, tick);
    }

    #[test]
    fn short_symbols_are_nul_padded() {
        let tick = MarketData::new(1, "BTC", 1.0, 2.0, 0);
        assert_eq!(&tick.symbol, b"BTC\0\0\0\0\0");
        assert_eq!(tick.symbol_str(), "BTC");
    }

    #[test]
    fn encode_is_exactly_wire_size_bytes() {
        let tick = MarketData::new(1, "AAPL", 1.0, 2.0, 3);
        assert_eq!(tick.encode().len(), WIRE_SIZE);
        assert_eq!(WIRE_SIZE, 40);
    }

    #[test]
    fn timestamp_survives_round_trip_at_full_width() {
        let tick = MarketData::new(7, "GOOG", 100.0, 100.5, u64::MAX);
        let decoded = MarketData::decode(&tick.encode());
        assert_eq!(decoded.timestamp_ns, u64::MAX);
    }
}
