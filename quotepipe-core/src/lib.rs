//! Core real-time trading pipeline: a market-data receiver, a strategy stage, and an
//! execution stage connected by bounded lock-free SPSC rings, orchestrated by a single
//! lifecycle controller (client role), plus a thin synthetic-feed server role.

pub mod config;
pub mod controller;
pub mod feed;
pub mod net;
pub mod perf;
pub mod ring;
pub mod stage;
pub mod wire;

pub use config::Config;
pub use controller::{ClientStats, Controller, CoreError};
pub use feed::{FeedError, MarketFeed};
pub use net::{StreamClient, StreamError, StreamServer};
pub use ring::{ring, Consumer, Producer};
pub use wire::{MarketData, Order, Side, Signal, SignalKind};

/// Capacity of the market-data ring (§3.4) — fixed for the client/server binaries.
pub const MARKET_RING_CAPACITY: usize = 4096;
/// Capacity of the signal ring.
pub const SIGNAL_RING_CAPACITY: usize = 1024;

/// Concrete controller type used by the binaries, pinned to this crate's chosen ring
/// capacities.
pub type DefaultController = Controller<MARKET_RING_CAPACITY, SIGNAL_RING_CAPACITY>;
