//! Market Feed: owns the client stream endpoint, frames ticks off the wire, and pushes
//! them onto the market-data ring with automatic reconnection under exponential backoff.

use crate::net::{StreamClient, StreamError};
use crate::ring::Producer;
use crate::wire::{MarketData, WIRE_SIZE};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Failures the feed itself reports outward. Everything inside `receive_loop` is handled
/// internally — this type exists for `initialize`/`stop`, which the controller can fail on.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("market server not online: {0}")]
    ServerNotOnline(#[source] StreamError),
}

/// Fixed non-jittered reconnect schedule: attempt `k` (1-indexed) sleeps `100 * 2^k` ms.
const RECONNECT_DELAYS_MS: [u64; 5] = [200, 400, 800, 1600, 3200];

pub struct MarketFeed<const N: usize> {
    ip: String,
    port: u16,
    client: Option<StreamClient>,
    queue: Producer<MarketData, N>,
    ticks_received: Arc<AtomicU64>,
    queue_full_count: Arc<AtomicU64>,
}

impl<const N: usize> MarketFeed<N> {
    pub fn new(ip: impl Into<String>, port: u16, queue: Producer<MarketData, N>) -> Self {
        Self {
            ip: ip.into(),
            port,
            client: None,
            queue,
            ticks_received: Arc::new(AtomicU64::new(0)),
            queue_full_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Construct the client endpoint and attempt one immediate connect.
    pub fn initialize(&mut self) -> Result<(), FeedError> {
        match StreamClient::connect(&self.ip, self.port) {
            Ok(client) => {
                self.client = Some(client);
                Ok(())
            }
            Err(e) => {
                self.client = None;
                Err(FeedError::ServerNotOnline(e))
            }
        }
    }

    /// Drop the endpoint, returning the feed to the uninitialized state.
    pub fn stop(&mut self) {
        self.client = None;
    }

    pub fn ticks_received(&self) -> u64 {
        self.ticks_received.load(Ordering::Relaxed)
    }

    pub fn queue_full_count(&self) -> u64 {
        self.queue_full_count.load(Ordering::Relaxed)
    }

    /// A clone of the shared counter, for callers (the controller) that need to read it
    /// after the feed itself has been moved into its own thread.
    pub fn ticks_received_handle(&self) -> Arc<AtomicU64> {
        self.ticks_received.clone()
    }

    pub fn queue_full_count_handle(&self) -> Arc<AtomicU64> {
        self.queue_full_count.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.client.is_some()
    }

    /// Run until `running` clears or reconnection is exhausted. Never fails outward — on a
    /// fatal condition it clears `running` itself and returns (§4.3).
    pub fn receive_loop(&mut self, running: &AtomicBool) {
        let mut buf = [0u8; WIRE_SIZE];

        while running.load(Ordering::Acquire) {
            if self.client.is_none() && !self.reconnect(running) {
                info!("market feed exhausted reconnect attempts, stopping pipeline");
                running.store(false, Ordering::Release);
                return;
            }

            let n = match self.client.as_mut().unwrap().recv(&mut buf) {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %e, "market feed recv failed, will reconnect");
                    self.client = None;
                    continue;
                }
            };

            if n != WIRE_SIZE {
                if n > 0 {
                    warn!(bytes = n, expected = WIRE_SIZE, "short read, discarding partial tick");
                } else {
                    // Clean close by the peer.
                    self.client = None;
                }
                continue;
            }

            let tick = MarketData::decode(&buf);
            self.ticks_received.fetch_add(1, Ordering::Relaxed);
            debug!(seq_num = tick.seq_num, symbol = %tick.symbol_str(), "tick received");

            while !self.queue.try_push(tick) {
                self.queue_full_count.fetch_add(1, Ordering::Relaxed);
                if !running.load(Ordering::Acquire) {
                    return;
                }
                thread::yield_now();
            }
        }
    }

    /// Drop the stale endpoint and retry connect up to 5 times with a fixed backoff
    /// schedule (§4.3.1). Returns `true` on success, `false` if exhausted.
    fn reconnect(&mut self, running: &AtomicBool) -> bool {
        self.client = None;

        for (k, delay_ms) in RECONNECT_DELAYS_MS.iter().enumerate() {
            if !running.load(Ordering::Acquire) {
                return false;
            }

            match StreamClient::connect(&self.ip, self.port) {
                Ok(client) => {
                    info!(attempt = k + 1, "market feed reconnected");
                    self.client = Some(client);
                    return true;
                }
                Err(e) => {
                    error!(attempt = k + 1, error = %e, "reconnect attempt failed");
                    if k + 1 < RECONNECT_DELAYS_MS.len() {
                        thread::sleep(Duration::from_millis(*delay_ms));
                    }
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::ring;
    use std::net::TcpListener;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn initialize_fails_when_server_not_online() {
        let (producer, _consumer) = ring::<MarketData, 4>();
        let mut feed = MarketFeed::<4>::new("127.0.0.1", 1, producer);
        assert!(feed.initialize().is_err());
        assert!(!feed.is_initialized());
    }

    #[test]
    fn receive_loop_decodes_ticks_and_stops_on_flag_clear() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let tick = MarketData::new(1, "AAPL", 189.90, 189.94, 1000);
            std::io::Write::write_all(&mut stream, &tick.encode()).unwrap();
            // Keep the stream open briefly so the client's blocking recv for a second
            // record has something to observe (a clean close) before we drop it.
            thread::sleep(Duration::from_millis(50));
        });

        let (producer, consumer) = ring::<MarketData, 4>();
        let mut feed = MarketFeed::<4>::new(addr.ip().to_string(), addr.port(), producer);
        feed.initialize().unwrap();

        let running = AtomicBool::new(true);
        thread::scope(|scope| {
            scope.spawn(|| {
                feed.receive_loop(&running);
            });
            thread::sleep(Duration::from_millis(150));
            running.store(false, Ordering::Release);
        });
        server.join().unwrap();

        let tick = consumer.try_pop().expect("tick should have been pushed");
        assert_eq!(tick.seq_num, 1);
        assert_eq!(tick.symbol_str(), "AAPL");
    }
}
