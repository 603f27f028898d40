//! Core Controller: single owner of the rings, the Market Feed, the stream endpoints, and
//! the three stage threads. Orchestrates initialization, lifecycle transitions, CPU
//! pinning, and statistics for both the client and server roles (§4.6).

use crate::feed::{FeedError, MarketFeed};
use crate::net::{StreamError, StreamServer};
use crate::ring::{ring, Consumer, Producer};
use crate::stage::{execution, strategy};
use crate::wire::{MarketData, Signal};
use crate::{config::Config, perf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("market feed not online: {0}")]
    ServerNotOnline(#[from] FeedError),
    #[error("failed to start market server: {0}")]
    InitServerFail(#[from] StreamError),
    #[error("core is in an invalid state: {0}")]
    InvalidState(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClientStats {
    pub ticks_received: u64,
    pub queue_full_count: u64,
    pub signals_generated: u64,
    pub orders_sent: u64,
}

/// `N` is the market-data ring's capacity, `M` the signal ring's — both must be powers of
/// two (§3.4).
pub struct Controller<const N: usize, const M: usize> {
    config: Config,

    feed: Option<MarketFeed<N>>,
    market_consumer: Option<Consumer<MarketData, N>>,
    signal_producer: Option<Producer<Signal, M>>,
    signal_consumer: Option<Consumer<Signal, M>>,
    server: Option<StreamServer>,

    server_started: AtomicBool,
    client_started: AtomicBool,
    client_running: Arc<AtomicBool>,
    client_stopping: AtomicBool,
    client_stopped: AtomicBool,

    network_thread: Option<JoinHandle<()>>,
    strategy_thread: Option<JoinHandle<()>>,
    execution_thread: Option<JoinHandle<()>>,

    ticks_received: Option<Arc<AtomicU64>>,
    queue_full_count: Option<Arc<AtomicU64>>,
    signals_generated: Arc<AtomicU64>,
    orders_sent: Arc<AtomicU64>,
    order_id_counter: Arc<AtomicU64>,
}

impl<const N: usize, const M: usize> Controller<N, M> {
    pub fn new(config: Config) -> Self {
        let (market_producer, market_consumer) = ring::<MarketData, N>();
        let (signal_producer, signal_consumer) = ring::<Signal, M>();
        let feed = MarketFeed::new(
            config.servers.market.ip.clone(),
            config.servers.market.port,
            market_producer,
        );

        Self {
            config,
            feed: Some(feed),
            market_consumer: Some(market_consumer),
            signal_producer: Some(signal_producer),
            signal_consumer: Some(signal_consumer),
            server: None,
            server_started: AtomicBool::new(false),
            client_started: AtomicBool::new(false),
            client_running: Arc::new(AtomicBool::new(false)),
            client_stopping: AtomicBool::new(false),
            client_stopped: AtomicBool::new(false),
            network_thread: None,
            strategy_thread: None,
            execution_thread: None,
            ticks_received: None,
            queue_full_count: None,
            signals_generated: Arc::new(AtomicU64::new(0)),
            orders_sent: Arc::new(AtomicU64::new(0)),
            order_id_counter: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn is_client_running(&self) -> bool {
        self.client_running.load(Ordering::Acquire)
    }

    // --- client role ---------------------------------------------------

    pub fn initialize_client(&mut self) -> Result<(), CoreError> {
        if self.client_started.load(Ordering::Acquire) {
            warn!("market feed already initialized");
            return Ok(());
        }

        let feed = self
            .feed
            .as_mut()
            .ok_or_else(|| CoreError::InvalidState("market feed missing".to_string()))?;
        feed.initialize()?;

        self.client_started.store(true, Ordering::Release);
        info!("market feed initialized and connected");
        Ok(())
    }

    /// Idempotent start: spawns the network, strategy, and execution threads and
    /// attempts best-effort CPU pinning (§4.6).
    pub fn work_client(&mut self) -> Result<(), CoreError> {
        if self.is_client_running() {
            warn!("client already running");
            return Ok(());
        }

        if !self.client_started.load(Ordering::Acquire) {
            self.initialize_client()?;
        }

        self.client_running.store(true, Ordering::Release);
        self.client_stopping.store(false, Ordering::Release);
        self.client_stopped.store(false, Ordering::Release);
        info!("starting multithreaded pipeline...");

        let mut feed = self
            .feed
            .take()
            .ok_or_else(|| CoreError::InvalidState("market feed missing".to_string()))?;
        self.ticks_received = Some(feed.ticks_received_handle());
        self.queue_full_count = Some(feed.queue_full_count_handle());

        let market_consumer = self
            .market_consumer
            .take()
            .ok_or_else(|| CoreError::InvalidState("market ring consumer already taken".to_string()))?;
        let signal_producer = self
            .signal_producer
            .take()
            .ok_or_else(|| CoreError::InvalidState("signal ring producer already taken".to_string()))?;
        let signal_consumer = self
            .signal_consumer
            .take()
            .ok_or_else(|| CoreError::InvalidState("signal ring consumer already taken".to_string()))?;

        let cpu_ids = self.config.pipeline_cpu_affinity();

        let running = self.client_running.clone();
        let network_cpu = cpu_ids[0];
        self.network_thread = Some(thread::spawn(move || {
            pin_best_effort(network_cpu);
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                feed.receive_loop(&running);
            }));
            if outcome.is_err() {
                error!("network thread panicked, stopping pipeline");
                running.store(false, Ordering::Release);
            }
            info!("network thread exiting");
        }));
        info!("started network thread");

        let running = self.client_running.clone();
        let signals_generated = self.signals_generated.clone();
        let strategy_cpu = cpu_ids[1];
        self.strategy_thread = Some(thread::spawn(move || {
            pin_best_effort(strategy_cpu);
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                strategy::run(market_consumer, signal_producer, &running, &signals_generated);
            }));
            if outcome.is_err() {
                error!("strategy thread panicked, stopping pipeline");
                running.store(false, Ordering::Release);
            }
            info!("strategy thread exiting");
        }));
        info!("started strategy thread");

        let running = self.client_running.clone();
        let orders_sent = self.orders_sent.clone();
        let order_id_counter = self.order_id_counter.clone();
        let execution_cpu = cpu_ids[2];
        self.execution_thread = Some(thread::spawn(move || {
            pin_best_effort(execution_cpu);
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                execution::run(signal_consumer, &running, &order_id_counter, &orders_sent);
            }));
            if outcome.is_err() {
                error!("execution thread panicked, stopping pipeline");
                running.store(false, Ordering::Release);
            }
            info!("execution thread exiting");
        }));
        info!("started execution thread");

        Ok(())
    }

    /// Idempotent stop: requests cooperative cancellation, joins all three stage threads,
    /// and prints final statistics.
    pub fn stop_client(&mut self) {
        if self.client_stopped.load(Ordering::Acquire) {
            warn!("client already stopped");
            return;
        }

        info!("stopping client...");
        self.client_stopping.store(true, Ordering::Release);
        self.client_running.store(false, Ordering::Release);

        if let Some(handle) = self.network_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.strategy_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.execution_thread.take() {
            let _ = handle.join();
        }

        self.client_stopped.store(true, Ordering::Release);
        self.print_client_stats();
        info!("client stopped");
    }

    pub fn client_stats(&self) -> ClientStats {
        ClientStats {
            ticks_received: self
                .ticks_received
                .as_ref()
                .map(|a| a.load(Ordering::Relaxed))
                .unwrap_or(0),
            queue_full_count: self
                .queue_full_count
                .as_ref()
                .map(|a| a.load(Ordering::Relaxed))
                .unwrap_or(0),
            signals_generated: self.signals_generated.load(Ordering::Relaxed),
            orders_sent: self.orders_sent.load(Ordering::Relaxed),
        }
    }

    fn print_client_stats(&self) {
        let stats = self.client_stats();
        info!(
            ticks_received = stats.ticks_received,
            queue_full_events = stats.queue_full_count,
            signals_generated = stats.signals_generated,
            orders_sent = stats.orders_sent,
            "core statistics"
        );
    }

    // --- server role -----------------------------------------------------

    pub fn initialize_server(&mut self) -> Result<(), CoreError> {
        if self.server_started.load(Ordering::Acquire) {
            warn!("tcp server already initialized");
            return Ok(());
        }

        let server = StreamServer::start(&self.config.servers.market.ip, self.config.servers.market.port)?;
        self.server = Some(server);
        self.server_started.store(true, Ordering::Release);
        Ok(())
    }

    /// Accepts one client at a time and streams a synthetic tick at ~1 Hz (§4.6).
    /// `shutdown` is polled between clients (and between ticks within a client session) so
    /// a signal-driven shutdown can interrupt it — an addition over the source's infinite
    /// loop (§9, R1).
    pub fn work_server(&mut self, shutdown: &AtomicBool) -> Result<(), CoreError> {
        if !self.server_started.load(Ordering::Acquire) {
            self.initialize_server()?;
        }

        let server = self
            .server
            .as_ref()
            .ok_or_else(|| CoreError::InvalidState("tcp server missing after initialization".to_string()))?;

        info!(
            ip = %self.config.servers.market.ip,
            port = self.config.servers.market.port,
            "server listening"
        );

        let mut seq_num: u64 = 0;
        while !shutdown.load(Ordering::Acquire) {
            let mut client = match server.accept_client() {
                Ok(c) => c,
                Err(e) => {
                    error!(error = %e, "could not accept client");
                    continue;
                }
            };
            info!("accepted client connection");

            loop {
                if shutdown.load(Ordering::Acquire) {
                    return Ok(());
                }

                seq_num += 1;
                let bid = 190.0 + (seq_num as f64) * 0.001;
                let ask = bid + 0.01;
                let tick = MarketData::new(seq_num, "ACME", bid, ask, seq_num);

                if let Err(e) = client.send(&tick.encode()) {
                    info!(error = %e, "client disconnected, waiting for next client");
                    break;
                }

                thread::sleep(Duration::from_secs(1));
            }
        }

        Ok(())
    }
}

impl<const N: usize, const M: usize> Drop for Controller<N, M> {
    fn drop(&mut self) {
        if self.client_started.load(Ordering::Acquire) && !self.client_stopped.load(Ordering::Acquire) {
            self.stop_client();
        }
    }
}

fn pin_best_effort(core: usize) {
    if let Err(e) = perf::pin_to_core(core) {
        warn!(error = %e, core, "failed to pin thread to core");
    }
}
