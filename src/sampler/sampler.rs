//! Background bandwidth sampling
//!
//! [`BandwidthSampler`] owns a dedicated OS thread that repeatedly invokes
//! the [`BandwidthReader`] collaborator, publishes the monitored interface's
//! (tx, rx) averages through relaxed atomics, notifies an optional observer,
//! and feeds one [`BandwidthAggregator`] per direction. The reader call
//! itself blocks for the averaging window, so the loop needs no sleep and
//! stop latency is bounded by one reader call.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use anyhow::Result;
use chrono::Utc;
use log::{error, info, warn};

use crate::sampler::aggregator::{BandwidthAggregator, Direction};
use crate::formatting::to_mbps;
use crate::sampler::errors::SamplerError;
use crate::sampler::interfaces::{discover_active_interfaces, select_monitored_interface};
use crate::sampler::reader::{BandwidthReader, InterfaceBandwidth, ReaderConfig};

/// Callback invoked with the published (tx, rx) averages after every tick
///
/// A returned error is logged and swallowed; it never stops the loop.
pub type BandwidthObserver = Arc<dyn Fn(u64, u64) -> Result<()> + Send + Sync>;

/// Snapshot fields shared between the loop thread and readers
///
/// `tx_avg` and `rx_avg` are each atomic but not jointly atomic: a reader
/// may observe the two fields from different ticks. That is acceptable for
/// independent telemetry values and callers must not assume coherence.
struct PublishedUsage {
    tx_avg: AtomicU64,
    rx_avg: AtomicU64,
    stop: AtomicBool,
    running: AtomicBool,
}

/// State mutated only by the loop thread, kept behind a mutex so aggregator
/// day state survives a stop/start cycle
struct SamplerWorker {
    reader: Box<dyn BandwidthReader>,
    tx_stats: BandwidthAggregator,
    rx_stats: BandwidthAggregator,
}

/// Samples system bandwidth on a background thread and publishes the
/// monitored interface's averages
pub struct BandwidthSampler {
    shared: Arc<PublishedUsage>,
    worker: Arc<Mutex<SamplerWorker>>,
    config: ReaderConfig,
    monitored_interface: Option<String>,
    observer: Option<BandwidthObserver>,
    handle: Option<JoinHandle<()>>,
}

impl BandwidthSampler {
    /// Creates a sampler, discovering the monitored interface at
    /// construction time
    ///
    /// Discovery failure leaves the sampler usable but unmonitored: every
    /// tick publishes zeros and logs a not-found warning.
    pub fn new(reader: Box<dyn BandwidthReader>, config: ReaderConfig) -> Self {
        let monitored_interface = match discover_active_interfaces() {
            Ok(interfaces) => {
                for iface in &interfaces {
                    info!(
                        "active network interface, name: {}, family: {}, private: {}, address: {}",
                        iface.name, iface.family, iface.is_private, iface.address
                    );
                }
                let selected = select_monitored_interface(&interfaces);
                info!("monitored interface: {}", selected.as_deref().unwrap_or("<none>"));
                selected
            }
            Err(e) => {
                error!("network interface discovery failed, error: {e:#}");
                None
            }
        };

        Self::with_monitored_interface(reader, config, monitored_interface)
    }

    /// Creates a sampler with an explicitly chosen monitored interface,
    /// bypassing discovery
    pub fn with_monitored_interface(
        reader: Box<dyn BandwidthReader>,
        config: ReaderConfig,
        monitored_interface: Option<String>,
    ) -> Self {
        Self {
            shared: Arc::new(PublishedUsage {
                tx_avg: AtomicU64::new(0),
                rx_avg: AtomicU64::new(0),
                stop: AtomicBool::new(false),
                running: AtomicBool::new(false),
            }),
            worker: Arc::new(Mutex::new(SamplerWorker {
                reader,
                tx_stats: BandwidthAggregator::new(Direction::Tx),
                rx_stats: BandwidthAggregator::new(Direction::Rx),
            })),
            config,
            monitored_interface,
            observer: None,
            handle: None,
        }
    }

    /// Installs the new-data-available observer; default is none
    pub fn with_observer(mut self, observer: BandwidthObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Spawns the sampling loop
    ///
    /// The only hard failure of the sampler: calling this while the loop is
    /// running returns [`SamplerError::AlreadyRunning`] and leaves the
    /// first loop untouched.
    pub fn start(&mut self) -> Result<(), SamplerError> {
        if self.shared.running.load(Ordering::SeqCst) {
            error!("bandwidth sampler start rejected, loop is already running");
            return Err(SamplerError::AlreadyRunning);
        }

        self.shared.stop.store(false, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let worker = Arc::clone(&self.worker);
        let config = self.config.clone();
        let monitored = self.monitored_interface.clone();
        let observer = self.observer.clone();

        self.handle = Some(std::thread::spawn(move || {
            run_loop(&shared, &worker, &config, monitored.as_deref(), observer);
        }));
        self.shared.running.store(true, Ordering::SeqCst);
        info!("bandwidth sampler started");
        Ok(())
    }

    /// Signals the loop to exit and joins the thread
    ///
    /// Takes effect at the next loop-iteration boundary, so the worst-case
    /// latency is one reader call. Safe no-op when not running.
    pub fn stop(&mut self) {
        if self.shared.running.load(Ordering::SeqCst) {
            self.shared.stop.store(true, Ordering::SeqCst);
            if let Some(handle) = self.handle.take() {
                if handle.join().is_err() {
                    error!("bandwidth sampler thread panicked");
                }
            }
            info!("bandwidth sampler stopped");
        }
        self.shared.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Last published (tx, rx) average bytes/sec
    ///
    /// Non-blocking and callable from any thread; returns the zero pair
    /// before the first tick. The two fields are read independently, see
    /// the struct-level note on coherence.
    pub fn avg_bandwidth_usage(&self) -> (u64, u64) {
        (
            self.shared.tx_avg.load(Ordering::Relaxed),
            self.shared.rx_avg.load(Ordering::Relaxed),
        )
    }
}

impl Drop for BandwidthSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock_worker(worker: &Mutex<SamplerWorker>) -> MutexGuard<'_, SamplerWorker> {
    worker.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One reader window per iteration; every failure is handled at the
/// tightest scope so a bad tick never terminates the loop
fn run_loop(
    shared: &PublishedUsage,
    worker: &Mutex<SamplerWorker>,
    config: &ReaderConfig,
    monitored: Option<&str>,
    observer: Option<BandwidthObserver>,
) {
    while !shared.stop.load(Ordering::SeqCst) {
        let mut worker = lock_worker(worker);

        // zero until the reader proves otherwise; reader failure and a
        // missing monitored interface both degrade to zero telemetry
        let mut tick = InterfaceBandwidth::default();

        match worker.reader.read(config) {
            Ok(reading) => {
                let mut monitored_found = false;
                for (iface, bw) in &reading.avg {
                    info!(
                        "sampler tick, avg bandwidth, iface: {}, rx: {} ({} Mbps), tx: {} ({} Mbps)",
                        iface,
                        bw.rx,
                        to_mbps(bw.rx),
                        bw.tx,
                        to_mbps(bw.tx)
                    );
                    if Some(iface.as_str()) == monitored {
                        tick = *bw;
                        monitored_found = true;
                        // keep scanning so every interface gets logged
                    }
                }
                if !monitored_found {
                    warn!(
                        "sampler tick, monitored interface not found, monitored: {}",
                        monitored.unwrap_or("<none>")
                    );
                }

                shared.tx_avg.store(tick.tx, Ordering::Relaxed);
                shared.rx_avg.store(tick.rx, Ordering::Relaxed);
                info!(
                    "sampler tick, avg bandwidth published, txAvgBandwidthUsage: @{}@Mbps, rxAvgBandwidthUsage: @{}@Mbps",
                    to_mbps(tick.tx),
                    to_mbps(tick.rx)
                );

                if let Some(observer) = &observer {
                    if let Err(e) = observer(tick.tx, tick.rx) {
                        error!("bandwidth observer failed, error: {e:#}");
                    }
                }

                // line signature matched by external bandwidth alerting
                if let Some(iface) = monitored {
                    if let Some(peak) = reading.peak.get(iface) {
                        info!(
                            "sampler tick, peak bandwidth, iface: {}, txPeak: @{}@Mbps, rxPeak: @{}@Mbps",
                            iface,
                            to_mbps(peak.tx),
                            to_mbps(peak.rx)
                        );
                    }
                }
            }
            Err(e) => error!("bandwidth reader failed, error: {e:#}"),
        }

        let now = Utc::now();
        worker.tx_stats.add_sample(tick.tx, now);
        worker.rx_stats.add_sample(tick.rx, now);
    }
}
