//! Bandwidth counter reading
//!
//! The sampler treats the counter source as a collaborator behind the
//! [`BandwidthReader`] trait: given an averaging window, return per-interface
//! average and peak bytes/sec for that window. A call blocks for roughly the
//! whole window (`sample_interval * min_samples`), which is what paces the
//! sampling loop.

use anyhow::Result;
use log::{debug, trace};
use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};
use sysinfo::Networks;

/// Averaging window configuration for a single reader call
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Delay between consecutive counter snapshots
    pub sample_interval: Duration,
    /// Number of snapshot deltas averaged per call
    pub min_samples: u32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(2),
            min_samples: 5,
        }
    }
}

/// One interface's (rx, tx) bytes/sec pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceBandwidth {
    pub rx: u64,
    pub tx: u64,
}

/// Result of one reader call: per-interface averages and peaks over the
/// same window
#[derive(Debug, Clone, Default)]
pub struct BandwidthReading {
    /// Average bytes/sec per interface
    pub avg: HashMap<String, InterfaceBandwidth>,
    /// Peak bytes/sec per interface, observed across the window's samples
    pub peak: HashMap<String, InterfaceBandwidth>,
}

/// System-wide bandwidth counter source
pub trait BandwidthReader: Send {
    /// Measures average and peak bandwidth per interface over the configured
    /// window; blocks for approximately the window duration
    fn read(&mut self, config: &ReaderConfig) -> Result<BandwidthReading>;
}

/// Production reader backed by the OS counters exposed through sysinfo
pub struct SysinfoBandwidthReader {
    networks: Networks,
}

impl SysinfoBandwidthReader {
    pub fn new() -> Self {
        Self {
            // the initial refreshed list doubles as the delta baseline for
            // the first read call
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoBandwidthReader {
    fn default() -> Self {
        Self::new()
    }
}

impl BandwidthReader for SysinfoBandwidthReader {
    fn read(&mut self, config: &ReaderConfig) -> Result<BandwidthReading> {
        // per-interface (rate sum, rate max, sample count) accumulators
        let mut acc: HashMap<String, (InterfaceBandwidth, InterfaceBandwidth, u32)> =
            HashMap::new();

        let mut last_refresh = Instant::now();
        for sample in 0..config.min_samples {
            thread::sleep(config.sample_interval);

            let elapsed = last_refresh.elapsed().as_secs_f64();
            self.networks.refresh(true);
            last_refresh = Instant::now();

            if elapsed <= 0.0 {
                continue;
            }

            for (name, data) in &self.networks {
                // received()/transmitted() report bytes since the previous
                // refresh, so dividing by the elapsed interval yields the
                // rate for this sample
                let rx = (data.received() as f64 / elapsed) as u64;
                let tx = (data.transmitted() as f64 / elapsed) as u64;
                trace!(
                    "bandwidth sample {}/{}, iface: {}, rx: {} B/s, tx: {} B/s",
                    sample + 1,
                    config.min_samples,
                    name,
                    rx,
                    tx
                );

                let entry = acc.entry(name.to_string()).or_default();
                entry.0.rx += rx;
                entry.0.tx += tx;
                entry.1.rx = entry.1.rx.max(rx);
                entry.1.tx = entry.1.tx.max(tx);
                entry.2 += 1;
            }
        }

        let mut reading = BandwidthReading::default();
        for (name, (sum, peak, count)) in acc {
            if count == 0 {
                continue;
            }
            reading.avg.insert(
                name.clone(),
                InterfaceBandwidth {
                    rx: sum.rx / count as u64,
                    tx: sum.tx / count as u64,
                },
            );
            reading.peak.insert(name, peak);
        }

        debug!(
            "bandwidth read complete, interfaces: {}, samples: {}, interval: {:?}",
            reading.avg.len(),
            config.min_samples,
            config.sample_interval
        );

        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_window_contract() {
        let config = ReaderConfig::default();
        assert_eq!(config.sample_interval, Duration::from_secs(2));
        assert_eq!(config.min_samples, 5);
    }

    #[test]
    fn test_sysinfo_reader_returns_parallel_maps() {
        let mut reader = SysinfoBandwidthReader::new();
        let config = ReaderConfig {
            sample_interval: Duration::from_millis(20),
            min_samples: 2,
        };

        let started = Instant::now();
        let reading = reader.read(&config).expect("read should not fail");

        // the call must block for roughly interval * samples
        assert!(started.elapsed() >= Duration::from_millis(40));

        // avg and peak describe the same interface set, and a window peak
        // can never be below the window average
        assert_eq!(reading.avg.len(), reading.peak.len());
        for (iface, avg) in &reading.avg {
            let peak = reading
                .peak
                .get(iface)
                .unwrap_or_else(|| panic!("missing peak entry for {}", iface));
            assert!(peak.rx >= avg.rx);
            assert!(peak.tx >= avg.tx);
        }
    }
}
