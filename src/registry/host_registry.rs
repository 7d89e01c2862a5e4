//! Concurrent registry of delivery-host bandwidth state
//!
//! Tracks, per remote host, a running flag, accumulated bandwidth, and a
//! signed correction; answers "which running host has the least effective
//! load". All operations run under a single registry-wide lock with short
//! critical sections and no external calls inside them.

use log::{debug, info};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::formatting::to_mbps;
use crate::registry::records::HostUpdateRecord;

/// Per-host bandwidth state
///
/// The correction is a signed bias for load the registry cannot see, e.g.
/// a delivery host that also serves as storage gets a positive correction
/// so it is picked less often, or a negative one so it is preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostEntry {
    pub running: bool,
    pub bandwidth: u64,
    pub correction: i64,
}

/// Thread-safe host set with least-effective-bandwidth selection
///
/// Membership always equals the host set of the most recent
/// [`update_hosts`](Self::update_hosts) call; bandwidth accumulates
/// independently and survives reconciles for hosts that persist.
#[derive(Debug, Default)]
pub struct HostBandwidthRegistry {
    hosts: Mutex<BTreeMap<String, HostEntry>>,
}

impl HostBandwidthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciles the registry against a decoded host-update payload
    ///
    /// Unknown hosts are inserted with zero bandwidth and the record's
    /// correction; known hosts get only their running flag overwritten
    /// (correction is set at insertion time only, never updated here).
    /// Hosts absent from `records` are removed, accumulated bandwidth
    /// included; re-adding such a host later starts it from zero again.
    pub fn update_hosts(&self, records: &[HostUpdateRecord]) {
        let mut hosts = self.lock();

        let mut updated: HashSet<&str> = HashSet::with_capacity(records.len());
        for record in records {
            updated.insert(record.host.as_str());

            match hosts.get_mut(&record.host) {
                Some(entry) => entry.running = record.running,
                None => {
                    hosts.insert(
                        record.host.clone(),
                        HostEntry {
                            running: record.running,
                            bandwidth: 0,
                            correction: record.bandwidth_correction,
                        },
                    );
                }
            }
        }

        let before = hosts.len();
        hosts.retain(|host, _| updated.contains(host.as_str()));
        if hosts.len() != before {
            debug!(
                "host reconcile removed {} stale hosts, {} remain",
                before - hosts.len(),
                hosts.len()
            );
        }
    }

    /// Overwrites the bandwidth of a known host; no-op for unknown hosts
    pub fn set_bandwidth(&self, host: &str, bandwidth: u64) {
        let mut hosts = self.lock();
        if let Some(entry) = hosts.get_mut(host) {
            entry.bandwidth = bandwidth;
        }
    }

    /// Adds to the bandwidth of a known host; no-op for unknown hosts.
    /// Wraps on overflow.
    pub fn add_bandwidth(&self, host: &str, bandwidth: u64) {
        let mut hosts = self.lock();
        if let Some(entry) = hosts.get_mut(host) {
            entry.bandwidth = entry.bandwidth.wrapping_add(bandwidth);
        }
    }

    /// Inserts every host currently marked running into `out`
    pub fn fill_with_running_hosts(&self, out: &mut HashSet<String>) {
        for (host, entry) in self.lock().iter() {
            if entry.running {
                out.insert(host.clone());
            }
        }
    }

    /// Returns the running host with the smallest effective bandwidth
    ///
    /// Effective bandwidth is `bandwidth + correction`, compared signed: a
    /// negative effective value competes normally and can win. Hosts are
    /// scanned in key order; the first host keeps an exact tie. The scan
    /// stops as soon as a running host's effective value is exactly zero,
    /// since a zero-load host cannot be beaten. `None` when the registry is
    /// empty or no host is running.
    pub fn min_bandwidth_host(&self) -> Option<String> {
        let hosts = self.lock();

        let mut min_effective: Option<i128> = None;
        let mut min_host: Option<&String> = None;

        for (host, entry) in hosts.iter() {
            debug!(
                "min bandwidth scan, host: {}, running: {}, correction: {}, bandwidth: {} ({} Mbps)",
                host,
                entry.running,
                entry.correction,
                entry.bandwidth,
                to_mbps(entry.bandwidth)
            );

            if !entry.running {
                continue;
            }

            let effective = entry.bandwidth as i128 + entry.correction as i128;
            if min_effective.is_none_or(|current| effective < current) {
                min_effective = Some(effective);
                min_host = Some(host);

                if effective == 0 {
                    // no host can have less load than zero
                    break;
                }
            }
        }

        let selected = min_host.cloned();
        if let (Some(host), Some(effective)) = (&selected, min_effective) {
            info!(
                "min bandwidth host, host: {}, effective bandwidth: {}",
                host, effective
            );
        }
        selected
    }

    /// Copy-out view of one host's state, mainly for diagnostics
    pub fn entry(&self, host: &str) -> Option<HostEntry> {
        self.lock().get(host).copied()
    }

    /// Number of tracked hosts (running or not)
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, HostEntry>> {
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
