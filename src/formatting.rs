//! Conversion helpers for the Mbps-equivalent figures in bandwidth log lines
//!
//! External tooling matches the summary lines by signature and expects the
//! values in Mbps-equivalent units, so every line goes through these two
//! conversions rather than ad-hoc arithmetic at the call sites. Shared by
//! the sampler and the registry, which otherwise stay independent.

/// Converts a byte count (or bytes/sec rate) to integer Mbps-equivalent
///
/// Uses the decimal megabit (`value * 8 / 1_000_000`) with truncating
/// integer division, matching the units of the historical log lines.
///
/// # Examples
///
/// ```
/// use delivery_watcher::formatting::to_mbps;
///
/// assert_eq!(to_mbps(0), 0);
/// assert_eq!(to_mbps(125_000), 1);
/// assert_eq!(to_mbps(1_000_000), 8);
/// assert_eq!(to_mbps(130_000), 1); // truncates, never rounds up
/// ```
pub fn to_mbps(bytes: u64) -> u64 {
    (bytes * 8) / 1_000_000
}

/// Converts a fractional bytes/sec average to Mbps-equivalent
///
/// Averages are rendered with one decimal digit (`{:.1}`) by the callers;
/// this helper only performs the unit conversion.
///
/// # Examples
///
/// ```
/// use delivery_watcher::formatting::to_mbps_f64;
///
/// assert_eq!(to_mbps_f64(0.0), 0.0);
/// assert_eq!(to_mbps_f64(125_000.0), 1.0);
/// ```
pub fn to_mbps_f64(bytes: f64) -> f64 {
    (bytes * 8.0) / 1_000_000.0
}
