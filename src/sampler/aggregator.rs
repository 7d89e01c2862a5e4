//! Hourly/daily bandwidth aggregation
//!
//! One [`BandwidthAggregator`] instance consumes the sample stream of a
//! single traffic direction, buckets raw byte counts by local hour-of-day,
//! tracks the daily peak, and emits summary records whenever an hour or a
//! day rolls over. The aggregator is a write-only observer of the stream:
//! it exposes no query API, and its output leaves through the injected
//! [`SummarySink`].

use chrono::{DateTime, Local, Timelike, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::formatting::{to_mbps, to_mbps_f64};

/// Traffic direction a sampler or aggregator is tracking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    /// Inbound traffic (received)
    Rx,
    /// Outbound traffic (transmitted)
    Tx,
}

impl Direction {
    /// Label used in summary log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Rx => "RX",
            Direction::Tx => "TX",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped byte-count observation
///
/// Created once per sampling tick and retained only within the current
/// day's sample list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BandwidthSample {
    pub timestamp: DateTime<Utc>,
    pub bytes: u64,
}

/// Summary of one closed hourly bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HourlySummary {
    /// Local calendar day the bucket belongs to (`%Y-%m-%d`)
    pub day: String,
    /// Local hour of day (0-23)
    pub hour: u32,
    /// Maximum byte value observed in the bucket
    pub peak_bytes: u64,
    /// Arithmetic mean of the bucket's byte values
    pub avg_bytes: f64,
}

/// Summary of a finalized day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailySummary {
    /// Local calendar day being closed (`%Y-%m-%d`)
    pub day: String,
    /// Maximum byte value observed across the whole day
    pub peak_bytes: u64,
    /// Timestamp of the first sample that reached the peak
    pub peak_at: DateTime<Utc>,
    /// Arithmetic mean of all the day's byte values
    pub avg_bytes: f64,
}

/// Receiver for rollover summaries
///
/// The production sink writes the historical log lines; tests substitute a
/// recording implementation.
pub trait SummarySink: Send {
    fn hourly_summary(&mut self, direction: Direction, summary: &HourlySummary);
    fn daily_summary(&mut self, direction: Direction, summary: &DailySummary);
}

/// Default sink emitting the machine-matched `@value@` summary log lines
///
/// Field order and Mbps-equivalent units are a semi-stable contract with
/// external tooling that scrapes these lines. Do not reorder or re-unit.
pub struct LogSummarySink;

impl SummarySink for LogSummarySink {
    fn hourly_summary(&mut self, direction: Direction, summary: &HourlySummary) {
        info!(
            "{} bandwidth stats, day: @{}@, hour: @{}@, peak: @{}@ Mbps, avg: @{:.1}@ Mbps",
            direction,
            summary.day,
            summary.hour,
            to_mbps(summary.peak_bytes),
            to_mbps_f64(summary.avg_bytes),
        );
    }

    fn daily_summary(&mut self, direction: Direction, summary: &DailySummary) {
        info!(
            "{} bandwidth stats, day: @{}@, daily peak: @{}@ Mbps at @{}@, daily avg: @{:.1}@ Mbps",
            direction,
            summary.day,
            to_mbps(summary.peak_bytes),
            summary
                .peak_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S"),
            to_mbps_f64(summary.avg_bytes),
        );
    }
}

/// Buckets bandwidth samples into hourly/daily windows for one direction
///
/// State is exclusively owned by the feeding thread; no internal locking.
pub struct BandwidthAggregator {
    direction: Direction,
    sink: Box<dyn SummarySink>,
    /// Local day (`%Y-%m-%d`) of the most recent sample, `None` until fed
    current_day: Option<String>,
    /// Local hour of the most recent sample
    current_hour: u32,
    /// Raw byte values bucketed by local hour-of-day
    hourly: [Vec<u64>; 24],
    /// Every sample of the current day, in arrival order
    daily_samples: Vec<BandwidthSample>,
    daily_peak: u64,
    daily_peak_at: Option<DateTime<Utc>>,
}

impl BandwidthAggregator {
    /// Creates an aggregator emitting through the standard log sink
    pub fn new(direction: Direction) -> Self {
        Self::with_sink(direction, Box::new(LogSummarySink))
    }

    /// Creates an aggregator emitting through a custom sink
    pub fn with_sink(direction: Direction, sink: Box<dyn SummarySink>) -> Self {
        Self {
            direction,
            sink,
            current_day: None,
            current_hour: 0,
            hourly: std::array::from_fn(|_| Vec::new()),
            daily_samples: Vec::new(),
            daily_peak: 0,
            daily_peak_at: None,
        }
    }

    /// Ingests one sample for this traffic direction
    ///
    /// Detects hour and day rollovers from the sample's local calendar
    /// position: a closed hour emits one hourly summary, a closed day emits
    /// every non-empty hour plus the daily summary and clears all state.
    /// The sample itself is always recorded after any rollover handling.
    pub fn add_sample(&mut self, bytes_used: u64, timestamp: DateTime<Utc>) {
        let local = timestamp.with_timezone(&Local);
        let day = local.format("%Y-%m-%d").to_string();
        let hour = local.hour();

        if self.current_day.is_none() {
            self.current_day = Some(day);
            self.current_hour = hour;
        } else if self.current_day.as_deref() != Some(day.as_str()) {
            self.log_and_reset();
            self.current_day = Some(day);
            self.current_hour = hour;
        } else if hour != self.current_hour {
            let closed_hour = self.current_hour;
            if let Some(summary) = self.summarize_hour(closed_hour, &day) {
                self.sink.hourly_summary(self.direction, &summary);
            }
            self.current_hour = hour;
        }

        self.hourly[hour as usize].push(bytes_used);
        self.daily_samples.push(BandwidthSample {
            timestamp,
            bytes: bytes_used,
        });

        // strict >: on equal peaks the first sample keeps the timestamp
        if bytes_used > self.daily_peak {
            self.daily_peak = bytes_used;
            self.daily_peak_at = Some(timestamp);
        }
    }

    /// Finalizes the current day: emits every non-empty hourly bucket and
    /// the daily summary, then clears all hourly/daily state
    fn log_and_reset(&mut self) {
        let day = self.current_day.clone().unwrap_or_default();

        for hour in 0..24u32 {
            if let Some(summary) = self.summarize_hour(hour, &day) {
                self.sink.hourly_summary(self.direction, &summary);
            }
        }

        if !self.daily_samples.is_empty() {
            let total: u64 = self.daily_samples.iter().map(|s| s.bytes).sum();
            let avg = total as f64 / self.daily_samples.len() as f64;
            let summary = DailySummary {
                day,
                peak_bytes: self.daily_peak,
                peak_at: self.daily_peak_at.unwrap_or(DateTime::UNIX_EPOCH),
                avg_bytes: avg,
            };
            self.sink.daily_summary(self.direction, &summary);
        }

        for bucket in &mut self.hourly {
            bucket.clear();
        }
        self.daily_samples.clear();
        self.daily_peak = 0;
        self.daily_peak_at = None;
    }

    /// Peak and mean of one hourly bucket, `None` when the bucket is empty
    fn summarize_hour(&self, hour: u32, day: &str) -> Option<HourlySummary> {
        let samples = &self.hourly[hour as usize];
        if samples.is_empty() {
            return None;
        }

        let mut sum = 0u64;
        let mut peak = 0u64;
        for &v in samples {
            sum += v;
            if v > peak {
                peak = v;
            }
        }

        Some(HourlySummary {
            day: day.to_string(),
            hour,
            peak_bytes: peak,
            avg_bytes: sum as f64 / samples.len() as f64,
        })
    }
}
