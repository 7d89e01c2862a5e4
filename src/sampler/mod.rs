//! Self-measurement: background bandwidth sampling and aggregation
//!
//! - `sampler`: the background sampling loop and its published snapshot
//! - `aggregator`: hourly/daily bucketing with rollover summaries
//! - `reader`: the bandwidth-counter collaborator (trait + sysinfo impl)
//! - `interfaces`: interface discovery and monitored-interface selection
//! - `errors`: lifecycle error type

pub mod aggregator;
pub mod errors;
pub mod interfaces;
pub mod reader;
pub mod sampler;

pub use aggregator::{
    BandwidthAggregator, BandwidthSample, DailySummary, Direction, HourlySummary, SummarySink,
};
pub use errors::SamplerError;
pub use interfaces::{discover_active_interfaces, select_monitored_interface};
pub use reader::{BandwidthReader, BandwidthReading, InterfaceBandwidth, ReaderConfig,
    SysinfoBandwidthReader};
pub use sampler::{BandwidthObserver, BandwidthSampler};
