//! Fleet selection: per-host bandwidth tracking and least-loaded queries

pub mod host_registry;
pub mod records;

pub use host_registry::{HostBandwidthRegistry, HostEntry};
pub use records::HostUpdateRecord;
