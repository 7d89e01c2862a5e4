//! Bandwidth-aware load monitoring for media delivery nodes
//!
//! Two independent subsystems composed by the host process:
//!
//! - [`sampler`]: a background thread measuring this node's own network
//!   bandwidth, publishing (tx, rx) averages through a non-blocking
//!   accessor and rolling samples up into hourly/daily summaries.
//! - [`registry`]: a thread-safe registry of remote delivery hosts that
//!   answers which running host currently carries the least effective load.
//!
//! The sampler feeds its own telemetry; the registry is fed by an external
//! updater. The two never call each other.

pub mod formatting;
pub mod registry;
pub mod sampler;
