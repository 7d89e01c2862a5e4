//! Sampler error types

use thiserror::Error;

/// Errors surfaced by the sampler lifecycle
///
/// Transient measurement failures (reader, discovery, observer) are logged
/// and swallowed inside the loop; misusing the lifecycle is the only
/// condition reported to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SamplerError {
    /// `start()` was called while the sampling loop is already running
    #[error("bandwidth sampler is already running")]
    AlreadyRunning,
}
