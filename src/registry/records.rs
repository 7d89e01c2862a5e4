//! Decoded host-update payload records

use serde::{Deserialize, Serialize};

/// One entry of the host reconcile payload
///
/// The wire form is a JSON object `{"host", "running",
/// "bandwidthCorrection"?}` produced by the fleet updater; the correction
/// defaults to 0 when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HostUpdateRecord {
    pub host: String,
    pub running: bool,
    #[serde(default)]
    pub bandwidth_correction: i64,
}

impl HostUpdateRecord {
    pub fn new(host: impl Into<String>, running: bool, bandwidth_correction: i64) -> Self {
        Self {
            host: host.into(),
            running,
            bandwidth_correction,
        }
    }
}
