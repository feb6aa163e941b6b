//! Operational modes for the simulated supply.
//!
//! - **Instant**: Zero delays, voltages jump straight to target, no noise
//! - **Realistic**: Transport delays, time-based ramping at RUP/RDW, measurement noise

use serde::{Deserialize, Serialize};

/// Operational modes for the simulated supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockMode {
    /// Zero delays, deterministic - for unit tests
    #[default]
    Instant,
    /// Hardware-like timing - for demos and integration tests
    Realistic,
}
