//! # MultiSafe Telemetry
//!
//! Logging and metrics bootstrap shared by the ledger crates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ms_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MS_SERVICE_NAME` | `multisafe` | Service name in logs |
//! | `MS_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `MS_JSON_LOGS` | `false` | JSON formatted logs |
//! | `MS_CONSOLE_OUTPUT` | `true` | Console output |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    gather_metrics, observe_event, set_waiting, REGISTRY, TRANSACTIONS_CANCELLED,
    TRANSACTIONS_EXECUTED, TRANSACTIONS_FAILED, TRANSACTIONS_INCOMING, TRANSACTIONS_REJECTED,
    TRANSACTIONS_SUBMITTED, VOTES, WAITING_TRANSACTIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Telemetry already initialized")]
    AlreadyInitialized,

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Installs logging and registers the metrics.
///
/// A second call returns `AlreadyInitialized` and leaves the first
/// subscriber in place.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    lazy_static::initialize(&REGISTRY);
    init_logging(config)
}
