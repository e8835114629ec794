//! Prometheus metrics of the wallet ledger.
//!
//! All metrics follow the naming convention: `ms_wallet_<metric>_<unit>`

use crate::TelemetryError;
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use shared_bus::WalletEvent;

lazy_static! {
    /// Registry holding every ledger metric.
    pub static ref REGISTRY: Registry = build_registry();

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    pub static ref TRANSACTIONS_SUBMITTED: IntCounter = IntCounter::new(
        "ms_wallet_transactions_submitted_total",
        "Outgoing transactions submitted"
    ).expect("metric creation failed");

    /// Votes by direction (confirm, reject, revoke)
    pub static ref VOTES: IntCounterVec = IntCounterVec::new(
        Opts::new("ms_wallet_votes_total", "Owner votes cast or withdrawn"),
        &["direction"]
    ).expect("metric creation failed");

    pub static ref TRANSACTIONS_EXECUTED: IntCounter = IntCounter::new(
        "ms_wallet_transactions_executed_total",
        "Batches that ran to completion"
    ).expect("metric creation failed");

    pub static ref TRANSACTIONS_FAILED: IntCounter = IntCounter::new(
        "ms_wallet_transactions_failed_total",
        "Batches rolled back after a failing sub-operation"
    ).expect("metric creation failed");

    pub static ref TRANSACTIONS_REJECTED: IntCounter = IntCounter::new(
        "ms_wallet_transactions_rejected_total",
        "Transactions closed by rejection"
    ).expect("metric creation failed");

    pub static ref TRANSACTIONS_CANCELLED: IntCounter = IntCounter::new(
        "ms_wallet_transactions_cancelled_total",
        "Transactions cancelled before settlement"
    ).expect("metric creation failed");

    // =========================================================================
    // DEPOSITS
    // =========================================================================

    pub static ref TRANSACTIONS_INCOMING: IntCounter = IntCounter::new(
        "ms_wallet_transactions_incoming_total",
        "Deposits and reward claims recorded"
    ).expect("metric creation failed");

    // =========================================================================
    // QUEUES
    // =========================================================================

    pub static ref WAITING_TRANSACTIONS: IntGauge = IntGauge::new(
        "ms_wallet_waiting_transactions",
        "Length of the waiting queue"
    ).expect("metric creation failed");
}

fn build_registry() -> Registry {
    let registry = Registry::new();
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(TRANSACTIONS_SUBMITTED.clone()),
        Box::new(VOTES.clone()),
        Box::new(TRANSACTIONS_EXECUTED.clone()),
        Box::new(TRANSACTIONS_FAILED.clone()),
        Box::new(TRANSACTIONS_REJECTED.clone()),
        Box::new(TRANSACTIONS_CANCELLED.clone()),
        Box::new(TRANSACTIONS_INCOMING.clone()),
        Box::new(WAITING_TRANSACTIONS.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            tracing::warn!(error = %e, "Metric registration failed");
        }
    }
    registry
}

/// Updates the counters an event stands for.
pub fn observe_event(event: &WalletEvent) {
    match event {
        WalletEvent::TransactionCreated { .. } => TRANSACTIONS_SUBMITTED.inc(),
        WalletEvent::TransactionConfirmed { .. } => VOTES.with_label_values(&["confirm"]).inc(),
        WalletEvent::TransactionRejected { .. } => VOTES.with_label_values(&["reject"]).inc(),
        WalletEvent::TransactionRevoked { .. } => VOTES.with_label_values(&["revoke"]).inc(),
        WalletEvent::TransactionExecutionSuccess { .. } => TRANSACTIONS_EXECUTED.inc(),
        WalletEvent::TransactionExecutionFailure { .. } => TRANSACTIONS_FAILED.inc(),
        WalletEvent::TransactionRejectionSuccess { .. } => TRANSACTIONS_REJECTED.inc(),
        WalletEvent::TransactionCancelled { .. } => TRANSACTIONS_CANCELLED.inc(),
        WalletEvent::TransactionReceived { .. } | WalletEvent::RewardClaimed { .. } => {
            TRANSACTIONS_INCOMING.inc()
        }
    }
}

pub fn set_waiting(length: usize) {
    WAITING_TRANSACTIONS.set(i64::try_from(length).unwrap_or(i64::MAX));
}

/// Renders every metric in the Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_event_counts() {
        let before = TRANSACTIONS_FAILED.get();
        observe_event(&WalletEvent::TransactionExecutionFailure {
            uid: 1,
            executor: 1,
            error: "reverted".into(),
        });
        assert!(TRANSACTIONS_FAILED.get() > before);

        let votes = VOTES.with_label_values(&["revoke"]).get();
        observe_event(&WalletEvent::TransactionRevoked { uid: 1, owner: 2 });
        assert!(VOTES.with_label_values(&["revoke"]).get() > votes);
    }

    #[test]
    fn test_gather_metrics() {
        set_waiting(3);
        TRANSACTIONS_SUBMITTED.inc();
        let text = gather_metrics().unwrap();
        assert!(text.contains("ms_wallet_transactions_submitted_total"));
        assert!(text.contains("ms_wallet_waiting_transactions"));
    }
}
