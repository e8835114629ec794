//! # Wallet Events
//!
//! Audit events emitted by the transaction ledger. Every event names the
//! transaction it concerns and, where one exists, the owner that caused it.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Uid, U256};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum WalletEvent {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================
    /// An outgoing transaction was submitted.
    TransactionCreated { uid: Uid, owner: Uid },

    /// A waiting transaction was cancelled. `owner` is absent when the
    /// cancellation was forced by a caller that is not an owner.
    TransactionCancelled { uid: Uid, owner: Option<Uid> },

    // =========================================================================
    // VOTES
    // =========================================================================
    TransactionConfirmed { uid: Uid, owner: Uid },

    TransactionRejected { uid: Uid, owner: Uid },

    TransactionRevoked { uid: Uid, owner: Uid },

    // =========================================================================
    // SETTLEMENT
    // =========================================================================
    /// The batch ran to completion. `executor` is the last confirming owner.
    TransactionExecutionSuccess { uid: Uid, executor: Uid },

    /// The batch failed and its effects were rolled back.
    TransactionExecutionFailure {
        uid: Uid,
        executor: Uid,
        error: String,
    },

    /// Enough rejections were collected; the transaction is closed.
    TransactionRejectionSuccess { uid: Uid, owner: Uid },

    // =========================================================================
    // DEPOSITS
    // =========================================================================
    /// Value was received by the wallet.
    TransactionReceived {
        uid: Uid,
        token: Address,
        source: Address,
        amount: U256,
    },

    /// Staking reward was claimed into the wallet.
    RewardClaimed {
        uid: Uid,
        claimer: Uid,
        reward: U256,
        amount: U256,
    },
}

impl WalletEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::TransactionCreated { .. } | Self::TransactionCancelled { .. } => {
                EventTopic::Lifecycle
            }
            Self::TransactionConfirmed { .. }
            | Self::TransactionRejected { .. }
            | Self::TransactionRevoked { .. } => EventTopic::Votes,
            Self::TransactionExecutionSuccess { .. }
            | Self::TransactionExecutionFailure { .. }
            | Self::TransactionRejectionSuccess { .. } => EventTopic::Settlement,
            Self::TransactionReceived { .. } | Self::RewardClaimed { .. } => EventTopic::Deposits,
        }
    }

    /// The transaction this event concerns.
    #[must_use]
    pub fn transaction_uid(&self) -> Uid {
        match self {
            Self::TransactionCreated { uid, .. }
            | Self::TransactionCancelled { uid, .. }
            | Self::TransactionConfirmed { uid, .. }
            | Self::TransactionRejected { uid, .. }
            | Self::TransactionRevoked { uid, .. }
            | Self::TransactionExecutionSuccess { uid, .. }
            | Self::TransactionExecutionFailure { uid, .. }
            | Self::TransactionRejectionSuccess { uid, .. }
            | Self::TransactionReceived { uid, .. }
            | Self::RewardClaimed { uid, .. } => *uid,
        }
    }

    /// Short event name, as used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TransactionCreated { .. } => "TransactionCreated",
            Self::TransactionCancelled { .. } => "TransactionCancelled",
            Self::TransactionConfirmed { .. } => "TransactionConfirmed",
            Self::TransactionRejected { .. } => "TransactionRejected",
            Self::TransactionRevoked { .. } => "TransactionRevoked",
            Self::TransactionExecutionSuccess { .. } => "TransactionExecutionSuccess",
            Self::TransactionExecutionFailure { .. } => "TransactionExecutionFailure",
            Self::TransactionRejectionSuccess { .. } => "TransactionRejectionSuccess",
            Self::TransactionReceived { .. } => "TransactionReceived",
            Self::RewardClaimed { .. } => "RewardClaimed",
        }
    }
}

/// Event topics for filtering subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Creation and cancellation.
    Lifecycle,
    /// Confirmations, rejections and revocations.
    Votes,
    /// Execution outcomes and rejection settlement.
    Settlement,
    /// Incoming value and reward claims.
    Deposits,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Transactions to include. Empty means all transactions.
    pub transactions: Vec<Uid>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            transactions: Vec::new(),
        }
    }

    /// Create a filter following specific transactions.
    #[must_use]
    pub fn transactions(transactions: Vec<Uid>) -> Self {
        Self {
            topics: Vec::new(),
            transactions,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &WalletEvent) -> bool {
        let topic_ok = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());
        let uid_ok =
            self.transactions.is_empty() || self.transactions.contains(&event.transaction_uid());
        topic_ok && uid_ok
    }
}
