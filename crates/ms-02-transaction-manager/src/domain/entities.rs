//! # Core Entities
//!
//! Discriminants of the transaction records and the invocation context every
//! entry point receives from the host.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Timestamp, TxHash};
use std::fmt;

/// Kind of a transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Zero value of an unbuilt record.
    #[default]
    Uninitialized,
    /// Batch of sub-operations voted on by the owners.
    Outgoing,
    /// Value received by the wallet.
    Incoming,
    /// Staking reward claimed into the wallet.
    ClaimReward,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Outgoing => "OUTGOING",
            Self::Incoming => "INCOMING",
            Self::ClaimReward => "CLAIM_REWARD",
        };
        f.write_str(name)
    }
}

/// Lifecycle state of an outgoing transaction.
///
/// ```text
/// Uninitialized → Waiting → { Executed | Cancelled | Failed | Rejected }
/// ```
///
/// Every state after `Waiting` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutgoingState {
    #[default]
    Uninitialized,
    Waiting,
    Executed,
    Cancelled,
    Failed,
    Rejected,
}

impl OutgoingState {
    /// Returns true for the absorbing states.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Executed | Self::Cancelled | Self::Failed | Self::Rejected
        )
    }
}

impl fmt::Display for OutgoingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Waiting => "WAITING",
            Self::Executed => "EXECUTED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
            Self::Rejected => "REJECTED",
        };
        f.write_str(name)
    }
}

/// Host context of one top-level invocation.
///
/// `sender` is the immediate caller and must be the owning proxy. `origin`
/// is the account that signed the host transaction; votes are attributed to
/// the owner registered under that address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub sender: Address,
    pub origin: Address,
    pub tx_hash: TxHash,
    pub timestamp: Timestamp,
}

impl Invocation {
    pub fn new(sender: Address, origin: Address) -> Self {
        Self {
            sender,
            origin,
            tx_hash: TxHash::ZERO,
            timestamp: 0,
        }
    }

    #[must_use]
    pub fn with_tx_hash(mut self, tx_hash: TxHash) -> Self {
        self.tx_hash = tx_hash;
        self
    }

    #[must_use]
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!OutgoingState::Uninitialized.is_terminal());
        assert!(!OutgoingState::Waiting.is_terminal());
        for state in [
            OutgoingState::Executed,
            OutgoingState::Cancelled,
            OutgoingState::Failed,
            OutgoingState::Rejected,
        ] {
            assert!(state.is_terminal(), "{state} should be terminal");
        }
    }

    #[test]
    fn test_names_match_serialized_form() {
        let json = serde_json::to_string(&TransactionType::ClaimReward).unwrap();
        assert_eq!(json, format!("\"{}\"", TransactionType::ClaimReward));
        let json = serde_json::to_string(&OutgoingState::Waiting).unwrap();
        assert_eq!(json, "\"WAITING\"");
    }

    #[test]
    fn test_invocation_builder() {
        let proxy = Address::contract_from_byte(1);
        let owner = Address::account_from_byte(2);
        let inv = Invocation::new(proxy, owner)
            .with_tx_hash(TxHash([3; 32]))
            .at(42);
        assert_eq!(inv.sender, proxy);
        assert_eq!(inv.origin, owner);
        assert_eq!(inv.timestamp, 42);
        assert!(!inv.tx_hash.is_zero());
    }
}
