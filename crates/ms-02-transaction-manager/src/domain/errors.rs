//! # Domain Errors
//!
//! Error types for the transaction ledger and its collaborators. Every
//! variant carries the identifiers (uid, owner, address) a caller needs to
//! assert on the exact failure cause.

use crate::domain::entities::{OutgoingState, TransactionType};
use ms_01_ordered_storage::StorageError;
use shared_types::{Address, Uid, U256};
use thiserror::Error;

/// Parameter conversion failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("{type_tag} is not a supported parameter type")]
    UnsupportedType { type_tag: String },

    #[error("Cannot convert {value:?} from type {type_tag}: {reason}")]
    ConversionFailed {
        type_tag: String,
        value: String,
        reason: String,
    },

    #[error("Malformed parameters: {0}")]
    MalformedParams(String),
}

/// Failures reported by the owner registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnerRegistryError {
    #[error("{address} is not a wallet owner")]
    OwnerNotFound { address: Address },

    #[error("Wallet owner {uid} does not exist")]
    OwnerUidNotFound { uid: Uid },

    #[error("Invalid wallet requirements: {required} required out of {owners} owners")]
    InvalidRequirements { owners: usize, required: u64 },

    #[error("{address} is already a wallet owner")]
    OwnerAlreadyExists { address: Address },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures of a call or transfer performed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("No contract deployed at {address}")]
    ContractNotFound { address: Address },

    #[error("Contract {contract} has no method {method}")]
    MethodNotFound { contract: Address, method: String },

    #[error("Insufficient balance in {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: Address,
        required: U256,
        available: U256,
    },

    #[error("Call to {contract} reverted: {reason}")]
    Reverted { contract: Address, reason: String },

    #[error("Invalid parameters for {method}: {reason}")]
    InvalidParams { method: String, reason: String },

    #[error(transparent)]
    Requirements(#[from] OwnerRegistryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures of the audit sink. Never fatal to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("Event sink not configured")]
    NotConfigured,

    #[error("Event sink closed")]
    Closed,
}

/// Failures of the balance tracker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Balance query failed: {0}")]
    Balance(#[from] CallError),
}

/// Errors surfaced by the transaction manager entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagerError {
    #[error("Transaction {uid} not found")]
    TransactionNotFound { uid: Uid },

    #[error("Transaction {uid} is {actual}, expected {expected}")]
    InvalidTransactionType {
        uid: Uid,
        expected: TransactionType,
        actual: TransactionType,
    },

    #[error("Transaction {uid} is in state {actual}, expected {expected}")]
    InvalidState {
        uid: Uid,
        expected: OutgoingState,
        actual: OutgoingState,
    },

    #[error("Owner {owner} already participated in transaction {uid}")]
    AlreadyParticipated { uid: Uid, owner: Uid },

    #[error("Owner {owner} did not participate in transaction {uid}")]
    NotParticipated { uid: Uid, owner: Uid },

    #[error("Transaction {uid} has {confirmations} confirmations and {rejections} rejections")]
    HasParticipation {
        uid: Uid,
        confirmations: usize,
        rejections: usize,
    },

    #[error("Invalid sub-operation to {destination}: {reason}")]
    InvalidSubOperation { destination: Address, reason: String },

    #[error("Sender {sender} is not the owning proxy")]
    Unauthorized { sender: Address },

    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error(transparent)]
    Owners(#[from] OwnerRegistryError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// Result alias for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;
