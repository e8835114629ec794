//! # Transaction Manager (ms-02)
//!
//! Ledger and multisignature execution engine of a multi-owner wallet.
//! Owners propose batches of sub-operations, vote on them, and a batch runs
//! atomically once its confirmations reach the live quorum.
//!
//! ## Lifecycle of an outgoing transaction
//!
//! ```text
//!             submit (auto-confirm)
//!                    │
//!                    ▼
//!   ┌──────────── WAITING ────────────┐
//!   │ confirmations ≥ quorum          │ rejections ≥ quorum
//!   ▼                                 ▼
//! EXECUTED ──batch fails──→ FAILED   REJECTED
//!
//!   WAITING ──cancel / force_cancel──→ CANCELLED
//! ```
//!
//! Terminal states are absorbing. The quorum is read from the owner
//! registry on every check, so lowering it can settle transactions that were
//! already waiting (`try_execute_waiting_transactions`).
//!
//! ## Atomicity
//!
//! Every entry point runs inside a store checkpoint and is rolled back as a
//! whole on error. The batch runs inside a nested checkpoint: when one of
//! its sub-operations fails, all of them are undone while the `Failed` state
//! and the failure event, written in the outer frame, are kept.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Records, sub-operations, parameter codec, errors
//! - `ports/` - Inbound API, outbound collaborator traits
//! - `adapters/` - Owner registry, balance history, host simulator, sinks
//! - `service/` - The execution engine
//! - `config.rs` - Service configuration

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::{ConfigError, ManagerConfig, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use domain::{
    CallError, CodecError, Invocation, ManagerError, ManagerResult, NewTransaction,
    OutgoingState, OwnerRegistryError, ParamMap, ParamValue, ScoreTypeCodec, SinkError,
    SubOperation, TrackerError, TransactionType, TransactionView,
};
pub use ports::{
    BalanceTracker, CallHost, ContractCall, EventSink, OwnerRegistry, ParamCodec,
    TransactionManagerApi,
};
pub use service::{queues, TransactionManagerDependencies, TransactionManagerService};
