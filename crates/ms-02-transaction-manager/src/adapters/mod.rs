//! # Adapters
//!
//! - `owners.rs` - Owner registry kept in the ledger store
//! - `balance.rs` - Balance history snapshots after settled transactions
//! - `host.rs` - Simulated execution host and built-in contracts
//! - `sinks.rs` - Event sinks

pub mod balance;
pub mod host;
pub mod owners;
pub mod sinks;

pub use balance::{BalanceHistory, BalanceHistoryRecorder, TrackedTokens};
pub use host::{
    BalanceTrackerContract, CallContext, ContractHandler, OwnersManagerContract, SimulatedHost,
    TokenContract,
};
pub use owners::{StoredOwnerRegistry, WalletOwner, MAX_WALLET_OWNERS};
pub use sinks::{BusEventSink, DetachedEventSink, MemoryEventSink};
