//! # Outbound Ports (Driven Ports)
//!
//! Collaborators the transaction manager consumes. Every collaborator that
//! keeps state keeps it in the same store as the ledger, so a rolled back
//! batch also rolls back whatever the collaborators wrote during it.

use crate::domain::codec::{ParamMap, ParamValue};
use crate::domain::errors::{CallError, CodecError, OwnerRegistryError, SinkError, TrackerError};
use ms_01_ordered_storage::KeyValueStore;
use shared_bus::WalletEvent;
use shared_types::{Address, Timestamp, Uid, U256};

/// Source of the live quorum and of owner identities.
///
/// Production: `StoredOwnerRegistry` (adapters/owners.rs)
pub trait OwnerRegistry: Send + Sync {
    /// Number of same-direction votes that settles a transaction. Read
    /// fresh on every check.
    fn quorum(&self, store: &dyn KeyValueStore) -> Result<u64, OwnerRegistryError>;

    /// UID of the owner registered under `address`.
    ///
    /// ## Errors
    ///
    /// - `OwnerNotFound`: `address` is not an owner
    fn owner_id(&self, store: &dyn KeyValueStore, address: &Address) -> Result<Uid, OwnerRegistryError>;
}

/// Notified after every balance-affecting transaction.
///
/// Production: `BalanceHistoryRecorder` (adapters/balance.rs)
pub trait BalanceTracker: Send + Sync {
    /// `timestamp` is the host time of the settling invocation.
    fn on_transaction_settled(
        &self,
        store: &mut dyn KeyValueStore,
        uid: Uid,
        timestamp: Timestamp,
    ) -> Result<(), TrackerError>;
}

/// Best-effort audit sink.
///
/// The engine never fails because of a sink: `NotConfigured` is expected and
/// swallowed, other errors are logged.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &WalletEvent) -> Result<(), SinkError>;
}

/// Typed conversion of persisted parameter strings.
pub trait ParamCodec: Send + Sync {
    /// Converts one raw value according to its type tag.
    ///
    /// ## Errors
    ///
    /// - `UnsupportedType`: unknown `type_tag`
    /// - `ConversionFailed`: `raw` is not a valid value of that type
    fn convert(&self, type_tag: &str, raw: &str) -> Result<ParamValue, CodecError>;

    /// Converts a `[{name, type, value}]` JSON list into named arguments.
    fn decode_params(&self, params: &str) -> Result<ParamMap, CodecError>;
}

/// One contract method invocation issued by a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub from: Address,
    pub to: Address,
    pub method: String,
    pub params: ParamMap,
    pub amount: U256,
}

/// The execution environment: value movements and contract calls.
///
/// Implementations write their effects into the store they are handed, so
/// the engine's checkpoints cover them.
///
/// Testing: `SimulatedHost` (adapters/host.rs)
pub trait CallHost: Send + Sync {
    /// Invokes a contract method, attaching `call.amount` of native value.
    fn call(&self, store: &mut dyn KeyValueStore, call: &ContractCall) -> Result<(), CallError>;

    /// Moves native value between accounts.
    fn transfer(
        &self,
        store: &mut dyn KeyValueStore,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<(), CallError>;

    /// Claims the pending staking reward of `account` into its balance and
    /// returns the reward amount.
    fn claim_reward(&self, store: &mut dyn KeyValueStore, account: &Address) -> Result<U256, CallError>;

    /// Balance of `account` in `token`; native value when `token` is
    /// `Address::NATIVE_TOKEN`.
    fn balance_of(
        &self,
        store: &dyn KeyValueStore,
        token: &Address,
        account: &Address,
    ) -> Result<U256, CallError>;
}
