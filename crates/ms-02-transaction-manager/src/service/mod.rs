//! # Transaction Manager Service
//!
//! The multisignature execution engine.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `TransactionManagerApi` for the owning proxy
//! 2. Owns the waiting, executed, rejected and all-transactions queues
//! 3. Runs every entry point inside a store checkpoint, so a failed
//!    invocation leaves no trace
//! 4. Runs each batch inside a nested checkpoint, so a failed batch is
//!    undone while its `Failed` bookkeeping survives in the outer frame
//! 5. Uses dependency injection for all collaborators

mod engine;
mod ledger;

use crate::config::{ConfigError, ManagerConfig};
use crate::domain::entities::Invocation;
use crate::domain::errors::{ManagerError, ManagerResult, SinkError};
use crate::domain::factory::TransactionFactory;
use crate::ports::outbound::{BalanceTracker, CallHost, EventSink, OwnerRegistry, ParamCodec};
use ms_01_ordered_storage::{TransactionalStore, UidLinkedListDb};
use shared_bus::WalletEvent;
use shared_types::Address;
use tracing::{debug, error, warn};

/// Queue names, also the key prefixes of the queues in the store.
pub mod queues {
    pub const WAITING: &str = "WAITING_TRANSACTIONS";
    pub const EXECUTED: &str = "EXECUTED_TRANSACTIONS";
    pub const REJECTED: &str = "REJECTED_TRANSACTIONS";
    pub const ALL: &str = "ALL_TRANSACTIONS";
}

/// The Transaction Manager Service.
pub struct TransactionManagerService<S, R, B, E, H, C>
where
    S: TransactionalStore,
    R: OwnerRegistry,
    B: BalanceTracker,
    E: EventSink,
    H: CallHost,
    C: ParamCodec,
{
    /// Backing store of the ledger and of every collaborator.
    pub(crate) store: S,
    /// Live quorum and owner identities.
    pub(crate) owners: R,
    /// Notified after balance-affecting transactions.
    pub(crate) tracker: B,
    /// Receives events once their invocation committed.
    pub(crate) sink: E,
    /// Executes calls and transfers.
    pub(crate) host: H,
    /// Materializes call parameters.
    pub(crate) codec: C,
    pub(crate) config: ManagerConfig,
    pub(crate) factory: TransactionFactory,
    pub(crate) waiting: UidLinkedListDb,
    pub(crate) executed: UidLinkedListDb,
    pub(crate) rejected: UidLinkedListDb,
    pub(crate) all: UidLinkedListDb,
    /// Events of the running invocation, published on commit.
    pub(crate) pending_events: Vec<WalletEvent>,
    /// Set while the waiting queue is being re-evaluated.
    pub(crate) settling: bool,
}

/// Dependencies for TransactionManagerService
pub struct TransactionManagerDependencies<S, R, B, E, H, C> {
    pub store: S,
    pub owners: R,
    pub tracker: B,
    pub sink: E,
    pub host: H,
    pub codec: C,
}

impl<S, R, B, E, H, C> TransactionManagerService<S, R, B, E, H, C>
where
    S: TransactionalStore,
    R: OwnerRegistry,
    B: BalanceTracker,
    E: EventSink,
    H: CallHost,
    C: ParamCodec,
{
    /// Create a new Transaction Manager Service with the given dependencies.
    ///
    /// ## Errors
    ///
    /// - `ConfigError`: the configuration does not validate
    pub fn new(
        deps: TransactionManagerDependencies<S, R, B, E, H, C>,
        config: ManagerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let page_size = config.page_size;
        Ok(Self {
            store: deps.store,
            owners: deps.owners,
            tracker: deps.tracker,
            sink: deps.sink,
            host: deps.host,
            codec: deps.codec,
            config,
            factory: TransactionFactory::new(),
            waiting: UidLinkedListDb::new(queues::WAITING).with_max_iteration(page_size),
            executed: UidLinkedListDb::new(queues::EXECUTED).with_max_iteration(page_size),
            rejected: UidLinkedListDb::new(queues::REJECTED).with_max_iteration(page_size),
            all: UidLinkedListDb::new(queues::ALL).with_max_iteration(page_size),
            pending_events: Vec::new(),
            settling: false,
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access, for installing collaborator state.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn owners(&self) -> &R {
        &self.owners
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn tracker(&self) -> &B {
        &self.tracker
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // =========================================================================
    // FRAMES
    // =========================================================================

    pub(crate) fn authorize(&self, sender: &Address) -> ManagerResult<()> {
        if *sender != self.config.proxy_address {
            return Err(ManagerError::Unauthorized { sender: *sender });
        }
        Ok(())
    }

    /// Runs `body` as one top-level invocation: authorized, atomic, and
    /// publishing its events only when it commits.
    pub(crate) fn invoke<T>(
        &mut self,
        invocation: &Invocation,
        body: impl FnOnce(&mut Self) -> ManagerResult<T>,
    ) -> ManagerResult<T> {
        self.authorize(&invocation.sender)?;

        let checkpoint = self.store.checkpoint();
        self.pending_events.clear();

        match body(self) {
            Ok(value) => {
                self.store.commit(checkpoint)?;
                self.flush_events();
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.store.rollback(checkpoint) {
                    error!(error = %rollback, "Rollback of failed invocation failed");
                }
                self.pending_events.clear();
                debug!(error = %e, origin = %invocation.origin, "Invocation rolled back");
                Err(e)
            }
        }
    }

    /// Runs `body` in a nested frame. The outer `Result` reports store
    /// failures, the inner one the outcome of `body`, whose writes and
    /// events are discarded on error.
    pub(crate) fn isolated<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> ManagerResult<T>,
    ) -> ManagerResult<ManagerResult<T>> {
        let checkpoint = self.store.checkpoint();
        let mark = self.pending_events.len();

        match body(self) {
            Ok(value) => {
                self.store.commit(checkpoint)?;
                Ok(Ok(value))
            }
            Err(e) => {
                self.store.rollback(checkpoint)?;
                self.pending_events.truncate(mark);
                Ok(Err(e))
            }
        }
    }

    pub(crate) fn emit(&mut self, event: WalletEvent) {
        self.pending_events.push(event);
    }

    fn flush_events(&mut self) {
        for event in std::mem::take(&mut self.pending_events) {
            ms_telemetry::observe_event(&event);
            match self.sink.on_event(&event) {
                Ok(()) => {}
                Err(SinkError::NotConfigured) => {
                    debug!(event = event.name(), "No event sink configured");
                }
                Err(e) => {
                    warn!(event = event.name(), error = %e, "Event sink failed");
                }
            }
        }

        match self.waiting.len(&self.store) {
            Ok(waiting) => ms_telemetry::set_waiting(waiting),
            Err(e) => warn!(error = %e, "Cannot read waiting queue length"),
        }
    }
}
