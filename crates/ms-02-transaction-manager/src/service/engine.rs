//! State machine of outgoing transactions.
//!
//! Everything here runs inside the frame opened by `invoke`.

use super::TransactionManagerService;
use crate::domain::entities::{Invocation, OutgoingState};
use crate::domain::errors::ManagerResult;
use crate::domain::factory::NewTransaction;
use crate::domain::records::OutgoingTransaction;
use crate::domain::sub_operation::SubOperation;
use crate::ports::outbound::{
    BalanceTracker, CallHost, ContractCall, EventSink, OwnerRegistry, ParamCodec,
};
use ms_01_ordered_storage::TransactionalStore;
use shared_bus::WalletEvent;
use shared_types::{Address, Uid, U256};
use tracing::{debug, info, warn};

impl<S, R, B, E, H, C> TransactionManagerService<S, R, B, E, H, C>
where
    S: TransactionalStore,
    R: OwnerRegistry,
    B: BalanceTracker,
    E: EventSink,
    H: CallHost,
    C: ParamCodec,
{
    pub(crate) fn owner_of(&self, address: &Address) -> ManagerResult<Uid> {
        Ok(self.owners.owner_id(&self.store, address)?)
    }

    /// True when `votes` settles a transaction under the live quorum. A zero
    /// quorum never settles anything.
    fn reaches_quorum(&self, votes: usize) -> ManagerResult<bool> {
        let quorum = self.owners.quorum(&self.store)?;
        Ok(quorum > 0 && votes as u64 >= quorum)
    }

    // =========================================================================
    // VOTES
    // =========================================================================

    pub(crate) fn submit(
        &mut self,
        invocation: &Invocation,
        sub_operations: Vec<SubOperation>,
    ) -> ManagerResult<Uid> {
        let owner = self.owner_of(&invocation.origin)?;
        let request = NewTransaction::Outgoing { sub_operations };
        let uid = self
            .factory
            .create(&mut self.store, &self.codec, invocation, &request)?;

        self.waiting.append(&mut self.store, uid)?;
        self.all.append(&mut self.store, uid)?;
        info!(uid, owner, "Transaction submitted");
        self.emit(WalletEvent::TransactionCreated { uid, owner });

        self.confirm(invocation, uid, owner)?;
        Ok(uid)
    }

    pub(crate) fn confirm(&mut self, invocation: &Invocation, uid: Uid, owner: Uid) -> ManagerResult<()> {
        let transaction = OutgoingTransaction::load(&self.store, uid)?;
        transaction.check_state(&self.store, OutgoingState::Waiting)?;
        transaction.check_hasnt_participated(&self.store, owner)?;

        transaction.add_confirmation(&mut self.store, owner)?;
        debug!(uid, owner, "Transaction confirmed");
        self.emit(WalletEvent::TransactionConfirmed { uid, owner });

        if self.reaches_quorum(transaction.confirmation_count(&self.store)?)? {
            self.execute(invocation, &transaction)?;
        }
        Ok(())
    }

    pub(crate) fn reject(&mut self, uid: Uid, owner: Uid) -> ManagerResult<()> {
        let transaction = OutgoingTransaction::load(&self.store, uid)?;
        transaction.check_state(&self.store, OutgoingState::Waiting)?;
        transaction.check_hasnt_participated(&self.store, owner)?;

        transaction.add_rejection(&mut self.store, owner)?;
        debug!(uid, owner, "Transaction rejected");
        self.emit(WalletEvent::TransactionRejected { uid, owner });

        if self.reaches_quorum(transaction.rejection_count(&self.store)?)? {
            self.close_rejected(&transaction)?;
        }
        Ok(())
    }

    pub(crate) fn revoke(&mut self, uid: Uid, owner: Uid) -> ManagerResult<()> {
        let transaction = OutgoingTransaction::load(&self.store, uid)?;
        transaction.check_state(&self.store, OutgoingState::Waiting)?;
        transaction.check_has_participated(&self.store, owner)?;

        transaction.remove_vote(&mut self.store, owner)?;
        debug!(uid, owner, "Vote revoked");
        self.emit(WalletEvent::TransactionRevoked { uid, owner });
        Ok(())
    }

    /// Closes a waiting transaction. Unless `forced`, it must have no votes.
    pub(crate) fn cancel(&mut self, uid: Uid, owner: Option<Uid>, forced: bool) -> ManagerResult<()> {
        let transaction = OutgoingTransaction::load(&self.store, uid)?;
        transaction.check_state(&self.store, OutgoingState::Waiting)?;
        if !forced {
            transaction.check_no_participation(&self.store)?;
        }

        transaction.set_state(&mut self.store, OutgoingState::Cancelled)?;
        self.waiting.remove(&mut self.store, uid)?;
        self.all.remove(&mut self.store, uid)?;
        info!(uid, ?owner, forced, "Transaction cancelled");
        self.emit(WalletEvent::TransactionCancelled { uid, owner });
        Ok(())
    }

    // =========================================================================
    // SETTLEMENT
    // =========================================================================

    fn close_rejected(&mut self, transaction: &OutgoingTransaction) -> ManagerResult<()> {
        let uid = transaction.uid();
        self.waiting.remove(&mut self.store, uid)?;
        self.rejected.append(&mut self.store, uid)?;
        transaction.set_state(&mut self.store, OutgoingState::Rejected)?;

        let owner = transaction.last_rejection(&self.store)?.unwrap_or_default();
        info!(uid, owner, "Transaction closed by rejection");
        self.emit(WalletEvent::TransactionRejectionSuccess { uid, owner });
        Ok(())
    }

    /// Moves the transaction to the executed queue and runs its batch.
    ///
    /// The state is `Executed` before any call goes out, so a callee reading
    /// the ledger sees the transaction as no longer waiting. A failing batch
    /// is rolled back as a whole and the state corrected to `Failed`. The
    /// execution timestamp is written in the outer frame and kept either way.
    fn execute(&mut self, invocation: &Invocation, transaction: &OutgoingTransaction) -> ManagerResult<()> {
        let uid = transaction.uid();
        let executor = transaction.last_confirmation(&self.store)?.unwrap_or_default();

        self.waiting.remove(&mut self.store, uid)?;
        self.executed.append(&mut self.store, uid)?;
        transaction.mark_executed(&mut self.store, invocation)?;
        transaction.set_state(&mut self.store, OutgoingState::Executed)?;

        let quorum_before = self.owners.quorum(&self.store)?;
        let sub_operations = transaction.sub_operations(&self.store)?;

        match self.isolated(|service| service.run_batch(&sub_operations))? {
            Ok(()) => {
                self.tracker
                    .on_transaction_settled(&mut self.store, uid, invocation.timestamp)?;
                info!(uid, executor, operations = sub_operations.len(), "Transaction executed");
                self.emit(WalletEvent::TransactionExecutionSuccess { uid, executor });

                let quorum_changed = self.owners.quorum(&self.store)? != quorum_before;
                if quorum_changed && self.config.retry_waiting_on_quorum_change && !self.settling {
                    debug!(uid, "Quorum changed, re-evaluating waiting transactions");
                    self.settle_waiting(invocation)?;
                }
            }
            Err(e) => {
                transaction.set_state(&mut self.store, OutgoingState::Failed)?;
                warn!(uid, executor, error = %e, "Transaction execution failed");
                self.emit(WalletEvent::TransactionExecutionFailure {
                    uid,
                    executor,
                    error: e.to_string(),
                });
            }
        }
        Ok(())
    }

    fn run_batch(&mut self, sub_operations: &[SubOperation]) -> ManagerResult<()> {
        let wallet = self.config.wallet_address;
        for operation in sub_operations {
            if operation.is_call() {
                let call = ContractCall {
                    from: wallet,
                    to: operation.destination,
                    method: operation.method_name.clone().unwrap_or_default(),
                    params: operation.decode_params(&self.codec)?,
                    amount: operation.amount,
                };
                self.host.call(&mut self.store, &call)?;
            } else {
                self.host
                    .transfer(&mut self.store, &wallet, &operation.destination, operation.amount)?;
            }
        }
        Ok(())
    }

    /// Re-evaluates every waiting transaction against the live quorum,
    /// executing or closing the ones it now settles.
    pub(crate) fn settle_waiting(&mut self, invocation: &Invocation) -> ManagerResult<()> {
        let snapshot = self.waiting.to_vec(&self.store)?;
        let resumed = std::mem::replace(&mut self.settling, true);
        let result = self.settle_each(invocation, snapshot);
        self.settling = resumed;
        result
    }

    fn settle_each(&mut self, invocation: &Invocation, snapshot: Vec<Uid>) -> ManagerResult<()> {
        for uid in snapshot {
            // An earlier batch of this pass may have settled it already.
            if !self.waiting.contains(&self.store, uid)? {
                continue;
            }
            let transaction = OutgoingTransaction::load(&self.store, uid)?;
            if self.reaches_quorum(transaction.confirmation_count(&self.store)?)? {
                self.execute(invocation, &transaction)?;
            } else if self.reaches_quorum(transaction.rejection_count(&self.store)?)? {
                self.close_rejected(&transaction)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // DEPOSITS
    // =========================================================================

    pub(crate) fn receive(
        &mut self,
        invocation: &Invocation,
        token: Address,
        source: Address,
        amount: U256,
    ) -> ManagerResult<Option<Uid>> {
        if amount.is_zero() {
            return Ok(None);
        }

        let request = NewTransaction::Incoming {
            token,
            source,
            amount,
        };
        let uid = self
            .factory
            .create(&mut self.store, &self.codec, invocation, &request)?;
        self.all.append(&mut self.store, uid)?;
        self.tracker
            .on_transaction_settled(&mut self.store, uid, invocation.timestamp)?;

        info!(uid, %token, %source, %amount, "Incoming transaction recorded");
        self.emit(WalletEvent::TransactionReceived {
            uid,
            token,
            source,
            amount,
        });
        Ok(Some(uid))
    }

    pub(crate) fn claim(&mut self, invocation: &Invocation, claimer: &Address) -> ManagerResult<Option<Uid>> {
        let claimer = self.owner_of(claimer)?;
        let wallet = self.config.wallet_address;

        let before = self
            .host
            .balance_of(&self.store, &Address::NATIVE_TOKEN, &wallet)?;
        let reward = self.host.claim_reward(&mut self.store, &wallet)?;
        if reward.is_zero() {
            debug!(claimer, "No reward to claim");
            return Ok(None);
        }
        let after = self
            .host
            .balance_of(&self.store, &Address::NATIVE_TOKEN, &wallet)?;
        let amount = after.saturating_sub(before);

        let request = NewTransaction::ClaimReward {
            amount,
            reward,
            claimer,
        };
        let uid = self
            .factory
            .create(&mut self.store, &self.codec, invocation, &request)?;
        self.all.append(&mut self.store, uid)?;
        self.tracker
            .on_transaction_settled(&mut self.store, uid, invocation.timestamp)?;

        info!(uid, claimer, %reward, %amount, "Reward claimed");
        self.emit(WalletEvent::RewardClaimed {
            uid,
            claimer,
            reward,
            amount,
        });
        Ok(Some(uid))
    }
}
