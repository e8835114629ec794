//! # Inbound Ports (Driving Ports)
//!
//! The API the owning proxy drives. Every method takes the host
//! invocation (or the caller address for reads) and fails with
//! `Unauthorized` unless the sender is the configured proxy.

use crate::domain::entities::Invocation;
use crate::domain::errors::ManagerResult;
use crate::domain::records::TransactionView;
use crate::domain::sub_operation::SubOperation;
use shared_types::{Address, Uid, U256};

/// Primary API of the transaction manager.
///
/// Mutating calls are atomic: on error every write of the invocation is
/// rolled back. The one exception is a failing batch, whose `Failed` state
/// and failure event are kept.
pub trait TransactionManagerApi {
    /// Creates a waiting outgoing transaction and confirms it on behalf of
    /// the submitting owner, which may execute it immediately.
    ///
    /// ## Errors
    ///
    /// - `OwnerNotFound`: origin is not an owner
    /// - `InvalidSubOperation` / `Codec`: a sub-operation cannot be executed
    fn submit_transaction(
        &mut self,
        invocation: &Invocation,
        sub_operations: Vec<SubOperation>,
    ) -> ManagerResult<Uid>;

    /// ## Errors
    ///
    /// - `InvalidState`: not waiting
    /// - `AlreadyParticipated`: origin owner already voted
    fn confirm_transaction(&mut self, invocation: &Invocation, uid: Uid) -> ManagerResult<()>;

    fn reject_transaction(&mut self, invocation: &Invocation, uid: Uid) -> ManagerResult<()>;

    /// Withdraws the origin owner's vote.
    fn revoke_transaction(&mut self, invocation: &Invocation, uid: Uid) -> ManagerResult<()>;

    /// ## Errors
    ///
    /// - `HasParticipation`: the transaction already has votes
    fn cancel_transaction(&mut self, invocation: &Invocation, uid: Uid) -> ManagerResult<()>;

    /// Cancels regardless of votes.
    fn force_cancel_transaction(&mut self, invocation: &Invocation, uid: Uid) -> ManagerResult<()>;

    /// Re-evaluates every waiting transaction against the live quorum.
    fn try_execute_waiting_transactions(&mut self, invocation: &Invocation) -> ManagerResult<()>;

    /// Records a deposit. Zero amounts are ignored and return `None`.
    fn handle_incoming_transaction(
        &mut self,
        invocation: &Invocation,
        token: Address,
        source: Address,
        amount: U256,
    ) -> ManagerResult<Option<Uid>>;

    /// Claims the wallet's staking reward on behalf of `claimer`.
    fn claim_reward(&mut self, invocation: &Invocation, claimer: &Address) -> ManagerResult<Option<Uid>>;

    fn get_transaction(&self, caller: &Address, uid: Uid) -> ManagerResult<TransactionView>;

    fn get_waiting_transactions(&self, caller: &Address, offset: usize) -> ManagerResult<Vec<TransactionView>>;

    fn get_all_transactions(&self, caller: &Address, offset: usize) -> ManagerResult<Vec<TransactionView>>;

    fn get_executed_transactions(&self, caller: &Address, offset: usize) -> ManagerResult<Vec<TransactionView>>;

    fn get_rejected_transactions(&self, caller: &Address, offset: usize) -> ManagerResult<Vec<TransactionView>>;

    fn get_waiting_transactions_count(&self, caller: &Address) -> ManagerResult<usize>;

    fn get_all_transactions_count(&self, caller: &Address) -> ManagerResult<usize>;

    fn get_executed_transactions_count(&self, caller: &Address) -> ManagerResult<usize>;

    fn get_rejected_transactions_count(&self, caller: &Address) -> ManagerResult<usize>;
}
