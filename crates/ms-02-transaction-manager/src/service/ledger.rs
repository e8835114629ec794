//! TransactionManagerApi implementation.

use super::TransactionManagerService;
use crate::domain::entities::Invocation;
use crate::domain::errors::ManagerResult;
use crate::domain::records::{TransactionRecord, TransactionView};
use crate::domain::sub_operation::SubOperation;
use crate::ports::inbound::TransactionManagerApi;
use crate::ports::outbound::{BalanceTracker, CallHost, EventSink, OwnerRegistry, ParamCodec};
use ms_01_ordered_storage::{TransactionalStore, UidLinkedListDb};
use shared_types::{Address, Uid, U256};
use tracing::instrument;

impl<S, R, B, E, H, C> TransactionManagerService<S, R, B, E, H, C>
where
    S: TransactionalStore,
    R: OwnerRegistry,
    B: BalanceTracker,
    E: EventSink,
    H: CallHost,
    C: ParamCodec,
{
    /// Records native value sent to the wallet by `source`.
    pub fn receive_native(
        &mut self,
        invocation: &Invocation,
        source: Address,
        amount: U256,
    ) -> ManagerResult<Option<Uid>> {
        self.handle_incoming_transaction(invocation, Address::NATIVE_TOKEN, source, amount)
    }

    /// Records a token transfer notification (`tokenFallback`) from `token`.
    pub fn receive_token(
        &mut self,
        invocation: &Invocation,
        token: Address,
        source: Address,
        amount: U256,
    ) -> ManagerResult<Option<Uid>> {
        self.handle_incoming_transaction(invocation, token, source, amount)
    }

    fn page(&self, caller: &Address, queue: &UidLinkedListDb, offset: usize) -> ManagerResult<Vec<TransactionView>> {
        self.authorize(caller)?;
        queue
            .select(&self.store, offset, None)?
            .into_iter()
            .map(|uid| -> ManagerResult<TransactionView> {
                Ok(TransactionRecord::load(&self.store, uid)?.view(&self.store)?)
            })
            .collect()
    }

    fn count(&self, caller: &Address, queue: &UidLinkedListDb) -> ManagerResult<usize> {
        self.authorize(caller)?;
        Ok(queue.len(&self.store)?)
    }
}

impl<S, R, B, E, H, C> TransactionManagerApi for TransactionManagerService<S, R, B, E, H, C>
where
    S: TransactionalStore,
    R: OwnerRegistry,
    B: BalanceTracker,
    E: EventSink,
    H: CallHost,
    C: ParamCodec,
{
    #[instrument(skip(self, invocation, sub_operations), fields(origin = %invocation.origin, operations = sub_operations.len()))]
    fn submit_transaction(
        &mut self,
        invocation: &Invocation,
        sub_operations: Vec<SubOperation>,
    ) -> ManagerResult<Uid> {
        self.invoke(invocation, |service| service.submit(invocation, sub_operations))
    }

    #[instrument(skip(self, invocation), fields(origin = %invocation.origin))]
    fn confirm_transaction(&mut self, invocation: &Invocation, uid: Uid) -> ManagerResult<()> {
        self.invoke(invocation, |service| {
            let owner = service.owner_of(&invocation.origin)?;
            service.confirm(invocation, uid, owner)
        })
    }

    #[instrument(skip(self, invocation), fields(origin = %invocation.origin))]
    fn reject_transaction(&mut self, invocation: &Invocation, uid: Uid) -> ManagerResult<()> {
        self.invoke(invocation, |service| {
            let owner = service.owner_of(&invocation.origin)?;
            service.reject(uid, owner)
        })
    }

    #[instrument(skip(self, invocation), fields(origin = %invocation.origin))]
    fn revoke_transaction(&mut self, invocation: &Invocation, uid: Uid) -> ManagerResult<()> {
        self.invoke(invocation, |service| {
            let owner = service.owner_of(&invocation.origin)?;
            service.revoke(uid, owner)
        })
    }

    #[instrument(skip(self, invocation), fields(origin = %invocation.origin))]
    fn cancel_transaction(&mut self, invocation: &Invocation, uid: Uid) -> ManagerResult<()> {
        self.invoke(invocation, |service| {
            let owner = service.owner_of(&invocation.origin)?;
            service.cancel(uid, Some(owner), false)
        })
    }

    #[instrument(skip(self, invocation), fields(origin = %invocation.origin))]
    fn force_cancel_transaction(&mut self, invocation: &Invocation, uid: Uid) -> ManagerResult<()> {
        self.invoke(invocation, |service| {
            let owner = service.owner_of(&invocation.origin).ok();
            service.cancel(uid, owner, true)
        })
    }

    #[instrument(skip(self, invocation))]
    fn try_execute_waiting_transactions(&mut self, invocation: &Invocation) -> ManagerResult<()> {
        self.invoke(invocation, |service| service.settle_waiting(invocation))
    }

    #[instrument(skip(self, invocation), fields(%token, %source, %amount))]
    fn handle_incoming_transaction(
        &mut self,
        invocation: &Invocation,
        token: Address,
        source: Address,
        amount: U256,
    ) -> ManagerResult<Option<Uid>> {
        self.invoke(invocation, |service| {
            service.receive(invocation, token, source, amount)
        })
    }

    #[instrument(skip(self, invocation), fields(%claimer))]
    fn claim_reward(&mut self, invocation: &Invocation, claimer: &Address) -> ManagerResult<Option<Uid>> {
        self.invoke(invocation, |service| service.claim(invocation, claimer))
    }

    fn get_transaction(&self, caller: &Address, uid: Uid) -> ManagerResult<TransactionView> {
        self.authorize(caller)?;
        Ok(TransactionRecord::load(&self.store, uid)?.view(&self.store)?)
    }

    fn get_waiting_transactions(&self, caller: &Address, offset: usize) -> ManagerResult<Vec<TransactionView>> {
        self.page(caller, &self.waiting, offset)
    }

    fn get_all_transactions(&self, caller: &Address, offset: usize) -> ManagerResult<Vec<TransactionView>> {
        self.page(caller, &self.all, offset)
    }

    fn get_executed_transactions(&self, caller: &Address, offset: usize) -> ManagerResult<Vec<TransactionView>> {
        self.page(caller, &self.executed, offset)
    }

    fn get_rejected_transactions(&self, caller: &Address, offset: usize) -> ManagerResult<Vec<TransactionView>> {
        self.page(caller, &self.rejected, offset)
    }

    fn get_waiting_transactions_count(&self, caller: &Address) -> ManagerResult<usize> {
        self.count(caller, &self.waiting)
    }

    fn get_all_transactions_count(&self, caller: &Address) -> ManagerResult<usize> {
        self.count(caller, &self.all)
    }

    fn get_executed_transactions_count(&self, caller: &Address) -> ManagerResult<usize> {
        self.count(caller, &self.executed)
    }

    fn get_rejected_transactions_count(&self, caller: &Address) -> ManagerResult<usize> {
        self.count(caller, &self.rejected)
    }
}
