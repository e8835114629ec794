//! # Transaction Records
//!
//! Tagged records sharing one header. The header's `type` field is the
//! discriminant: loading a record checks it and fails with
//! `InvalidTransactionType` when the caller expected another kind.
//!
//! ## Storage Layout
//!
//! ```text
//! TRANSACTION_{uid}_type | _created_timestamp | _created_txhash
//! OUTGOING_TRANSACTION_{uid}_confirmations_SETDB… | _rejections_SETDB… | _state
//!     | _sub_transactions_ARRAYDB… | _executed_timestamp | _executed_txhash
//! INCOMING_TRANSACTION_{uid}_token | _source | _amount
//! CLAIM_REWARD_TRANSACTION_{uid}_reward | _claimer_uid
//! ```

use crate::domain::entities::{Invocation, OutgoingState, TransactionType};
use crate::domain::errors::{ManagerError, ManagerResult};
use crate::domain::sub_operation::{SubOperation, SubOperationRecord, SubOperationView};
use ms_01_ordered_storage::{ArrayDb, KeyValueStore, SetDb, StorageResult, VarDb};
use serde::Serialize;
use shared_types::{Address, Timestamp, TxHash, Uid, U256};

/// Sequence the transaction UIDs are drawn from.
pub const TRANSACTION_SEQUENCE: &str = "TRANSACTION_FACTORY";

fn optional_hash(hash: Option<TxHash>) -> Option<TxHash> {
    hash.filter(|h| !h.is_zero())
}

// =============================================================================
// HEADER
// =============================================================================

/// Fields common to every record kind.
pub struct TransactionHeader {
    uid: Uid,
    transaction_type: VarDb<TransactionType>,
    created_timestamp: VarDb<Timestamp>,
    created_txhash: VarDb<TxHash>,
}

impl TransactionHeader {
    pub fn new(uid: Uid) -> Self {
        let name = format!("TRANSACTION_{uid}");
        Self {
            uid,
            transaction_type: VarDb::new(format!("{name}_type")),
            created_timestamp: VarDb::new(format!("{name}_created_timestamp")),
            created_txhash: VarDb::new(format!("{name}_created_txhash")),
        }
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    /// Stored discriminant, `None` when no record was built under this uid.
    pub fn transaction_type<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
    ) -> StorageResult<Option<TransactionType>> {
        self.transaction_type.get(store)
    }

    /// Fails unless a record of kind `expected` exists under this uid.
    pub fn expect_type<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
        expected: TransactionType,
    ) -> ManagerResult<()> {
        match self.transaction_type(store)? {
            None => Err(ManagerError::TransactionNotFound { uid: self.uid }),
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(ManagerError::InvalidTransactionType {
                uid: self.uid,
                expected,
                actual,
            }),
        }
    }

    fn build<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        transaction_type: TransactionType,
        invocation: &Invocation,
    ) -> StorageResult<()> {
        self.transaction_type.set(store, &transaction_type)?;
        self.created_timestamp.set(store, &invocation.timestamp)?;
        self.created_txhash.set(store, &invocation.tx_hash)
    }

    pub fn view<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<HeaderView> {
        Ok(HeaderView {
            uid: self.uid,
            transaction_type: self.transaction_type.get_or_default(store)?,
            created_txhash: optional_hash(self.created_txhash.get(store)?),
            created_timestamp: self.created_timestamp.get_or_default(store)?,
        })
    }
}

// =============================================================================
// OUTGOING
// =============================================================================

/// A batch of sub-operations voted on by the owners.
pub struct OutgoingTransaction {
    header: TransactionHeader,
    confirmations: SetDb<Uid>,
    rejections: SetDb<Uid>,
    state: VarDb<OutgoingState>,
    sub_operations: ArrayDb<Uid>,
    executed_timestamp: VarDb<Timestamp>,
    executed_txhash: VarDb<TxHash>,
}

impl OutgoingTransaction {
    pub fn new(uid: Uid) -> Self {
        let name = format!("OUTGOING_TRANSACTION_{uid}");
        Self {
            header: TransactionHeader::new(uid),
            confirmations: SetDb::new(&format!("{name}_confirmations")),
            rejections: SetDb::new(&format!("{name}_rejections")),
            state: VarDb::new(format!("{name}_state")),
            sub_operations: ArrayDb::new(&format!("{name}_sub_transactions")),
            executed_timestamp: VarDb::new(format!("{name}_executed_timestamp")),
            executed_txhash: VarDb::new(format!("{name}_executed_txhash")),
        }
    }

    /// Opens an existing outgoing record.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, uid: Uid) -> ManagerResult<Self> {
        let transaction = Self::new(uid);
        transaction
            .header
            .expect_type(store, TransactionType::Outgoing)?;
        Ok(transaction)
    }

    pub(crate) fn build<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        invocation: &Invocation,
        sub_operations: &[Uid],
    ) -> StorageResult<()> {
        self.header
            .build(store, TransactionType::Outgoing, invocation)?;
        self.state.set(store, &OutgoingState::Waiting)?;
        for uid in sub_operations {
            self.sub_operations.push(store, uid)?;
        }
        Ok(())
    }

    pub fn uid(&self) -> Uid {
        self.header.uid()
    }

    pub fn state<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<OutgoingState> {
        self.state.get_or_default(store)
    }

    pub fn set_state<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        state: OutgoingState,
    ) -> StorageResult<()> {
        self.state.set(store, &state)
    }

    pub fn confirmations<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Vec<Uid>> {
        self.confirmations.items(store)
    }

    pub fn rejections<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Vec<Uid>> {
        self.rejections.items(store)
    }

    pub fn confirmation_count<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<usize> {
        self.confirmations.len(store)
    }

    pub fn rejection_count<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<usize> {
        self.rejections.len(store)
    }

    /// Most recently added confirmer.
    pub fn last_confirmation<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Option<Uid>> {
        self.confirmations.last(store)
    }

    /// Most recently added rejecter.
    pub fn last_rejection<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Option<Uid>> {
        self.rejections.last(store)
    }

    pub fn has_confirmed<S: KeyValueStore + ?Sized>(&self, store: &S, owner: Uid) -> StorageResult<bool> {
        self.confirmations.contains(store, &owner)
    }

    pub fn has_rejected<S: KeyValueStore + ?Sized>(&self, store: &S, owner: Uid) -> StorageResult<bool> {
        self.rejections.contains(store, &owner)
    }

    pub fn add_confirmation<S: KeyValueStore + ?Sized>(&self, store: &mut S, owner: Uid) -> StorageResult<()> {
        self.confirmations.add(store, &owner).map(|_| ())
    }

    pub fn add_rejection<S: KeyValueStore + ?Sized>(&self, store: &mut S, owner: Uid) -> StorageResult<()> {
        self.rejections.add(store, &owner).map(|_| ())
    }

    /// Withdraws whichever vote `owner` cast.
    pub fn remove_vote<S: KeyValueStore + ?Sized>(&self, store: &mut S, owner: Uid) -> StorageResult<()> {
        if !self.confirmations.discard(store, &owner)? {
            self.rejections.discard(store, &owner)?;
        }
        Ok(())
    }

    pub fn sub_operation_uids<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Vec<Uid>> {
        self.sub_operations.items(store)
    }

    /// The batch, in submission order.
    pub fn sub_operations<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Vec<SubOperation>> {
        self.sub_operation_uids(store)?
            .into_iter()
            .map(|uid| SubOperationRecord::new(uid).load(store))
            .collect()
    }

    /// Stamps the host transaction that triggered execution.
    pub fn mark_executed<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        invocation: &Invocation,
    ) -> StorageResult<()> {
        self.executed_timestamp.set(store, &invocation.timestamp)?;
        self.executed_txhash.set(store, &invocation.tx_hash)
    }

    // =========================================================================
    // GUARDS
    // =========================================================================

    pub fn check_state<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
        expected: OutgoingState,
    ) -> ManagerResult<()> {
        let actual = self.state(store)?;
        if actual != expected {
            return Err(ManagerError::InvalidState {
                uid: self.uid(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    pub fn check_hasnt_participated<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
        owner: Uid,
    ) -> ManagerResult<()> {
        if self.has_confirmed(store, owner)? || self.has_rejected(store, owner)? {
            return Err(ManagerError::AlreadyParticipated {
                uid: self.uid(),
                owner,
            });
        }
        Ok(())
    }

    pub fn check_has_participated<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
        owner: Uid,
    ) -> ManagerResult<()> {
        if !self.has_confirmed(store, owner)? && !self.has_rejected(store, owner)? {
            return Err(ManagerError::NotParticipated {
                uid: self.uid(),
                owner,
            });
        }
        Ok(())
    }

    pub fn check_no_participation<S: KeyValueStore + ?Sized>(&self, store: &S) -> ManagerResult<()> {
        let confirmations = self.confirmation_count(store)?;
        let rejections = self.rejection_count(store)?;
        if confirmations + rejections > 0 {
            return Err(ManagerError::HasParticipation {
                uid: self.uid(),
                confirmations,
                rejections,
            });
        }
        Ok(())
    }

    pub fn view<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<OutgoingView> {
        let sub_transactions = self
            .sub_operation_uids(store)?
            .into_iter()
            .map(|uid| SubOperationRecord::new(uid).view(store))
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(OutgoingView {
            header: self.header.view(store)?,
            confirmations: self.confirmations(store)?,
            rejections: self.rejections(store)?,
            state: self.state(store)?,
            sub_transactions,
            executed_timestamp: self.executed_timestamp.get(store)?,
            executed_txhash: optional_hash(self.executed_txhash.get(store)?),
        })
    }
}

// =============================================================================
// INCOMING
// =============================================================================

/// Value received by the wallet.
pub struct IncomingTransaction {
    header: TransactionHeader,
    token: VarDb<Address>,
    source: VarDb<Address>,
    amount: VarDb<U256>,
}

impl IncomingTransaction {
    pub fn new(uid: Uid) -> Self {
        let name = format!("INCOMING_TRANSACTION_{uid}");
        Self {
            header: TransactionHeader::new(uid),
            token: VarDb::new(format!("{name}_token")),
            source: VarDb::new(format!("{name}_source")),
            amount: VarDb::new(format!("{name}_amount")),
        }
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S, uid: Uid) -> ManagerResult<Self> {
        let transaction = Self::new(uid);
        transaction
            .header
            .expect_type(store, TransactionType::Incoming)?;
        Ok(transaction)
    }

    pub(crate) fn build<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        transaction_type: TransactionType,
        invocation: &Invocation,
        token: &Address,
        source: &Address,
        amount: &U256,
    ) -> StorageResult<()> {
        self.header.build(store, transaction_type, invocation)?;
        self.token.set(store, token)?;
        self.source.set(store, source)?;
        self.amount.set(store, amount)
    }

    pub fn uid(&self) -> Uid {
        self.header.uid()
    }

    pub fn token<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Option<Address>> {
        self.token.get(store)
    }

    pub fn amount<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<U256> {
        self.amount.get_or_default(store)
    }

    pub fn view<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<IncomingView> {
        Ok(IncomingView {
            header: self.header.view(store)?,
            token: self.token.get(store)?,
            source: self.source.get(store)?,
            amount: self.amount(store)?,
        })
    }
}

// =============================================================================
// CLAIM REWARD
// =============================================================================

/// Staking reward claimed into the wallet: an incoming transfer of native
/// value from the system contract, attributed to the claiming owner.
pub struct ClaimRewardTransaction {
    incoming: IncomingTransaction,
    reward: VarDb<U256>,
    claimer_uid: VarDb<Uid>,
}

impl ClaimRewardTransaction {
    pub fn new(uid: Uid) -> Self {
        let name = format!("CLAIM_REWARD_TRANSACTION_{uid}");
        Self {
            incoming: IncomingTransaction::new(uid),
            reward: VarDb::new(format!("{name}_reward")),
            claimer_uid: VarDb::new(format!("{name}_claimer_uid")),
        }
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S, uid: Uid) -> ManagerResult<Self> {
        let transaction = Self::new(uid);
        transaction
            .incoming
            .header
            .expect_type(store, TransactionType::ClaimReward)?;
        Ok(transaction)
    }

    pub(crate) fn build<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        invocation: &Invocation,
        amount: &U256,
        reward: &U256,
        claimer: Uid,
    ) -> StorageResult<()> {
        self.incoming.build(
            store,
            TransactionType::ClaimReward,
            invocation,
            &Address::NATIVE_TOKEN,
            &Address::SYSTEM,
            amount,
        )?;
        self.reward.set(store, reward)?;
        self.claimer_uid.set(store, &claimer)
    }

    pub fn uid(&self) -> Uid {
        self.incoming.uid()
    }

    pub fn reward<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<U256> {
        self.reward.get_or_default(store)
    }

    pub fn view<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<ClaimRewardView> {
        Ok(ClaimRewardView {
            incoming: self.incoming.view(store)?,
            reward: self.reward(store)?,
            claimer_uid: self.claimer_uid.get_or_default(store)?,
        })
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Any record, dispatched on its stored type.
pub enum TransactionRecord {
    Outgoing(OutgoingTransaction),
    Incoming(IncomingTransaction),
    ClaimReward(ClaimRewardTransaction),
}

impl TransactionRecord {
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, uid: Uid) -> ManagerResult<Self> {
        match TransactionHeader::new(uid).transaction_type(store)? {
            None => Err(ManagerError::TransactionNotFound { uid }),
            Some(TransactionType::Outgoing) => Ok(Self::Outgoing(OutgoingTransaction::new(uid))),
            Some(TransactionType::Incoming) => Ok(Self::Incoming(IncomingTransaction::new(uid))),
            Some(TransactionType::ClaimReward) => {
                Ok(Self::ClaimReward(ClaimRewardTransaction::new(uid)))
            }
            Some(TransactionType::Uninitialized) => Err(ManagerError::InvalidTransactionType {
                uid,
                expected: TransactionType::Outgoing,
                actual: TransactionType::Uninitialized,
            }),
        }
    }

    pub fn uid(&self) -> Uid {
        match self {
            Self::Outgoing(tx) => tx.uid(),
            Self::Incoming(tx) => tx.uid(),
            Self::ClaimReward(tx) => tx.uid(),
        }
    }

    pub fn view<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<TransactionView> {
        Ok(match self {
            Self::Outgoing(tx) => TransactionView::Outgoing(tx.view(store)?),
            Self::Incoming(tx) => TransactionView::Incoming(tx.view(store)?),
            Self::ClaimReward(tx) => TransactionView::ClaimReward(tx.view(store)?),
        })
    }
}

// =============================================================================
// VIEWS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    pub uid: Uid,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub created_txhash: Option<TxHash>,
    pub created_timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingView {
    #[serde(flatten)]
    pub header: HeaderView,
    pub confirmations: Vec<Uid>,
    pub rejections: Vec<Uid>,
    pub state: OutgoingState,
    pub sub_transactions: Vec<SubOperationView>,
    pub executed_timestamp: Option<Timestamp>,
    pub executed_txhash: Option<TxHash>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomingView {
    #[serde(flatten)]
    pub header: HeaderView,
    pub token: Option<Address>,
    pub source: Option<Address>,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimRewardView {
    #[serde(flatten)]
    pub incoming: IncomingView,
    pub reward: U256,
    pub claimer_uid: Uid,
}

/// Read-side rendering of any record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TransactionView {
    Outgoing(OutgoingView),
    Incoming(IncomingView),
    ClaimReward(ClaimRewardView),
}

impl TransactionView {
    pub fn header(&self) -> &HeaderView {
        match self {
            Self::Outgoing(view) => &view.header,
            Self::Incoming(view) => &view.header,
            Self::ClaimReward(view) => &view.incoming.header,
        }
    }

    pub fn uid(&self) -> Uid {
        self.header().uid
    }

    pub fn as_outgoing(&self) -> Option<&OutgoingView> {
        match self {
            Self::Outgoing(view) => Some(view),
            _ => None,
        }
    }
}
