//! # Transaction Factory
//!
//! Allocates transaction UIDs and writes new records. Sub-operations of an
//! outgoing batch are validated as a whole before any identifier is drawn,
//! so a rejected submission leaves both sequences untouched.

use crate::domain::entities::{Invocation, TransactionType};
use crate::domain::errors::ManagerResult;
use crate::domain::records::{
    ClaimRewardTransaction, IncomingTransaction, OutgoingTransaction, TRANSACTION_SEQUENCE,
};
use crate::domain::sub_operation::{SubOperation, SubOperationRecord, SUB_OPERATION_SEQUENCE};
use crate::ports::outbound::ParamCodec;
use ms_01_ordered_storage::{IdFactory, KeyValueStore};
use shared_types::{Address, Uid, U256};
use tracing::debug;

/// Payload of a record to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewTransaction {
    Outgoing {
        sub_operations: Vec<SubOperation>,
    },
    Incoming {
        token: Address,
        source: Address,
        amount: U256,
    },
    ClaimReward {
        amount: U256,
        reward: U256,
        claimer: Uid,
    },
}

impl NewTransaction {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Outgoing { .. } => TransactionType::Outgoing,
            Self::Incoming { .. } => TransactionType::Incoming,
            Self::ClaimReward { .. } => TransactionType::ClaimReward,
        }
    }
}

pub struct TransactionFactory {
    transactions: IdFactory,
    sub_operations: IdFactory,
}

impl Default for TransactionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionFactory {
    pub fn new() -> Self {
        Self {
            transactions: IdFactory::new(TRANSACTION_SEQUENCE),
            sub_operations: IdFactory::new(SUB_OPERATION_SEQUENCE),
        }
    }

    /// Writes a new record and returns its UID.
    pub fn create<S, C>(
        &self,
        store: &mut S,
        codec: &C,
        invocation: &Invocation,
        request: &NewTransaction,
    ) -> ManagerResult<Uid>
    where
        S: KeyValueStore + ?Sized,
        C: ParamCodec + ?Sized,
    {
        let batch = match request {
            NewTransaction::Outgoing { sub_operations } => {
                let batch: Vec<SubOperation> = sub_operations
                    .iter()
                    .cloned()
                    .map(SubOperation::normalized)
                    .collect();
                for operation in &batch {
                    operation.validate(codec)?;
                }
                batch
            }
            _ => Vec::new(),
        };

        let uid = self.transactions.get_uid(store)?;
        match request {
            NewTransaction::Outgoing { .. } => {
                let mut sub_uids = Vec::with_capacity(batch.len());
                for operation in &batch {
                    let sub_uid = self.sub_operations.get_uid(store)?;
                    SubOperationRecord::new(sub_uid).build(store, operation)?;
                    sub_uids.push(sub_uid);
                }
                OutgoingTransaction::new(uid).build(store, invocation, &sub_uids)?;
            }
            NewTransaction::Incoming {
                token,
                source,
                amount,
            } => {
                IncomingTransaction::new(uid).build(
                    store,
                    TransactionType::Incoming,
                    invocation,
                    token,
                    source,
                    amount,
                )?;
            }
            NewTransaction::ClaimReward {
                amount,
                reward,
                claimer,
            } => {
                ClaimRewardTransaction::new(uid).build(store, invocation, amount, reward, *claimer)?;
            }
        }

        debug!(uid, kind = %request.transaction_type(), "Transaction record created");
        Ok(uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::codec::ScoreTypeCodec;
    use crate::domain::entities::OutgoingState;
    use crate::domain::errors::ManagerError;
    use crate::domain::records::TransactionRecord;
    use ms_01_ordered_storage::InMemoryKVStore;

    fn invocation() -> Invocation {
        Invocation::new(Address::contract_from_byte(1), Address::account_from_byte(2)).at(5)
    }

    #[test]
    fn test_uids_are_sequential_across_kinds() {
        let mut store = InMemoryKVStore::new();
        let factory = TransactionFactory::new();
        let codec = ScoreTypeCodec::new();

        let first = factory
            .create(
                &mut store,
                &codec,
                &invocation(),
                &NewTransaction::Outgoing {
                    sub_operations: vec![SubOperation::transfer(
                        Address::account_from_byte(3),
                        U256::one(),
                    )],
                },
            )
            .unwrap();
        let second = factory
            .create(
                &mut store,
                &codec,
                &invocation(),
                &NewTransaction::Incoming {
                    token: Address::NATIVE_TOKEN,
                    source: Address::account_from_byte(4),
                    amount: U256::from(9u64),
                },
            )
            .unwrap();

        assert_eq!((first, second), (1, 2));
        assert!(matches!(
            TransactionRecord::load(&store, 2).unwrap(),
            TransactionRecord::Incoming(_)
        ));

        let outgoing = OutgoingTransaction::load(&store, 1).unwrap();
        assert_eq!(outgoing.state(&store).unwrap(), OutgoingState::Waiting);
        assert_eq!(outgoing.sub_operation_uids(&store).unwrap(), vec![1]);
    }

    #[test]
    fn test_invalid_batch_allocates_nothing() {
        let mut store = InMemoryKVStore::new();
        let factory = TransactionFactory::new();

        let batch = vec![
            SubOperation::transfer(Address::account_from_byte(3), U256::one()),
            SubOperation::call(Address::account_from_byte(3), "transfer", "").normalized(),
        ];

        let err = factory
            .create(
                &mut store,
                &ScoreTypeCodec::new(),
                &invocation(),
                &NewTransaction::Outgoing {
                    sub_operations: batch,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ManagerError::InvalidSubOperation { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_method_on_account_is_a_transfer() {
        let mut store = InMemoryKVStore::new();
        let factory = TransactionFactory::new();
        let destination = Address::account_from_byte(3);

        let operation = SubOperation {
            method_name: Some(String::new()),
            params: Some(String::new()),
            ..SubOperation::transfer(destination, U256::from(4u64))
        };
        let uid = factory
            .create(
                &mut store,
                &ScoreTypeCodec::new(),
                &invocation(),
                &NewTransaction::Outgoing {
                    sub_operations: vec![operation],
                },
            )
            .unwrap();

        let sub_uids = OutgoingTransaction::load(&store, uid)
            .unwrap()
            .sub_operation_uids(&store)
            .unwrap();
        let stored = SubOperationRecord::new(sub_uids[0]).load(&store).unwrap();
        assert_eq!(stored, SubOperation::transfer(destination, U256::from(4u64)));
        assert!(!stored.is_call());
    }
}
