//! # Balance History Recorder
//!
//! Snapshots the wallet balance of every tracked token after each settled
//! transaction. A token's history is a UID list, newest first; a snapshot
//! equal to the newest entry is skipped.
//!
//! The native token is tracked from installation. Other tokens join and
//! leave the tracked set through `BalanceTrackerContract`, so the change is
//! voted like any other batch and snapshotted when that batch settles.

use crate::domain::errors::TrackerError;
use crate::ports::outbound::{BalanceTracker, CallHost};
use ms_01_ordered_storage::{IdFactory, KeyValueStore, SetDb, StorageResult, UidLinkedListDb, VarDb};
use serde::Serialize;
use shared_types::{Address, Timestamp, Uid, U256};
use tracing::{debug, trace};

const NAME: &str = "BALANCE_HISTORY_MANAGER";
const HISTORY_SEQUENCE: &str = "BALANCE_HISTORY_FACTORY";

/// One balance snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceHistory {
    pub uid: Uid,
    pub transaction_uid: Uid,
    pub token: Address,
    pub balance: U256,
    pub timestamp: Timestamp,
}

struct HistoryFields {
    token: VarDb<Address>,
    transaction_uid: VarDb<Uid>,
    balance: VarDb<U256>,
    timestamp: VarDb<Timestamp>,
}

impl HistoryFields {
    fn new(uid: Uid) -> Self {
        let name = format!("BALANCE_HISTORY_{uid}");
        Self {
            token: VarDb::new(format!("{name}_token")),
            transaction_uid: VarDb::new(format!("{name}_transaction_uid")),
            balance: VarDb::new(format!("{name}_balance")),
            timestamp: VarDb::new(format!("{name}_timestamp")),
        }
    }
}

/// The set of tokens whose wallet balance is snapshotted.
#[derive(Debug, Clone, Default)]
pub struct TrackedTokens;

impl TrackedTokens {
    pub fn new() -> Self {
        Self
    }

    fn set(&self) -> SetDb<Address> {
        SetDb::new(&format!("{NAME}_tokens_tracked"))
    }

    /// Returns `false` if the token was already tracked.
    pub fn add<S: KeyValueStore + ?Sized>(&self, store: &mut S, token: &Address) -> StorageResult<bool> {
        let added = self.set().add(store, token)?;
        if added {
            debug!(%token, "Token balance tracked");
        }
        Ok(added)
    }

    /// Fails with `ItemNotFound` if the token is not tracked.
    pub fn remove<S: KeyValueStore + ?Sized>(&self, store: &mut S, token: &Address) -> StorageResult<()> {
        self.set().remove(store, token)?;
        debug!(%token, "Token balance no longer tracked");
        Ok(())
    }

    pub fn items<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Vec<Address>> {
        self.set().items(store)
    }
}

#[derive(Clone)]
pub struct BalanceHistoryRecorder<H> {
    host: H,
    wallet: Address,
}

impl<H: CallHost> BalanceHistoryRecorder<H> {
    pub fn new(host: H, wallet: Address) -> Self {
        Self { host, wallet }
    }

    fn tracked(&self) -> TrackedTokens {
        TrackedTokens::new()
    }

    fn token_history(&self, token: &Address) -> UidLinkedListDb {
        UidLinkedListDb::new(&format!("{NAME}_{token}_balance_history"))
    }

    /// Starts tracking the native token.
    pub fn install<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StorageResult<()> {
        self.tracked().add(store, &Address::NATIVE_TOKEN).map(|_| ())
    }

    pub fn tracked_tokens<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Vec<Address>> {
        self.tracked().items(store)
    }

    pub fn history(&self, store: &dyn KeyValueStore, uid: Uid) -> StorageResult<Option<BalanceHistory>> {
        let fields = HistoryFields::new(uid);
        let Some(token) = fields.token.get(store)? else {
            return Ok(None);
        };
        Ok(Some(BalanceHistory {
            uid,
            transaction_uid: fields.transaction_uid.get_or_default(store)?,
            token,
            balance: fields.balance.get_or_default(store)?,
            timestamp: fields.timestamp.get_or_default(store)?,
        }))
    }

    /// One page of a token's snapshots, newest first.
    pub fn token_history_page(
        &self,
        store: &dyn KeyValueStore,
        token: &Address,
        offset: usize,
    ) -> StorageResult<Vec<BalanceHistory>> {
        let mut page = Vec::new();
        for uid in self.token_history(token).select(store, offset, None)? {
            if let Some(entry) = self.history(store, uid)? {
                page.push(entry);
            }
        }
        Ok(page)
    }

    fn update_token(
        &self,
        store: &mut dyn KeyValueStore,
        transaction_uid: Uid,
        token: &Address,
        timestamp: Timestamp,
    ) -> Result<(), TrackerError> {
        let balance = self.host.balance_of(store, token, &self.wallet)?;
        let history = self.token_history(token);

        if !history.is_empty(store)? {
            let newest = HistoryFields::new(history.head_value(store)?);
            if newest.balance.get_or_default(store)? == balance {
                trace!(%token, "Balance unchanged, no snapshot");
                return Ok(());
            }
        }

        let uid = IdFactory::new(HISTORY_SEQUENCE).get_uid(store)?;
        let fields = HistoryFields::new(uid);
        fields.token.set(store, token)?;
        fields.transaction_uid.set(store, &transaction_uid)?;
        fields.balance.set(store, &balance)?;
        fields.timestamp.set(store, &timestamp)?;
        history.prepend(store, uid)?;
        debug!(uid, transaction_uid, %token, %balance, "Balance history created");
        Ok(())
    }

    fn update_all(&self, store: &mut dyn KeyValueStore, transaction_uid: Uid, timestamp: Timestamp) -> Result<(), TrackerError> {
        for token in self.tracked().items(store)? {
            self.update_token(store, transaction_uid, &token, timestamp)?;
        }
        Ok(())
    }
}

impl<H: CallHost> BalanceTracker for BalanceHistoryRecorder<H> {
    fn on_transaction_settled(
        &self,
        store: &mut dyn KeyValueStore,
        uid: Uid,
        timestamp: Timestamp,
    ) -> Result<(), TrackerError> {
        self.update_all(store, uid, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::host::{SimulatedHost, TokenContract};
    use ms_01_ordered_storage::InMemoryKVStore;

    const WALLET: Address = Address::contract_from_byte(0x20);

    fn setup() -> (InMemoryKVStore, SimulatedHost, BalanceHistoryRecorder<SimulatedHost>) {
        let mut store = InMemoryKVStore::new();
        let host = SimulatedHost::new();
        let recorder = BalanceHistoryRecorder::new(host.clone(), WALLET);
        recorder.install(&mut store).unwrap();
        (store, host, recorder)
    }

    #[test]
    fn test_snapshots_skip_unchanged_balance() {
        let (mut store, host, recorder) = setup();

        host.credit(&mut store, &WALLET, U256::from(10u64)).unwrap();
        recorder.on_transaction_settled(&mut store, 1, 100).unwrap();
        recorder.on_transaction_settled(&mut store, 2, 200).unwrap();
        host.credit(&mut store, &WALLET, U256::from(5u64)).unwrap();
        recorder.on_transaction_settled(&mut store, 3, 300).unwrap();

        let page = recorder
            .token_history_page(&store, &Address::NATIVE_TOKEN, 0)
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].transaction_uid, 3);
        assert_eq!(page[0].balance, U256::from(15u64));
        assert_eq!(page[1].transaction_uid, 1);
        assert_eq!(page[1].timestamp, 100);
    }

    #[test]
    fn test_tracked_token_snapshotted_on_settlement() {
        let token = Address::contract_from_byte(0x30);
        let mut store = InMemoryKVStore::new();
        let host = SimulatedHost::new().with_contract(token, TokenContract::new(token));
        let recorder = BalanceHistoryRecorder::new(host, WALLET);
        recorder.install(&mut store).unwrap();

        TokenContract::new(token)
            .mint(&mut store, &WALLET, U256::from(42u64))
            .unwrap();
        recorder.on_transaction_settled(&mut store, 1, 100).unwrap();
        assert!(recorder.token_history_page(&store, &token, 0).unwrap().is_empty());

        assert!(TrackedTokens::new().add(&mut store, &token).unwrap());
        assert!(!TrackedTokens::new().add(&mut store, &token).unwrap());
        assert_eq!(
            recorder.tracked_tokens(&store).unwrap(),
            vec![Address::NATIVE_TOKEN, token]
        );
        recorder.on_transaction_settled(&mut store, 2, 200).unwrap();

        let page = recorder.token_history_page(&store, &token, 0).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].transaction_uid, 2);
        assert_eq!(page[0].balance, U256::from(42u64));

        TrackedTokens::new().remove(&mut store, &token).unwrap();
        assert_eq!(
            recorder.tracked_tokens(&store).unwrap(),
            vec![Address::NATIVE_TOKEN]
        );
        assert!(matches!(
            TrackedTokens::new().remove(&mut store, &token),
            Err(ms_01_ordered_storage::StorageError::ItemNotFound { .. })
        ));
    }
}
