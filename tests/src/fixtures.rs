//! Wallet wiring shared by the integration flows and the benchmarks.
//!
//! Addresses are fixed: the proxy relays every invocation, the wallet holds
//! the funds, and the owners manager, a token and the balance tracker are
//! deployed on the simulated host.

use ms_01_ordered_storage::InMemoryKVStore;
use ms_02_transaction_manager::adapters::{
    BalanceHistoryRecorder, BalanceTrackerContract, MemoryEventSink, OwnersManagerContract,
    SimulatedHost, StoredOwnerRegistry, TokenContract,
};
use ms_02_transaction_manager::{
    EventSink, Invocation, ManagerConfig, OutgoingState, ScoreTypeCodec, SubOperation,
    TransactionManagerApi, TransactionManagerDependencies, TransactionManagerService,
};
use shared_types::{Address, Uid, U256};

pub const PROXY: Address = Address::contract_from_byte(0xA1);
pub const WALLET: Address = Address::contract_from_byte(0xA2);
pub const OWNERS_MANAGER: Address = Address::contract_from_byte(0xA3);
pub const TOKEN: Address = Address::contract_from_byte(0xA4);
pub const BALANCE_TRACKER: Address = Address::contract_from_byte(0xA5);

/// Native funds credited to the wallet at setup.
pub const INITIAL_FUNDS: u64 = 1_000;

pub type Wallet<E = MemoryEventSink> = TransactionManagerService<
    InMemoryKVStore,
    StoredOwnerRegistry,
    BalanceHistoryRecorder<SimulatedHost>,
    E,
    SimulatedHost,
    ScoreTypeCodec,
>;

/// Account of the owner numbered `n` (1-based).
pub fn owner(n: u8) -> Address {
    Address::account_from_byte(n)
}

/// Invocation relayed by the proxy on behalf of `origin`.
pub fn relayed(origin: Address) -> Invocation {
    Invocation::new(PROXY, origin).at(1_700_000_000_000_000)
}

pub fn host() -> SimulatedHost {
    SimulatedHost::new()
        .with_contract(
            OWNERS_MANAGER,
            OwnersManagerContract::new(StoredOwnerRegistry::new(), WALLET),
        )
        .with_contract(TOKEN, TokenContract::new(TOKEN))
        .with_contract(BALANCE_TRACKER, BalanceTrackerContract::new(WALLET))
}

/// A funded wallet with `owners` owners of which `required` must agree.
pub fn wallet_with<E: EventSink>(
    owners: u8,
    required: u64,
    config: ManagerConfig,
    sink: E,
) -> (Wallet<E>, Vec<Uid>) {
    let mut store = InMemoryKVStore::new();
    let registry = StoredOwnerRegistry::new();
    let host = host();

    let accounts: Vec<_> = (1..=owners)
        .map(|n| (owner(n), format!("owner {n}")))
        .collect();
    let uids = registry
        .install(&mut store, &accounts, required)
        .expect("owner installation");

    let recorder = BalanceHistoryRecorder::new(host.clone(), WALLET);
    recorder.install(&mut store).expect("recorder installation");
    host.credit(&mut store, &WALLET, U256::from(INITIAL_FUNDS))
        .expect("wallet funding");

    let wallet = TransactionManagerService::new(
        TransactionManagerDependencies {
            store,
            owners: registry,
            tracker: recorder,
            sink,
            host,
            codec: ScoreTypeCodec::new(),
        },
        config,
    )
    .expect("valid config");
    (wallet, uids)
}

pub fn wallet(owners: u8, required: u64) -> (Wallet, MemoryEventSink) {
    let sink = MemoryEventSink::new();
    let (wallet, _) = wallet_with(
        owners,
        required,
        ManagerConfig::new(PROXY, WALLET),
        sink.clone(),
    );
    (wallet, sink)
}

pub fn pay(to: Address, amount: u64) -> SubOperation {
    SubOperation::transfer(to, U256::from(amount))
}

pub fn set_required(required: u64) -> SubOperation {
    SubOperation::call(
        OWNERS_MANAGER,
        "set_wallet_owners_required",
        format!(r#"[{{"name":"owners_required","type":"int","value":"{required}"}}]"#),
    )
}

pub fn add_owner(address: Address, name: &str) -> SubOperation {
    SubOperation::call(
        OWNERS_MANAGER,
        "add_wallet_owner",
        format!(
            r#"[{{"name":"address","type":"Address","value":"{address}"}},{{"name":"name","type":"str","value":"{name}"}}]"#
        ),
    )
}

pub fn token_transfer(to: Address, value: u64) -> SubOperation {
    SubOperation::call(
        TOKEN,
        "transfer",
        format!(
            r#"[{{"name":"_to","type":"Address","value":"{to}"}},{{"name":"_value","type":"int","value":"{value}"}}]"#
        ),
    )
}

pub fn track_balance(token: Address) -> SubOperation {
    SubOperation::call(
        BALANCE_TRACKER,
        "add_balance_tracker",
        format!(r#"[{{"name":"_token","type":"Address","value":"{token}"}}]"#),
    )
}

pub fn state_of<E: EventSink>(wallet: &Wallet<E>, uid: Uid) -> OutgoingState {
    wallet
        .get_transaction(&PROXY, uid)
        .expect("transaction exists")
        .as_outgoing()
        .expect("outgoing transaction")
        .state
}

pub fn native_balance<E: EventSink>(wallet: &Wallet<E>, account: &Address) -> U256 {
    wallet
        .host()
        .native_balance_of(wallet.store(), account)
        .expect("balance readable")
}
