//! # Wallet Flows
//!
//! End-to-end proposal scenarios through the public manager API, with the
//! owner registry, the balance recorder, the simulated host and the event
//! bus all wired in.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use ms_02_transaction_manager::adapters::{BusEventSink, MemoryEventSink, TokenContract};
    use ms_02_transaction_manager::{
        ManagerConfig, ManagerError, OutgoingState, SubOperation, TransactionManagerApi,
        TransactionView,
    };
    use shared_bus::{EventFilter, InMemoryEventBus, WalletEvent};
    use shared_types::{Address, U256};
    use std::sync::Arc;

    // =============================================================================
    // QUORUM SCENARIOS
    // =============================================================================

    #[test]
    fn test_two_of_three_executes_on_second_confirmation() {
        let (mut wallet, _) = wallet(3, 2);

        let uid = wallet
            .submit_transaction(&relayed(owner(1)), vec![pay(owner(9), 250)])
            .unwrap();
        assert_eq!(state_of(&wallet, uid), OutgoingState::Waiting);
        assert_eq!(wallet.get_waiting_transactions_count(&PROXY).unwrap(), 1);
        assert_eq!(wallet.get_executed_transactions_count(&PROXY).unwrap(), 0);

        wallet
            .confirm_transaction(&relayed(owner(2)), uid)
            .unwrap();

        let view = wallet.get_transaction(&PROXY, uid).unwrap();
        let outgoing = view.as_outgoing().unwrap();
        assert_eq!(outgoing.state, OutgoingState::Executed);
        assert_eq!(outgoing.confirmations.len(), 2);
        assert!(outgoing.executed_timestamp.is_some());
        assert_eq!(wallet.get_waiting_transactions_count(&PROXY).unwrap(), 0);
        assert_eq!(wallet.get_executed_transactions_count(&PROXY).unwrap(), 1);
        assert_eq!(native_balance(&wallet, &owner(9)), U256::from(250u64));
        assert_eq!(
            native_balance(&wallet, &WALLET),
            U256::from(INITIAL_FUNDS - 250)
        );
    }

    #[test]
    fn test_lowered_quorum_settles_waiting_on_request() {
        let sink = MemoryEventSink::new();
        let config = ManagerConfig::new(PROXY, WALLET).with_retry_waiting_on_quorum_change(false);
        let (mut wallet, _) = wallet_with(3, 3, config, sink);

        let parked = wallet
            .submit_transaction(&relayed(owner(1)), vec![pay(owner(9), 10)])
            .unwrap();

        let lower = wallet
            .submit_transaction(&relayed(owner(1)), vec![set_required(1)])
            .unwrap();
        wallet.confirm_transaction(&relayed(owner(2)), lower).unwrap();
        wallet.confirm_transaction(&relayed(owner(3)), lower).unwrap();
        assert_eq!(state_of(&wallet, lower), OutgoingState::Executed);
        assert_eq!(state_of(&wallet, parked), OutgoingState::Waiting);

        wallet
            .try_execute_waiting_transactions(&relayed(owner(2)))
            .unwrap();

        assert_eq!(state_of(&wallet, parked), OutgoingState::Executed);
        assert_eq!(wallet.get_waiting_transactions_count(&PROXY).unwrap(), 0);
        assert_eq!(native_balance(&wallet, &owner(9)), U256::from(10u64));
    }

    #[test]
    fn test_lowered_quorum_settles_waiting_in_same_invocation() {
        let (mut wallet, sink) = wallet(3, 3);

        let parked = wallet
            .submit_transaction(&relayed(owner(1)), vec![pay(owner(9), 10)])
            .unwrap();
        let lower = wallet
            .submit_transaction(&relayed(owner(1)), vec![set_required(1)])
            .unwrap();
        wallet.confirm_transaction(&relayed(owner(2)), lower).unwrap();
        sink.clear();
        wallet.confirm_transaction(&relayed(owner(3)), lower).unwrap();

        assert_eq!(state_of(&wallet, parked), OutgoingState::Executed);
        let executed: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|event| match event {
                WalletEvent::TransactionExecutionSuccess { uid, .. } => Some(uid),
                _ => None,
            })
            .collect();
        assert_eq!(executed, vec![lower, parked]);
    }

    #[test]
    fn test_new_owner_votes_after_admission() {
        let (mut wallet, _) = wallet(2, 1);

        let admit = wallet
            .submit_transaction(&relayed(owner(1)), vec![add_owner(owner(7), "late joiner")])
            .unwrap();
        assert_eq!(state_of(&wallet, admit), OutgoingState::Executed);

        let uid = wallet
            .submit_transaction(&relayed(owner(7)), vec![pay(owner(9), 1)])
            .unwrap();
        assert_eq!(state_of(&wallet, uid), OutgoingState::Executed);
    }

    // =============================================================================
    // ATOMICITY
    // =============================================================================

    #[test]
    fn test_failing_middle_operation_rolls_back_whole_batch() {
        let (mut wallet, sink) = wallet(2, 1);
        TokenContract::new(TOKEN)
            .mint(wallet.store_mut(), &WALLET, U256::from(5u64))
            .unwrap();

        let uid = wallet
            .submit_transaction(
                &relayed(owner(1)),
                vec![
                    pay(owner(8), 100),
                    token_transfer(owner(8), 500),
                    pay(owner(9), 50),
                ],
            )
            .unwrap();

        assert_eq!(state_of(&wallet, uid), OutgoingState::Failed);
        assert_eq!(native_balance(&wallet, &owner(8)), U256::zero());
        assert_eq!(native_balance(&wallet, &owner(9)), U256::zero());
        assert_eq!(native_balance(&wallet, &WALLET), U256::from(INITIAL_FUNDS));
        assert_eq!(
            TokenContract::new(TOKEN)
                .balance(wallet.store(), &WALLET)
                .unwrap(),
            U256::from(5u64)
        );

        let failure = sink.events().into_iter().find_map(|event| match event {
            WalletEvent::TransactionExecutionFailure { uid, error, .. } => Some((uid, error)),
            _ => None,
        });
        let (failed_uid, error) = failure.expect("failure event");
        assert_eq!(failed_uid, uid);
        assert!(error.contains("Insufficient balance"));
    }

    #[test]
    fn test_rejected_invocation_changes_nothing() {
        let (mut wallet, sink) = wallet(2, 2);

        let err = wallet
            .submit_transaction(&relayed(owner(9)), vec![pay(owner(9), 1)])
            .unwrap_err();
        assert!(matches!(err, ManagerError::Owners(_)));

        assert!(sink.events().is_empty());
        assert_eq!(wallet.get_all_transactions_count(&PROXY).unwrap(), 0);
        assert_eq!(wallet.get_waiting_transactions_count(&PROXY).unwrap(), 0);
    }

    #[test]
    fn test_missing_contract_fails_batch_not_invocation() {
        let (mut wallet, _) = wallet(1, 1);
        let nowhere = Address::contract_from_byte(0xEE);

        let uid = wallet
            .submit_transaction(
                &relayed(owner(1)),
                vec![SubOperation::call(nowhere, "ping", "").normalized()],
            )
            .unwrap();
        assert_eq!(state_of(&wallet, uid), OutgoingState::Failed);
        assert_eq!(wallet.get_executed_transactions_count(&PROXY).unwrap(), 1);

        // Failed is terminal.
        let err = wallet
            .reject_transaction(&relayed(owner(1)), uid)
            .unwrap_err();
        assert!(matches!(err, ManagerError::InvalidState { .. }));
    }

    // =============================================================================
    // DEPOSITS
    // =============================================================================

    #[test]
    fn test_deposits_and_rewards_share_history() {
        let (mut wallet, _) = wallet(2, 1);
        let deposit = relayed(Address::account_from_byte(0x50));

        let native = wallet
            .receive_native(&deposit, owner(9), U256::from(40u64))
            .unwrap()
            .unwrap();
        let token = wallet
            .receive_token(&deposit, TOKEN, owner(9), U256::from(7u64))
            .unwrap()
            .unwrap();
        assert_eq!(
            wallet
                .receive_native(&deposit, owner(9), U256::zero())
                .unwrap(),
            None
        );

        let host = wallet.host().clone();
        host.grant_reward(wallet.store_mut(), &WALLET, U256::from(3u64))
            .unwrap();
        let reward = wallet
            .claim_reward(&relayed(owner(2)), &owner(2))
            .unwrap()
            .unwrap();

        let all: Vec<_> = wallet
            .get_all_transactions(&PROXY, 0)
            .unwrap()
            .iter()
            .map(TransactionView::uid)
            .collect();
        assert_eq!(all, vec![native, token, reward]);
        assert_eq!(wallet.get_waiting_transactions_count(&PROXY).unwrap(), 0);

        match wallet.get_transaction(&PROXY, reward).unwrap() {
            TransactionView::ClaimReward(view) => {
                assert_eq!(view.reward, U256::from(3u64));
                assert_eq!(view.incoming.token, Some(Address::NATIVE_TOKEN));
                assert_eq!(view.incoming.source, Some(Address::SYSTEM));
            }
            other => panic!("expected a reward claim, got {other:?}"),
        }
    }

    #[test]
    fn test_voted_token_tracking_snapshots_deposits() {
        let (mut wallet, _) = wallet(2, 2);
        let tokens = TokenContract::new(TOKEN);

        let uid = wallet
            .submit_transaction(&relayed(owner(1)), vec![track_balance(TOKEN)])
            .unwrap();
        assert_eq!(state_of(&wallet, uid), OutgoingState::Waiting);
        assert_eq!(
            wallet.tracker().tracked_tokens(wallet.store()).unwrap(),
            vec![Address::NATIVE_TOKEN]
        );

        wallet.confirm_transaction(&relayed(owner(2)), uid).unwrap();
        assert_eq!(state_of(&wallet, uid), OutgoingState::Executed);

        tokens
            .mint(wallet.store_mut(), &WALLET, U256::from(12u64))
            .unwrap();
        let deposit = wallet
            .receive_token(&relayed(owner(9)), TOKEN, owner(9), U256::from(12u64))
            .unwrap()
            .unwrap();

        let history = wallet
            .tracker()
            .token_history_page(wallet.store(), &TOKEN, 0)
            .unwrap();
        let newest = &history[0];
        assert_eq!(newest.transaction_uid, deposit);
        assert_eq!(newest.balance, U256::from(12u64));
    }

    // =============================================================================
    // EVENT BUS
    // =============================================================================

    #[tokio::test]
    async fn test_committed_events_reach_bus_in_order() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut subscription = bus.subscribe(EventFilter::all());
        let (mut wallet, _) = wallet_with(
            2,
            2,
            ManagerConfig::new(PROXY, WALLET),
            BusEventSink::new(Arc::clone(&bus)),
        );

        let uid = wallet
            .submit_transaction(&relayed(owner(1)), vec![pay(owner(9), 1)])
            .unwrap();
        assert!(wallet.confirm_transaction(&relayed(owner(1)), uid).is_err());
        wallet.confirm_transaction(&relayed(owner(2)), uid).unwrap();

        let names: Vec<_> = subscription
            .drain()
            .iter()
            .map(WalletEvent::name)
            .collect();
        assert_eq!(
            names,
            vec![
                "TransactionCreated",
                "TransactionConfirmed",
                "TransactionConfirmed",
                "TransactionExecutionSuccess",
            ]
        );
    }

    // =============================================================================
    // TELEMETRY
    // =============================================================================

    #[test]
    fn test_metrics_follow_wallet_activity() {
        let submitted = ms_telemetry::TRANSACTIONS_SUBMITTED.get();
        let (mut wallet, _) = wallet(1, 1);

        wallet
            .submit_transaction(&relayed(owner(1)), vec![pay(owner(9), 1)])
            .unwrap();

        assert!(ms_telemetry::TRANSACTIONS_SUBMITTED.get() > submitted);
        let text = ms_telemetry::gather_metrics().unwrap();
        assert!(text.contains("ms_wallet_transactions_executed_total"));
    }
}
