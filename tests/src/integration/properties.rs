//! # Lifecycle Properties
//!
//! Randomized checks of the quorum rule, absorbing terminal states, vote
//! exclusivity and pagination, driven through the public manager API.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use ms_02_transaction_manager::adapters::MemoryEventSink;
    use ms_02_transaction_manager::{
        ManagerConfig, ManagerError, OutgoingState, TransactionManagerApi,
    };
    use proptest::prelude::*;
    use shared_types::{Uid, U256};
    use std::collections::HashMap;

    #[derive(Debug, Clone, Copy)]
    enum Ending {
        Executed,
        Rejected,
        Cancelled,
        Failed,
    }

    fn ending() -> impl Strategy<Value = Ending> {
        prop_oneof![
            Just(Ending::Executed),
            Just(Ending::Rejected),
            Just(Ending::Cancelled),
            Just(Ending::Failed),
        ]
    }

    #[derive(Debug, Clone, Copy)]
    enum Vote {
        Confirm,
        Reject,
        Revoke,
    }

    fn vote() -> impl Strategy<Value = (u8, Vote)> {
        (
            2u8..=3,
            prop_oneof![Just(Vote::Confirm), Just(Vote::Reject), Just(Vote::Revoke)],
        )
    }

    /// Drives a fresh 2-of-3 proposal to `ending`.
    fn settle(wallet: &mut Wallet, ending: Ending) -> Uid {
        let amount = match ending {
            Ending::Failed => INITIAL_FUNDS * 10,
            _ => 1,
        };
        let uid = wallet
            .submit_transaction(&relayed(owner(1)), vec![pay(owner(9), amount)])
            .unwrap();
        match ending {
            Ending::Executed | Ending::Failed => {
                wallet.confirm_transaction(&relayed(owner(2)), uid).unwrap();
            }
            Ending::Rejected => {
                wallet.reject_transaction(&relayed(owner(2)), uid).unwrap();
                wallet.reject_transaction(&relayed(owner(3)), uid).unwrap();
            }
            Ending::Cancelled => {
                wallet
                    .force_cancel_transaction(&relayed(owner(1)), uid)
                    .unwrap();
            }
        }
        uid
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_executes_exactly_at_quorum(
            (owners, required) in (1u8..=5).prop_flat_map(|n| (Just(n), 1..=u64::from(n)))
        ) {
            let (mut wallet, _) = wallet(owners, required);
            let uid = wallet
                .submit_transaction(&relayed(owner(1)), vec![pay(owner(9), 1)])
                .unwrap();
            prop_assert_eq!(
                state_of(&wallet, uid) == OutgoingState::Executed,
                required == 1
            );

            for voter in 2..=owners {
                if state_of(&wallet, uid) == OutgoingState::Executed {
                    break;
                }
                wallet.confirm_transaction(&relayed(owner(voter)), uid).unwrap();
                let executed = state_of(&wallet, uid) == OutgoingState::Executed;
                prop_assert_eq!(executed, u64::from(voter) >= required);
            }
            prop_assert_eq!(state_of(&wallet, uid), OutgoingState::Executed);
            prop_assert_eq!(native_balance(&wallet, &owner(9)), U256::one());
        }

        #[test]
        fn prop_terminal_states_absorb(ending in ending()) {
            let (mut wallet, sink) = wallet(3, 2);
            let uid = settle(&mut wallet, ending);
            let reached = state_of(&wallet, uid);
            prop_assert!(reached.is_terminal());
            sink.clear();

            let attempts = [
                wallet.confirm_transaction(&relayed(owner(3)), uid),
                wallet.reject_transaction(&relayed(owner(3)), uid),
                wallet.revoke_transaction(&relayed(owner(1)), uid),
                wallet.cancel_transaction(&relayed(owner(1)), uid),
                wallet.force_cancel_transaction(&relayed(owner(1)), uid),
            ];
            for attempt in attempts {
                let is_invalid_state = matches!(attempt, Err(ManagerError::InvalidState { .. }));
                prop_assert!(is_invalid_state);
            }
            prop_assert_eq!(state_of(&wallet, uid), reached);
            prop_assert!(sink.events().is_empty());
        }

        #[test]
        fn prop_votes_are_exclusive(votes in proptest::collection::vec(vote(), 0..24)) {
            // 4 of 4 with only two voters besides the proposer: never settles.
            let (mut wallet, _) = wallet(4, 4);
            let uid = wallet
                .submit_transaction(&relayed(owner(1)), vec![pay(owner(9), 1)])
                .unwrap();
            let mut model: HashMap<u8, Vote> = HashMap::new();

            for (voter, action) in votes {
                let invocation = relayed(owner(voter));
                let result = match action {
                    Vote::Confirm => wallet.confirm_transaction(&invocation, uid),
                    Vote::Reject => wallet.reject_transaction(&invocation, uid),
                    Vote::Revoke => wallet.revoke_transaction(&invocation, uid),
                };
                match (action, model.contains_key(&voter)) {
                    (Vote::Confirm | Vote::Reject, false) => {
                        prop_assert!(result.is_ok());
                        model.insert(voter, action);
                    }
                    (Vote::Confirm | Vote::Reject, true) => {
                        let refused = matches!(result, Err(ManagerError::AlreadyParticipated { .. }));
                        prop_assert!(refused);
                    }
                    (Vote::Revoke, true) => {
                        prop_assert!(result.is_ok());
                        model.remove(&voter);
                    }
                    (Vote::Revoke, false) => {
                        let refused = matches!(result, Err(ManagerError::NotParticipated { .. }));
                        prop_assert!(refused);
                    }
                }
            }

            let view = wallet.get_transaction(&PROXY, uid).unwrap();
            let outgoing = view.as_outgoing().unwrap();
            let confirms = model.values().filter(|v| matches!(v, Vote::Confirm)).count();
            let rejects = model.values().filter(|v| matches!(v, Vote::Reject)).count();
            prop_assert_eq!(outgoing.state, OutgoingState::Waiting);
            prop_assert_eq!(outgoing.confirmations.len(), confirms + 1);
            prop_assert_eq!(outgoing.rejections.len(), rejects);
        }

        #[test]
        fn prop_pages_cover_history_once(deposits in 0usize..30, page_size in 1usize..8) {
            let config = ManagerConfig::new(PROXY, WALLET).with_page_size(page_size);
            let (mut wallet, _) = wallet_with(1, 1, config, MemoryEventSink::new());

            let mut expected = Vec::new();
            for n in 0..deposits {
                let uid = wallet
                    .receive_native(&relayed(owner(9)), owner(9), U256::from(n as u64 + 1))
                    .unwrap()
                    .unwrap();
                expected.push(uid);
            }

            let mut seen = Vec::new();
            let mut offset = 0;
            loop {
                let page = wallet.get_all_transactions(&PROXY, offset).unwrap();
                prop_assert!(page.len() <= page_size);
                if page.is_empty() {
                    break;
                }
                seen.extend(page.iter().map(|view| view.uid()));
                offset += page_size;
            }
            prop_assert_eq!(seen, expected);
        }
    }
}
