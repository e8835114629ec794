//! # Simulated Host
//!
//! In-process execution environment: a native-value ledger and pending
//! staking rewards kept in the store, plus a registry of contract handlers
//! addressed by contract address.
//!
//! Handlers write only through the store they are handed, so the engine's
//! checkpoints undo the effects of a failed batch.

use crate::adapters::balance::TrackedTokens;
use crate::adapters::owners::StoredOwnerRegistry;
use crate::domain::codec::{ParamMap, ParamValue};
use crate::domain::errors::CallError;
use crate::ports::outbound::{CallHost, ContractCall};
use ms_01_ordered_storage::{KeyValueStore, VarDb};
use shared_types::{Address, Uid, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Context of one contract invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Account or contract that issued the call.
    pub caller: Address,
    /// The contract being invoked.
    pub contract: Address,
    /// Native value attached to the call, already credited to `contract`.
    pub value: U256,
}

/// A contract deployed on the simulated host.
pub trait ContractHandler: Send + Sync {
    fn invoke(
        &self,
        store: &mut dyn KeyValueStore,
        context: &CallContext,
        method: &str,
        params: &ParamMap,
    ) -> Result<(), CallError>;

    /// Token balance of `account`, for token contracts.
    fn balance_of(&self, _store: &dyn KeyValueStore, _account: &Address) -> Result<U256, CallError> {
        Ok(U256::zero())
    }
}

// =============================================================================
// PARAMETER ACCESS
// =============================================================================

/// Looks up a required argument.
pub fn arg<'p>(params: &'p ParamMap, method: &str, name: &str) -> Result<&'p ParamValue, CallError> {
    params.get(name).ok_or_else(|| CallError::InvalidParams {
        method: method.to_string(),
        reason: format!("missing argument {name}"),
    })
}

fn wrong_type(method: &str, name: &str, expected: &str) -> CallError {
    CallError::InvalidParams {
        method: method.to_string(),
        reason: format!("argument {name} must be {expected}"),
    }
}

pub fn address_arg(params: &ParamMap, method: &str, name: &str) -> Result<Address, CallError> {
    arg(params, method, name)?
        .as_address()
        .copied()
        .ok_or_else(|| wrong_type(method, name, "an Address"))
}

pub fn str_arg<'p>(params: &'p ParamMap, method: &str, name: &str) -> Result<&'p str, CallError> {
    arg(params, method, name)?
        .as_str()
        .ok_or_else(|| wrong_type(method, name, "a str"))
}

/// A non-negative `int` argument.
pub fn uint_arg(params: &ParamMap, method: &str, name: &str) -> Result<u128, CallError> {
    arg(params, method, name)?
        .as_int()
        .and_then(|v| u128::try_from(v).ok())
        .ok_or_else(|| wrong_type(method, name, "a non-negative int"))
}

// =============================================================================
// HOST
// =============================================================================

#[derive(Clone, Default)]
pub struct SimulatedHost {
    contracts: Arc<HashMap<Address, Arc<dyn ContractHandler>>>,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploys `handler` at `address`.
    #[must_use]
    pub fn with_contract(mut self, address: Address, handler: impl ContractHandler + 'static) -> Self {
        Arc::make_mut(&mut self.contracts).insert(address, Arc::new(handler));
        self
    }

    pub fn has_contract(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }

    fn handler(&self, address: &Address) -> Result<&Arc<dyn ContractHandler>, CallError> {
        self.contracts
            .get(address)
            .ok_or(CallError::ContractNotFound { address: *address })
    }

    fn native_balance(address: &Address) -> VarDb<U256> {
        VarDb::new(format!("HOST_NATIVE_BALANCE_{address}"))
    }

    fn pending_reward(address: &Address) -> VarDb<U256> {
        VarDb::new(format!("HOST_PENDING_REWARD_{address}"))
    }

    pub fn native_balance_of<S: KeyValueStore + ?Sized>(&self, store: &S, account: &Address) -> Result<U256, CallError> {
        Ok(Self::native_balance(account).get_or_default(store)?)
    }

    /// Mints native value into `account`.
    pub fn credit<S: KeyValueStore + ?Sized>(&self, store: &mut S, account: &Address, amount: U256) -> Result<(), CallError> {
        let slot = Self::native_balance(account);
        let balance = slot
            .get_or_default(store)?
            .checked_add(amount)
            .ok_or_else(|| CallError::Reverted {
                contract: *account,
                reason: "balance overflow".into(),
            })?;
        slot.set(store, &balance)?;
        Ok(())
    }

    /// Accrues a staking reward for `account`, paid out on the next claim.
    pub fn grant_reward<S: KeyValueStore + ?Sized>(&self, store: &mut S, account: &Address, amount: U256) -> Result<(), CallError> {
        let slot = Self::pending_reward(account);
        let pending = slot.get_or_default(store)?.saturating_add(amount);
        slot.set(store, &pending)?;
        Ok(())
    }

    fn move_native(
        &self,
        store: &mut dyn KeyValueStore,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<(), CallError> {
        let source = Self::native_balance(from);
        let available = source.get_or_default(store)?;
        if available < amount {
            return Err(CallError::InsufficientBalance {
                account: *from,
                required: amount,
                available,
            });
        }
        source.set(store, &(available - amount))?;
        self.credit(store, to, amount)?;
        trace!(%from, %to, %amount, "Native value moved");
        Ok(())
    }
}

impl CallHost for SimulatedHost {
    fn call(&self, store: &mut dyn KeyValueStore, call: &ContractCall) -> Result<(), CallError> {
        let handler = Arc::clone(self.handler(&call.to)?);
        if !call.amount.is_zero() {
            self.move_native(store, &call.from, &call.to, call.amount)?;
        }
        let context = CallContext {
            caller: call.from,
            contract: call.to,
            value: call.amount,
        };
        debug!(contract = %call.to, method = %call.method, "Contract call");
        handler.invoke(store, &context, &call.method, &call.params)
    }

    fn transfer(
        &self,
        store: &mut dyn KeyValueStore,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<(), CallError> {
        self.move_native(store, from, to, amount)
    }

    fn claim_reward(&self, store: &mut dyn KeyValueStore, account: &Address) -> Result<U256, CallError> {
        let slot = Self::pending_reward(account);
        let reward = slot.get_or_default(store)?;
        if !reward.is_zero() {
            slot.remove(store)?;
            self.credit(store, account, reward)?;
        }
        Ok(reward)
    }

    fn balance_of(
        &self,
        store: &dyn KeyValueStore,
        token: &Address,
        account: &Address,
    ) -> Result<U256, CallError> {
        if *token == Address::NATIVE_TOKEN {
            return self.native_balance_of(store, account);
        }
        self.handler(token)?.balance_of(store, account)
    }
}

// =============================================================================
// BUILT-IN CONTRACTS
// =============================================================================

/// Owner management exposed as a contract, callable by the wallet only, so
/// owners and quorum change through voted batches.
#[derive(Debug, Clone)]
pub struct OwnersManagerContract {
    registry: StoredOwnerRegistry,
    wallet: Address,
}

impl OwnersManagerContract {
    pub fn new(registry: StoredOwnerRegistry, wallet: Address) -> Self {
        Self { registry, wallet }
    }
}

impl ContractHandler for OwnersManagerContract {
    fn invoke(
        &self,
        store: &mut dyn KeyValueStore,
        context: &CallContext,
        method: &str,
        params: &ParamMap,
    ) -> Result<(), CallError> {
        if context.caller != self.wallet {
            return Err(CallError::Reverted {
                contract: context.contract,
                reason: format!("{} is not the wallet", context.caller),
            });
        }

        let uid_arg = |name: &str| -> Result<Uid, CallError> {
            Uid::try_from(uint_arg(params, method, name)?)
                .map_err(|_| wrong_type(method, name, "a valid owner uid"))
        };

        match method {
            "set_wallet_owners_required" => {
                let required = u64::try_from(uint_arg(params, method, "owners_required")?)
                    .map_err(|_| wrong_type(method, "owners_required", "a u64"))?;
                self.registry.set_required(store, required)?;
            }
            "add_wallet_owner" => {
                let address = address_arg(params, method, "address")?;
                let name = str_arg(params, method, "name")?;
                self.registry.add_owner(store, &address, name)?;
            }
            "remove_wallet_owner" => {
                self.registry
                    .remove_owner(store, uid_arg("wallet_owner_uid")?)?;
            }
            "replace_wallet_owner" => {
                let old = uid_arg("old_wallet_owner_uid")?;
                let address = address_arg(params, method, "new_address")?;
                let name = str_arg(params, method, "new_name")?;
                self.registry.replace_owner(store, old, &address, name)?;
            }
            _ => {
                return Err(CallError::MethodNotFound {
                    contract: context.contract,
                    method: method.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Balance tracking exposed as a contract, callable by the wallet only.
/// A token added here is snapshotted when the adding batch settles.
#[derive(Debug, Clone)]
pub struct BalanceTrackerContract {
    tracked: TrackedTokens,
    wallet: Address,
}

impl BalanceTrackerContract {
    pub fn new(wallet: Address) -> Self {
        Self {
            tracked: TrackedTokens::new(),
            wallet,
        }
    }
}

impl ContractHandler for BalanceTrackerContract {
    fn invoke(
        &self,
        store: &mut dyn KeyValueStore,
        context: &CallContext,
        method: &str,
        params: &ParamMap,
    ) -> Result<(), CallError> {
        if context.caller != self.wallet {
            return Err(CallError::Reverted {
                contract: context.contract,
                reason: format!("{} is not the wallet", context.caller),
            });
        }

        match method {
            "add_balance_tracker" => {
                let token = address_arg(params, method, "_token")?;
                if !self.tracked.add(store, &token)? {
                    return Err(CallError::Reverted {
                        contract: context.contract,
                        reason: format!("{token} is already tracked"),
                    });
                }
            }
            "remove_balance_tracker" => {
                let token = address_arg(params, method, "_token")?;
                self.tracked.remove(store, &token)?;
            }
            _ => {
                return Err(CallError::MethodNotFound {
                    contract: context.contract,
                    method: method.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Minimal fungible token: `transfer(_to, _value)` and balances.
#[derive(Debug, Clone)]
pub struct TokenContract {
    address: Address,
}

impl TokenContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    fn balance_slot(&self, account: &Address) -> VarDb<U256> {
        VarDb::new(format!("TOKEN_{}_balances_{account}", self.address))
    }

    pub fn mint<S: KeyValueStore + ?Sized>(&self, store: &mut S, account: &Address, amount: U256) -> Result<(), CallError> {
        let slot = self.balance_slot(account);
        let balance = slot.get_or_default(store)?.saturating_add(amount);
        slot.set(store, &balance)?;
        Ok(())
    }

    pub fn balance<S: KeyValueStore + ?Sized>(&self, store: &S, account: &Address) -> Result<U256, CallError> {
        Ok(self.balance_slot(account).get_or_default(store)?)
    }
}

impl ContractHandler for TokenContract {
    fn invoke(
        &self,
        store: &mut dyn KeyValueStore,
        context: &CallContext,
        method: &str,
        params: &ParamMap,
    ) -> Result<(), CallError> {
        if method != "transfer" {
            return Err(CallError::MethodNotFound {
                contract: self.address,
                method: method.to_string(),
            });
        }

        let to = address_arg(params, method, "_to")?;
        let value = U256::from(uint_arg(params, method, "_value")?);
        let from = context.caller;

        let available = self.balance(store, &from)?;
        if available < value {
            return Err(CallError::InsufficientBalance {
                account: from,
                required: value,
                available,
            });
        }
        self.balance_slot(&from).set(store, &(available - value))?;
        self.mint(store, &to, value)?;
        debug!(token = %self.address, %from, %to, %value, "Token transfer");
        Ok(())
    }

    fn balance_of(&self, store: &dyn KeyValueStore, account: &Address) -> Result<U256, CallError> {
        self.balance(store, account)
    }
}
