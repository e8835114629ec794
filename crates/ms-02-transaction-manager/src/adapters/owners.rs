//! # Stored Owner Registry
//!
//! Owner list and quorum kept in the ledger's own store:
//!
//! - `WALLET_OWNERS_MANAGER_wallet_owners`: owner UIDs, in insertion order
//! - `WALLET_OWNERS_MANAGER_ADDRESS_TO_UID_MAP_{address}`: reverse lookup
//! - `WALLET_OWNERS_MANAGER_wallet_owners_required`: quorum
//! - `WALLET_OWNER_{uid}_address` / `_name`: owner records
//!
//! Every mutation keeps `0 < required <= owners <= max_owners`.

use crate::domain::errors::OwnerRegistryError;
use crate::ports::outbound::OwnerRegistry;
use ms_01_ordered_storage::{IdFactory, KeyValueStore, UidLinkedListDb, VarDb};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Uid};
use tracing::{debug, info};

const NAME: &str = "WALLET_OWNERS_MANAGER";
const OWNER_SEQUENCE: &str = "WALLET_OWNER_FACTORY";

/// Upper bound on the number of owners.
pub const MAX_WALLET_OWNERS: usize = 100;

/// A registered owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletOwner {
    pub uid: Uid,
    pub address: Address,
    pub name: String,
}

struct OwnerFields {
    address: VarDb<Address>,
    name: VarDb<String>,
}

impl OwnerFields {
    fn new(uid: Uid) -> Self {
        let name = format!("WALLET_OWNER_{uid}");
        Self {
            address: VarDb::new(format!("{name}_address")),
            name: VarDb::new(format!("{name}_name")),
        }
    }
}

type RegistryResult<T> = Result<T, OwnerRegistryError>;

#[derive(Debug, Clone)]
pub struct StoredOwnerRegistry {
    max_owners: usize,
}

impl Default for StoredOwnerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StoredOwnerRegistry {
    pub fn new() -> Self {
        Self {
            max_owners: MAX_WALLET_OWNERS,
        }
    }

    #[must_use]
    pub fn with_max_owners(mut self, max_owners: usize) -> Self {
        self.max_owners = max_owners;
        self
    }

    fn owner_list(&self) -> UidLinkedListDb {
        UidLinkedListDb::new(&format!("{NAME}_wallet_owners"))
    }

    fn required_field(&self) -> VarDb<u64> {
        VarDb::new(format!("{NAME}_wallet_owners_required"))
    }

    fn address_slot(&self, address: &Address) -> VarDb<Uid> {
        VarDb::new(format!("{NAME}_ADDRESS_TO_UID_MAP_{address}"))
    }

    fn check_requirements(&self, owners: usize, required: u64) -> RegistryResult<()> {
        if owners == 0 || owners > self.max_owners || required == 0 || required > owners as u64 {
            return Err(OwnerRegistryError::InvalidRequirements { owners, required });
        }
        Ok(())
    }

    fn check_address_free<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
        address: &Address,
    ) -> RegistryResult<()> {
        if self.is_owner(store, address)? {
            return Err(OwnerRegistryError::OwnerAlreadyExists { address: *address });
        }
        Ok(())
    }

    fn create_owner<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        address: &Address,
        name: &str,
    ) -> RegistryResult<Uid> {
        let uid = IdFactory::new(OWNER_SEQUENCE).get_uid(store)?;
        let fields = OwnerFields::new(uid);
        fields.address.set(store, address)?;
        fields.name.set(store, &name.to_string())?;

        self.owner_list().append(store, uid)?;
        self.address_slot(address).set(store, &uid)?;
        debug!(owner = uid, %address, "Wallet owner added");
        Ok(uid)
    }

    fn delete_owner<S: KeyValueStore + ?Sized>(&self, store: &mut S, uid: Uid) -> RegistryResult<()> {
        let owner = self.owner(store, uid)?;
        self.owner_list().remove(store, uid)?;
        self.address_slot(&owner.address).remove(store)?;
        debug!(owner = uid, address = %owner.address, "Wallet owner removed");
        Ok(())
    }

    /// Registers the initial owners and quorum.
    pub fn install<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        owners: &[(Address, String)],
        required: u64,
    ) -> RegistryResult<Vec<Uid>> {
        self.check_requirements(owners.len(), required)?;
        for (index, (address, _)) in owners.iter().enumerate() {
            self.check_address_free(store, address)?;
            if owners[..index].iter().any(|(other, _)| other == address) {
                return Err(OwnerRegistryError::OwnerAlreadyExists { address: *address });
            }
        }

        self.required_field().set(store, &required)?;
        let uids = owners
            .iter()
            .map(|(address, name)| self.create_owner(store, address, name))
            .collect::<RegistryResult<Vec<_>>>()?;
        info!(owners = uids.len(), required, "Wallet owners installed");
        Ok(uids)
    }

    pub fn add_owner<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        address: &Address,
        name: &str,
    ) -> RegistryResult<Uid> {
        self.check_requirements(self.count(store)? + 1, self.required(store)?)?;
        self.check_address_free(store, address)?;
        self.create_owner(store, address, name)
    }

    pub fn remove_owner<S: KeyValueStore + ?Sized>(&self, store: &mut S, uid: Uid) -> RegistryResult<()> {
        self.owner(store, uid)?;
        let remaining = self.count(store)?.saturating_sub(1);
        self.check_requirements(remaining, self.required(store)?)?;
        self.delete_owner(store, uid)
    }

    /// Swaps an owner for a new one. The new owner gets a fresh UID.
    pub fn replace_owner<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        old_uid: Uid,
        new_address: &Address,
        new_name: &str,
    ) -> RegistryResult<Uid> {
        let old = self.owner(store, old_uid)?;
        if old.address != *new_address {
            self.check_address_free(store, new_address)?;
        }
        self.delete_owner(store, old_uid)?;
        self.create_owner(store, new_address, new_name)
    }

    pub fn set_required<S: KeyValueStore + ?Sized>(&self, store: &mut S, required: u64) -> RegistryResult<()> {
        self.check_requirements(self.count(store)?, required)?;
        self.required_field().set(store, &required)?;
        info!(required, "Wallet owners required changed");
        Ok(())
    }

    pub fn owner<S: KeyValueStore + ?Sized>(&self, store: &S, uid: Uid) -> RegistryResult<WalletOwner> {
        if !self.owner_list().contains(store, uid)? {
            return Err(OwnerRegistryError::OwnerUidNotFound { uid });
        }
        let fields = OwnerFields::new(uid);
        let address = fields
            .address
            .get(store)?
            .ok_or(OwnerRegistryError::OwnerUidNotFound { uid })?;
        Ok(WalletOwner {
            uid,
            address,
            name: fields.name.get_or_default(store)?,
        })
    }

    /// One page of owners, in insertion order.
    pub fn owners<S: KeyValueStore + ?Sized>(&self, store: &S, offset: usize) -> RegistryResult<Vec<WalletOwner>> {
        self.owner_list()
            .select(store, offset, None)?
            .into_iter()
            .map(|uid| self.owner(store, uid))
            .collect()
    }

    pub fn owner_uid<S: KeyValueStore + ?Sized>(&self, store: &S, address: &Address) -> RegistryResult<Uid> {
        self.address_slot(address)
            .get(store)?
            .ok_or(OwnerRegistryError::OwnerNotFound { address: *address })
    }

    pub fn is_owner<S: KeyValueStore + ?Sized>(&self, store: &S, address: &Address) -> RegistryResult<bool> {
        Ok(self.address_slot(address).is_set(store)?)
    }

    pub fn count<S: KeyValueStore + ?Sized>(&self, store: &S) -> RegistryResult<usize> {
        Ok(self.owner_list().len(store)?)
    }

    pub fn required<S: KeyValueStore + ?Sized>(&self, store: &S) -> RegistryResult<u64> {
        Ok(self.required_field().get_or_default(store)?)
    }
}

impl OwnerRegistry for StoredOwnerRegistry {
    fn quorum(&self, store: &dyn KeyValueStore) -> Result<u64, OwnerRegistryError> {
        match self.required_field().get(store)? {
            Some(required) => Ok(required),
            None => Err(OwnerRegistryError::InvalidRequirements {
                owners: self.count(store)?,
                required: 0,
            }),
        }
    }

    fn owner_id(&self, store: &dyn KeyValueStore, address: &Address) -> Result<Uid, OwnerRegistryError> {
        self.owner_uid(store, address)
    }
}
