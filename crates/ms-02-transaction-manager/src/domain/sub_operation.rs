//! # Sub-Operation Records
//!
//! One call or transfer of an outgoing batch. A sub-operation is written once
//! when its parent batch is submitted and never modified afterwards.
//!
//! Fields are stored under `SUB_OUTGOING_TRANSACTION_{uid}_{field}`.

use crate::domain::codec::ParamMap;
use crate::domain::errors::{ManagerError, ManagerResult};
use crate::ports::outbound::ParamCodec;
use ms_01_ordered_storage::{KeyValueStore, StorageResult, VarDb};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Uid, U256};

/// Sequence the sub-operation UIDs are drawn from.
pub const SUB_OPERATION_SEQUENCE: &str = "SUB_OUTGOING_TRANSACTION_FACTORY";

/// Description of one sub-operation, as submitted by an owner.
///
/// `params` is the JSON text of a `[{name, type, value}]` list and is only
/// materialized right before the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubOperation {
    pub destination: Address,
    #[serde(default)]
    pub method_name: Option<String>,
    #[serde(default)]
    pub params: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: U256,
    #[serde(default)]
    pub description: String,
}

impl SubOperation {
    /// Value-only transfer.
    pub fn transfer(destination: Address, amount: U256) -> Self {
        Self {
            destination,
            method_name: None,
            params: None,
            amount,
            description: String::new(),
        }
    }

    /// Contract call without attached value.
    pub fn call(destination: Address, method_name: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            destination,
            method_name: Some(method_name.into()),
            params: Some(params.into()),
            amount: U256::zero(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_amount(mut self, amount: U256) -> Self {
        self.amount = amount;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Empty method names and parameter strings mean "absent".
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.method_name = self.method_name.filter(|m| !m.is_empty());
        self.params = self.params.filter(|p| !p.is_empty());
        self
    }

    /// Parses a submitted batch: a JSON array of sub-operations.
    pub fn parse_batch(json: &str) -> ManagerResult<Vec<SubOperation>> {
        let batch: Vec<SubOperation> =
            serde_json::from_str(json).map_err(|e| ManagerError::InvalidBatch(e.to_string()))?;
        Ok(batch.into_iter().map(SubOperation::normalized).collect())
    }

    /// True when the sub-operation invokes a contract method rather than
    /// moving value only.
    pub fn is_call(&self) -> bool {
        self.destination.is_contract() && self.method_name.is_some()
    }

    /// Materializes the parameters.
    pub fn decode_params<C: ParamCodec + ?Sized>(&self, codec: &C) -> ManagerResult<ParamMap> {
        match &self.params {
            Some(params) => Ok(codec.decode_params(params)?),
            None => Ok(ParamMap::new()),
        }
    }

    /// Checks the sub-operation can be executed later: parameters must
    /// convert, and account destinations accept value only.
    pub fn validate<C: ParamCodec + ?Sized>(&self, codec: &C) -> ManagerResult<()> {
        self.decode_params(codec)?;

        if !self.destination.is_contract() && (self.method_name.is_some() || self.params.is_some()) {
            return Err(ManagerError::InvalidSubOperation {
                destination: self.destination,
                reason: "cannot set a method name or params on a transfer to an account".into(),
            });
        }
        Ok(())
    }
}

fn deserialize_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(U256::from(n)),
        Raw::Text(text) => parse_amount(&text).map_err(de::Error::custom),
    }
}

/// Parses a decimal or `0x`-prefixed amount.
pub fn parse_amount(text: &str) -> Result<U256, String> {
    let text = text.trim();
    match text.strip_prefix("0x") {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).map_err(|e| e.to_string()),
        Some(_) => Err("missing digits after 0x".to_string()),
        None if text.is_empty() => Ok(U256::zero()),
        None => U256::from_dec_str(text).map_err(|e| e.to_string()),
    }
}

// =============================================================================
// PERSISTED RECORD
// =============================================================================

/// Stored fields of one sub-operation.
pub struct SubOperationRecord {
    uid: Uid,
    destination: VarDb<Address>,
    method_name: VarDb<String>,
    params: VarDb<String>,
    amount: VarDb<U256>,
    description: VarDb<String>,
}

impl SubOperationRecord {
    pub fn new(uid: Uid) -> Self {
        let name = format!("SUB_OUTGOING_TRANSACTION_{uid}");
        Self {
            uid,
            destination: VarDb::new(format!("{name}_destination")),
            method_name: VarDb::new(format!("{name}_method_name")),
            params: VarDb::new(format!("{name}_params")),
            amount: VarDb::new(format!("{name}_amount")),
            description: VarDb::new(format!("{name}_description")),
        }
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn build<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        operation: &SubOperation,
    ) -> StorageResult<()> {
        self.destination.set(store, &operation.destination)?;
        self.method_name
            .set(store, &operation.method_name.clone().unwrap_or_default())?;
        self.params
            .set(store, &operation.params.clone().unwrap_or_default())?;
        self.amount.set(store, &operation.amount)?;
        self.description.set(store, &operation.description)
    }

    pub fn load<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<SubOperation> {
        let destination = self.destination.get(store)?.ok_or_else(|| {
            ms_01_ordered_storage::StorageError::Corrupted {
                container: self.destination.key().to_string(),
                reason: "sub-operation has no destination".into(),
            }
        })?;

        Ok(SubOperation {
            destination,
            method_name: self.method_name.get(store)?,
            params: self.params.get(store)?,
            amount: self.amount.get_or_default(store)?,
            description: self.description.get_or_default(store)?,
        }
        .normalized())
    }

    pub fn view<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<SubOperationView> {
        Ok(SubOperationView {
            uid: self.uid,
            operation: self.load(store)?,
        })
    }
}

/// Read-side rendering of a stored sub-operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubOperationView {
    pub uid: Uid,
    #[serde(flatten)]
    pub operation: SubOperation,
}
