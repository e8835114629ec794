//! # Core Domain Entities
//!
//! Primitives used by every wallet crate.
//!
//! ## Clusters
//!
//! - **Identity**: `Address`, `AddressKind`
//! - **Provenance**: `TxHash`, `Timestamp`
//! - **Bookkeeping**: `Uid`, `U256`

use crate::errors::{AddressParseError, HashParseError};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// Re-export U256 from primitive-types for amounts across all crates
pub use primitive_types::U256;

/// Allocator-issued unique identifier (transaction UID, owner UID, node ID).
pub type Uid = u64;

/// Host timestamp in microseconds since the unix epoch.
pub type Timestamp = u64;

// =============================================================================
// ADDRESS
// =============================================================================

/// Whether an address designates an externally owned account or a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AddressKind {
    /// Externally owned account, rendered with the `hx` prefix.
    Account,
    /// Contract, rendered with the `cx` prefix.
    Contract,
}

impl AddressKind {
    const fn prefix(self) -> &'static str {
        match self {
            AddressKind::Account => "hx",
            AddressKind::Contract => "cx",
        }
    }
}

/// A 20-byte address tagged with its kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    kind: AddressKind,
    bytes: [u8; 20],
}

impl Address {
    /// The well-known address used as the token of native-value movements.
    pub const NATIVE_TOKEN: Self = Self::contract([0u8; 20]);

    /// The well-known system contract (reward source).
    pub const SYSTEM: Self = Self::contract([0u8; 20]);

    /// Creates an account address.
    #[must_use]
    pub const fn account(bytes: [u8; 20]) -> Self {
        Self {
            kind: AddressKind::Account,
            bytes,
        }
    }

    /// Creates a contract address.
    #[must_use]
    pub const fn contract(bytes: [u8; 20]) -> Self {
        Self {
            kind: AddressKind::Contract,
            bytes,
        }
    }

    /// Convenience constructor filling every byte with `byte`.
    #[must_use]
    pub const fn account_from_byte(byte: u8) -> Self {
        Self::account([byte; 20])
    }

    /// Convenience constructor filling every byte with `byte`.
    #[must_use]
    pub const fn contract_from_byte(byte: u8) -> Self {
        Self::contract([byte; 20])
    }

    /// Returns the address kind.
    #[must_use]
    pub const fn kind(&self) -> AddressKind {
        self.kind
    }

    /// Returns true if the address designates a contract.
    #[must_use]
    pub const fn is_contract(&self) -> bool {
        matches!(self.kind, AddressKind::Contract)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.bytes
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), hex::encode(self.bytes))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = if s.starts_with("hx") {
            AddressKind::Account
        } else if s.starts_with("cx") {
            AddressKind::Contract
        } else {
            return Err(AddressParseError::InvalidPrefix(s.to_string()));
        };

        let body = &s[2..];
        if body.len() != 40 {
            return Err(AddressParseError::InvalidLength(body.len()));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        Ok(Self { kind, bytes })
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// TRANSACTION HASH
// =============================================================================

/// Hash of the host transaction that carried an invocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Returns true if this is the zero hash.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for TxHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        if body.len() != 64 {
            return Err(HashParseError::InvalidLength(body.len()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| HashParseError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 32]> for TxHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// TESTS
// =============================================================================
