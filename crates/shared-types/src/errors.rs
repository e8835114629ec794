//! # Error Types
//!
//! Parsing errors for the shared primitives.

use thiserror::Error;

/// Errors produced when parsing an [`Address`](crate::Address) from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    /// The address does not start with `hx` or `cx`.
    #[error("invalid address prefix: {0}")]
    InvalidPrefix(String),

    /// The body is not exactly 40 hex characters.
    #[error("invalid address length: expected 40 hex chars, got {0}")]
    InvalidLength(usize),

    /// The body is not valid hex.
    #[error("invalid address hex: {0}")]
    InvalidHex(String),
}

/// Errors produced when parsing a transaction hash from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashParseError {
    /// The body is not 64 hex characters.
    #[error("invalid hash length: expected 64 hex chars, got {0}")]
    InvalidLength(usize),

    /// The body is not valid hex.
    #[error("invalid hash hex: {0}")]
    InvalidHex(String),
}
