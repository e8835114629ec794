//! # Shared Types Crate
//!
//! Primitives shared by the storage, transaction manager and event bus crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: addresses, hashes and identifiers are defined
//!   once here and re-used everywhere.
//! - **Typed Addresses**: an `Address` knows whether it designates an account
//!   (`hx…`) or a contract (`cx…`); value-only transfers and contract calls are
//!   told apart from this bit alone.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
