//! # MultiSafe Test Suite
//!
//! Unified test crate exercising the ledger crates together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Wallet wiring shared by flows and benchmarks
//! └── integration/
//!     ├── wallet_flows.rs   # End-to-end proposal scenarios
//!     └── properties.rs     # Randomized lifecycle properties
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ms-tests
//!
//! # By category
//! cargo test -p ms-tests integration::wallet_flows
//! cargo test -p ms-tests integration::properties
//!
//! # Benchmarks
//! cargo bench -p ms-tests
//! ```

pub mod fixtures;
pub mod integration;
