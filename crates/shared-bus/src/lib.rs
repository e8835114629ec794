//! # Shared Bus - Wallet Event Bus
//!
//! Carries the audit events of the transaction ledger to any number of
//! in-process listeners.
//!
//! ```text
//! ┌────────────────────┐  publish()   ┌──────────────┐  subscribe()  ┌──────────┐
//! │ Transaction ledger │ ───────────→ │  Event Bus   │ ────────────→ │ Listener │
//! └────────────────────┘              └──────────────┘               └──────────┘
//! ```
//!
//! The ledger publishes only after an invocation has committed, so a
//! listener never observes an event whose writes were rolled back.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, WalletEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
