//! Cross-crate flows: storage, manager, bus and telemetry wired together.

pub mod properties;
pub mod wallet_flows;
