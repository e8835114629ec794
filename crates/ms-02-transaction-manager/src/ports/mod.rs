//! # Ports Layer
//!
//! - `inbound.rs` - Driving ports (API exposed to the owning proxy)
//! - `outbound.rs` - Driven ports (collaborators required by the service)

pub mod inbound;
pub mod outbound;

pub use inbound::TransactionManagerApi;
pub use outbound::{BalanceTracker, CallHost, ContractCall, EventSink, OwnerRegistry, ParamCodec};
