//! Domain layer for the transaction manager subsystem.

pub mod codec;
pub mod entities;
pub mod errors;
pub mod factory;
pub mod records;
pub mod sub_operation;

pub use codec::{ParamMap, ParamValue, ScoreTypeCodec};
pub use entities::{Invocation, OutgoingState, TransactionType};
pub use errors::{
    CallError, CodecError, ManagerError, ManagerResult, OwnerRegistryError, SinkError,
    TrackerError,
};
pub use factory::{NewTransaction, TransactionFactory};
pub use records::{
    ClaimRewardTransaction, ClaimRewardView, HeaderView, IncomingTransaction, IncomingView,
    OutgoingTransaction, OutgoingView, TransactionHeader, TransactionRecord, TransactionView,
    TRANSACTION_SEQUENCE,
};
pub use sub_operation::{
    parse_amount, SubOperation, SubOperationRecord, SubOperationView, SUB_OPERATION_SEQUENCE,
};
