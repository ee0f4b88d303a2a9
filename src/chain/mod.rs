pub mod asset;
pub mod operations;
pub mod records;
pub mod transaction;

pub use asset::{Asset, Price};
pub use operations::{AccountUpdateOperation, FeedPublishOperation, Operation, WitnessUpdateOperation};
pub use records::{
    AccountRecord, Authority, ChainProperties, DynamicGlobalProperties, TransactionResult, WitnessRecord,
};
pub use transaction::Transaction;
