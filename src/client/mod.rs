// Ledger access: what the account and witness flows need from a node
use async_trait::async_trait;

use crate::chain::{AccountRecord, Operation, TransactionResult, WitnessRecord};
use crate::crypto::PrivateKey;
use crate::error::Result;

pub mod rpc_client;
#[cfg(test)]
pub mod memory;

pub use rpc_client::NodeClient;

/// Read-only view of ledger state. Every call is one fresh query.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    async fn get_account(&self, name: &str) -> Result<Option<AccountRecord>>;
    async fn get_witness(&self, name: &str) -> Result<Option<WitnessRecord>>;
    async fn get_witnesses_by_vote(&self, limit: u32) -> Result<Vec<WitnessRecord>>;
}

/// Signs and broadcasts a single operation, waiting for inclusion.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(&self, op: Operation, keys: &[PrivateKey]) -> Result<TransactionResult>;
}
