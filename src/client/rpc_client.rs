// JSON-RPC client for a node's condenser API
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::chain::{
    AccountRecord, DynamicGlobalProperties, Operation, Transaction, TransactionResult, WitnessRecord,
};
use crate::client::{LedgerQuery, TransactionSubmitter};
use crate::config::{ChainConfig, NodeConfig};
use crate::crypto::PrivateKey;
use crate::error::{KeysError, Result};

/// Why a call did not produce a result.
#[derive(Debug)]
enum RpcFailure {
    /// Connection, timeout or undecodable reply.
    Transport(String),
    /// The node answered with a JSON-RPC error object.
    Remote(String),
}

impl RpcFailure {
    fn into_read_error(self) -> KeysError {
        match self {
            RpcFailure::Transport(msg) | RpcFailure::Remote(msg) => KeysError::VerificationUnavailable(msg),
        }
    }

    fn into_submit_error(self) -> KeysError {
        match self {
            RpcFailure::Transport(msg) | RpcFailure::Remote(msg) => KeysError::SubmissionRejected(msg),
        }
    }
}

pub struct NodeClient {
    url: String,
    client: Client,
    request_id: AtomicU64,
    chain_id: [u8; 32],
    expiration_secs: u32,
}

impl NodeClient {
    pub fn new(chain: &ChainConfig, node: &NodeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(node.timeout_secs))
            .build()
            .map_err(|e| KeysError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            url: node.url.clone(),
            client,
            request_id: AtomicU64::new(1),
            chain_id: chain.chain_id_bytes()?,
            expiration_secs: chain.expiration_secs,
        })
    }

    async fn send_request(&self, method: &str, params: Value) -> std::result::Result<Value, RpcFailure> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        debug!(method, id, "RPC request");

        let response = self.client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(format!("RPC request to {} failed: {}", self.url, e)))?;

        let json: Value = response.json().await
            .map_err(|e| RpcFailure::Transport(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = json.get("error") {
            let message = error["message"].as_str().unwrap_or("Unknown error").to_string();
            return Err(RpcFailure::Remote(message));
        }

        Ok(json["result"].clone())
    }

    async fn query<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let result = self.send_request(method, params).await.map_err(RpcFailure::into_read_error)?;
        serde_json::from_value(result)
            .map_err(|e| KeysError::VerificationUnavailable(format!("unexpected {} reply: {}", method, e)))
    }

    pub async fn get_dynamic_global_properties(&self) -> Result<DynamicGlobalProperties> {
        self.query("condenser_api.get_dynamic_global_properties", json!([])).await
    }
}

#[async_trait]
impl LedgerQuery for NodeClient {
    async fn get_account(&self, name: &str) -> Result<Option<AccountRecord>> {
        let mut accounts: Vec<AccountRecord> = self
            .query("condenser_api.get_accounts", json!([[name]]))
            .await?;
        Ok(accounts.pop().filter(|a| a.name == name))
    }

    async fn get_witness(&self, name: &str) -> Result<Option<WitnessRecord>> {
        self.query("condenser_api.get_witness_by_account", json!([name])).await
    }

    async fn get_witnesses_by_vote(&self, limit: u32) -> Result<Vec<WitnessRecord>> {
        self.query("condenser_api.get_witnesses_by_vote", json!(["", limit])).await
    }
}

#[async_trait]
impl TransactionSubmitter for NodeClient {
    async fn submit(&self, op: Operation, keys: &[PrivateKey]) -> Result<TransactionResult> {
        let op_name = op.name();
        let head = self.get_dynamic_global_properties().await?;
        let mut tx = Transaction::from_head(&head, self.expiration_secs, vec![op])?;
        tx.sign(&self.chain_id, keys)?;

        let result = self
            .send_request("condenser_api.broadcast_transaction_synchronous", json!([tx]))
            .await
            .map_err(RpcFailure::into_submit_error)?;
        let receipt: TransactionResult = serde_json::from_value(result)
            .map_err(|e| KeysError::SubmissionRejected(format!("unexpected broadcast reply: {}", e)))?;

        info!(
            op = op_name,
            trx_id = %receipt.transaction_id,
            block = receipt.block_num,
            "Transaction included"
        );
        Ok(receipt)
    }
}
