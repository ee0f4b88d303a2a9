// In-process ledger for tests: applies submitted operations so flows can be
// checked end to end without a node.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Map;

use crate::account::{Role, RoleKeySet};
use crate::chain::{
    AccountRecord, Authority, FeedPublishOperation, Operation, TransactionResult, WitnessRecord,
};
use crate::client::{LedgerQuery, TransactionSubmitter};
use crate::crypto::PrivateKey;
use crate::error::{KeysError, Result};

pub struct MemoryLedger {
    prefix: String,
    accounts: Mutex<HashMap<String, AccountRecord>>,
    witnesses: Mutex<HashMap<String, WitnessRecord>>,
    feeds: Mutex<Vec<FeedPublishOperation>>,
    reads: AtomicUsize,
    submissions: AtomicUsize,
    unavailable: AtomicBool,
    reject_next: Mutex<Option<String>>,
}

impl MemoryLedger {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            accounts: Mutex::new(HashMap::new()),
            witnesses: Mutex::new(HashMap::new()),
            feeds: Mutex::new(Vec::new()),
            reads: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
            reject_next: Mutex::new(None),
        }
    }

    pub fn insert_account(&self, record: AccountRecord) {
        self.accounts.lock().unwrap().insert(record.name.clone(), record);
    }

    pub fn insert_witness(&self, record: WitnessRecord) {
        self.witnesses.lock().unwrap().insert(record.owner.clone(), record);
    }

    pub fn account(&self, name: &str) -> Option<AccountRecord> {
        self.accounts.lock().unwrap().get(name).cloned()
    }

    pub fn witness(&self, name: &str) -> Option<WitnessRecord> {
        self.witnesses.lock().unwrap().get(name).cloned()
    }

    pub fn feeds(&self) -> Vec<FeedPublishOperation> {
        self.feeds.lock().unwrap().clone()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.read_count() + self.submit_count()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn reject_next(&self, reason: &str) {
        *self.reject_next.lock().unwrap() = Some(reason.to_string());
    }

    fn begin_read(&self) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(KeysError::VerificationUnavailable("node timed out".to_string()));
        }
        Ok(())
    }

    fn signed_by(&self, authority: &Authority, keys: &[PrivateKey]) -> bool {
        let signed: u32 = authority
            .key_auths
            .iter()
            .filter(|(key, _)| keys.iter().any(|k| &k.public_key(&self.prefix) == key))
            .map(|(_, weight)| *weight as u32)
            .sum();
        signed >= authority.weight_threshold
    }

    fn require_active(&self, account: &str, keys: &[PrivateKey]) -> Result<AccountRecord> {
        let record = self
            .account(account)
            .ok_or_else(|| KeysError::SubmissionRejected(format!("unknown account {}", account)))?;
        if !self.signed_by(&record.active, keys) && !self.signed_by(&record.owner, keys) {
            return Err(KeysError::SubmissionRejected(format!(
                "missing required active authority: {}",
                account
            )));
        }
        Ok(record)
    }

    fn apply(&self, op: Operation, keys: &[PrivateKey]) -> Result<()> {
        match op {
            Operation::AccountUpdate(update) => {
                let mut record = self.require_active(&update.account, keys)?;
                if update.changes_authorities() && !self.signed_by(&record.owner, keys) {
                    return Err(KeysError::SubmissionRejected(format!(
                        "missing required owner authority: {}",
                        update.account
                    )));
                }
                if let Some(owner) = update.owner {
                    record.owner = owner;
                }
                if let Some(active) = update.active {
                    record.active = active;
                }
                if let Some(posting) = update.posting {
                    record.posting = posting;
                }
                record.memo_key = update.memo_key;
                record.json_metadata = update.json_metadata;
                self.insert_account(record);
            }
            Operation::WitnessUpdate(update) => {
                self.require_active(&update.owner, keys)?;
                let other = self
                    .witness(&update.owner)
                    .map(|w| w.other)
                    .unwrap_or_default();
                self.insert_witness(WitnessRecord {
                    owner: update.owner,
                    url: update.url,
                    signing_key: update.block_signing_key,
                    props: update.props,
                    other,
                });
            }
            Operation::FeedPublish(feed) => {
                self.require_active(&feed.publisher, keys)?;
                if self.witness(&feed.publisher).is_none() {
                    return Err(KeysError::SubmissionRejected(format!(
                        "{} is not a witness",
                        feed.publisher
                    )));
                }
                self.feeds.lock().unwrap().push(feed);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerQuery for MemoryLedger {
    async fn get_account(&self, name: &str) -> Result<Option<AccountRecord>> {
        self.begin_read()?;
        Ok(self.account(name))
    }

    async fn get_witness(&self, name: &str) -> Result<Option<WitnessRecord>> {
        self.begin_read()?;
        Ok(self.witness(name))
    }

    async fn get_witnesses_by_vote(&self, limit: u32) -> Result<Vec<WitnessRecord>> {
        self.begin_read()?;
        let mut all: Vec<WitnessRecord> = self.witnesses.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.owner.cmp(&b.owner));
        all.truncate(limit as usize);
        Ok(all)
    }
}

#[async_trait]
impl TransactionSubmitter for MemoryLedger {
    async fn submit(&self, op: Operation, keys: &[PrivateKey]) -> Result<TransactionResult> {
        let block_num = self.submissions.fetch_add(1, Ordering::SeqCst) as u32 + 1;
        if let Some(reason) = self.reject_next.lock().unwrap().take() {
            return Err(KeysError::SubmissionRejected(reason));
        }
        self.apply(op, keys)?;
        Ok(TransactionResult {
            transaction_id: format!("{:040x}", block_num),
            block_num,
            trx_num: 0,
            expired: false,
        })
    }
}

/// An account whose on-chain authorities are exactly the given key set.
pub fn account_for(keys: &RoleKeySet) -> AccountRecord {
    AccountRecord {
        name: keys.account().to_string(),
        owner: Authority::single_key(keys.public_key(Role::Owner).clone(), vec![]),
        active: Authority::single_key(keys.public_key(Role::Active).clone(), vec![]),
        posting: Authority::single_key(keys.public_key(Role::Posting).clone(), vec![]),
        memo_key: keys.public_key(Role::Memo).clone(),
        json_metadata: String::new(),
        other: Map::new(),
    }
}
