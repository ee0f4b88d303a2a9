use serde_json::{Map, Value};
use tracing::info;

use crate::account::{AuthorityVerifier, KeyDeriver, Role};
use crate::chain::{AccountRecord, AccountUpdateOperation, Operation, TransactionResult};
use crate::client::{LedgerQuery, TransactionSubmitter};
use crate::error::Result;

/// Profile fields to overwrite; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub about: Option<String>,
    pub location: Option<String>,
    pub profile_image: Option<String>,
    pub cover_image: Option<String>,
    pub website: Option<String>,
}

impl ProfileUpdate {
    fn fields(&self) -> [(&'static str, Option<&String>); 6] {
        [
            ("name", self.name.as_ref()),
            ("about", self.about.as_ref()),
            ("location", self.location.as_ref()),
            ("profile_image", self.profile_image.as_ref()),
            ("cover_image", self.cover_image.as_ref()),
            ("website", self.website.as_ref()),
        ]
    }

    pub fn apply(&self, profile: &mut Map<String, Value>) {
        for (key, value) in self.fields() {
            if let Some(value) = value {
                profile.insert(key.to_string(), Value::String(value.clone()));
            }
        }
    }
}

// json_metadata is free-form text; anything that is not a JSON object counts as empty
fn metadata_of(record: &AccountRecord) -> Map<String, Value> {
    match serde_json::from_str(&record.json_metadata) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

pub fn profile_of(record: &AccountRecord) -> Map<String, Value> {
    match metadata_of(record).remove("profile") {
        Some(Value::Object(profile)) => profile,
        _ => Map::new(),
    }
}

pub async fn fetch_profile(ledger: &dyn LedgerQuery, prefix: &str, account: &str) -> Result<Map<String, Value>> {
    let verifier = AuthorityVerifier::new(ledger, KeyDeriver::new(prefix));
    let record = verifier.require_account(account).await?;
    Ok(profile_of(&record))
}

/// Merge `update` into the on-chain profile, signed with the active key.
/// Authorities and memo key are left as they are.
pub async fn update_profile(
    ledger: &dyn LedgerQuery,
    submitter: &dyn TransactionSubmitter,
    prefix: &str,
    account: &str,
    active_wif: &str,
    update: &ProfileUpdate,
) -> Result<TransactionResult> {
    let verifier = AuthorityVerifier::new(ledger, KeyDeriver::new(prefix));
    let (record, active_key) = verifier.prove_private_key(account, active_wif, Role::Active).await?;

    let mut metadata = metadata_of(&record);
    let mut profile = profile_of(&record);
    update.apply(&mut profile);
    metadata.insert("profile".to_string(), Value::Object(profile));

    let op = AccountUpdateOperation {
        account: record.name.clone(),
        owner: None,
        active: None,
        posting: None,
        memo_key: record.memo_key.clone(),
        json_metadata: serde_json::to_string(&metadata)?,
    };
    let result = submitter.submit(Operation::AccountUpdate(op), &[active_key]).await?;
    info!(account, trx_id = %result.transaction_id, "Profile updated");
    Ok(result)
}
