use tracing::{info, warn};

use crate::account::{Passphrase, Role, RoleKeySet};
use crate::chain::{AccountRecord, AccountUpdateOperation, Authority, Operation, TransactionResult};
use crate::client::TransactionSubmitter;
use crate::crypto::PrivateKey;
use crate::error::{KeysError, Result};

/// What a key rotation must carry over from the current record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreservedState {
    pub owner_account_auths: Vec<(String, u16)>,
    pub active_account_auths: Vec<(String, u16)>,
    pub posting_account_auths: Vec<(String, u16)>,
    pub json_metadata: String,
}

impl PreservedState {
    pub fn from_record(record: &AccountRecord) -> Self {
        Self {
            owner_account_auths: record.owner.account_auths.clone(),
            active_account_auths: record.active.account_auths.clone(),
            posting_account_auths: record.posting.account_auths.clone(),
            json_metadata: record.json_metadata.clone(),
        }
    }
}

pub fn confirm_passphrase(new: &Passphrase, confirmation: &Passphrase) -> Result<()> {
    if new.matches(confirmation) {
        Ok(())
    } else {
        Err(KeysError::PassphraseConfirmationMismatch)
    }
}

/// Replaces all four authorities of an account in one `account_update`.
pub struct AccountAuthorityUpdater<'a> {
    submitter: &'a dyn TransactionSubmitter,
}

impl<'a> AccountAuthorityUpdater<'a> {
    pub fn new(submitter: &'a dyn TransactionSubmitter) -> Self {
        Self { submitter }
    }

    pub fn build_operation(new_keys: &RoleKeySet, preserved: &PreservedState) -> AccountUpdateOperation {
        let authority = |role: Role, delegations: &[(String, u16)]| {
            Authority::single_key(new_keys.public_key(role).clone(), delegations.to_vec())
        };
        AccountUpdateOperation {
            account: new_keys.account().to_string(),
            owner: Some(authority(Role::Owner, &preserved.owner_account_auths)),
            active: Some(authority(Role::Active, &preserved.active_account_auths)),
            posting: Some(authority(Role::Posting, &preserved.posting_account_auths)),
            memo_key: new_keys.public_key(Role::Memo).clone(),
            json_metadata: preserved.json_metadata.clone(),
        }
    }

    /// Submit the rotation signed by the current owner key. The caller must
    /// already have verified that key; nothing is re-checked here, and a
    /// rejection is returned as-is without retrying.
    pub async fn rotate(
        &self,
        account: &str,
        old_owner_wif: &str,
        new_keys: &RoleKeySet,
        preserved: &PreservedState,
    ) -> Result<TransactionResult> {
        let signing_key = PrivateKey::from_wif(old_owner_wif)
            .map_err(|e| KeysError::SigningFailed(format!("owner key unusable: {}", e)))?;
        if new_keys.account() != account {
            return Err(KeysError::SigningFailed(format!(
                "new keys were derived for @{}, not @{}",
                new_keys.account(),
                account
            )));
        }

        let op = Self::build_operation(new_keys, preserved);
        match self.submitter.submit(Operation::AccountUpdate(op), &[signing_key]).await {
            Ok(result) => {
                info!(account, trx_id = %result.transaction_id, "Authorities rotated");
                Ok(result)
            }
            Err(e) => {
                warn!(account, error = %e, "Authority rotation failed");
                Err(e)
            }
        }
    }
}
