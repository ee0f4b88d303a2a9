use tracing::info;

use crate::account::{
    confirm_passphrase, AccountAuthorityUpdater, AuthorityVerifier, KeyDeriver, Passphrase, PreservedState, Role,
    RoleKeySet,
};
use crate::chain::TransactionResult;
use crate::client::{LedgerQuery, TransactionSubmitter};
use crate::error::Result;

/// Outcome of a successful password change: the receipt and the keys now in force.
#[derive(Debug)]
pub struct PasswordChange {
    pub result: TransactionResult,
    pub keys: RoleKeySet,
}

/// Move an account from `current` to `new`.
///
/// Order matters: the confirmation is checked and the new keys are derived
/// before the ledger is touched, and nothing is submitted unless all four
/// current roles verify.
pub async fn change_password(
    ledger: &dyn LedgerQuery,
    submitter: &dyn TransactionSubmitter,
    prefix: &str,
    account: &str,
    current: &Passphrase,
    new: &Passphrase,
    confirmation: &Passphrase,
) -> Result<PasswordChange> {
    confirm_passphrase(new, confirmation)?;

    let deriver = KeyDeriver::new(prefix);
    let new_keys = RoleKeySet::build(&deriver, account, new)?;

    let verifier = AuthorityVerifier::new(ledger, deriver);
    let identity = verifier.verify_all(account, current).await?;

    let preserved = PreservedState::from_record(&identity.record);
    let owner_wif = identity.keys.private_key(Role::Owner).to_wif();
    let result = AccountAuthorityUpdater::new(submitter)
        .rotate(account, &owner_wif, &new_keys, &preserved)
        .await?;

    info!(account, block = result.block_num, "Password changed");
    Ok(PasswordChange { result, keys: new_keys })
}
