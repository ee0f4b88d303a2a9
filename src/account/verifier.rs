use tracing::{debug, warn};

use crate::account::{KeyDeriver, Passphrase, Role, RoleKeySet};
use crate::chain::{AccountRecord, WitnessRecord};
use crate::client::LedgerQuery;
use crate::crypto::PrivateKey;
use crate::error::{KeysError, Result};

/// An account whose four authorities were just shown to match a key set.
/// Built per request; holds the record snapshot it was checked against.
#[derive(Debug, Clone)]
pub struct AccountIdentity {
    pub record: AccountRecord,
    pub keys: RoleKeySet,
}

impl AccountIdentity {
    pub fn account(&self) -> &str {
        &self.record.name
    }
}

/// Checks secrets against the authorities currently published on-chain.
pub struct AuthorityVerifier<'a> {
    ledger: &'a dyn LedgerQuery,
    deriver: KeyDeriver,
}

impl<'a> AuthorityVerifier<'a> {
    pub fn new(ledger: &'a dyn LedgerQuery, deriver: KeyDeriver) -> Self {
        Self { ledger, deriver }
    }

    pub fn deriver(&self) -> &KeyDeriver {
        &self.deriver
    }

    pub async fn require_account(&self, name: &str) -> Result<AccountRecord> {
        self.ledger
            .get_account(name)
            .await?
            .ok_or_else(|| KeysError::AccountNotFound(name.to_string()))
    }

    pub async fn require_witness(&self, name: &str) -> Result<WitnessRecord> {
        self.ledger
            .get_witness(name)
            .await?
            .ok_or_else(|| KeysError::WitnessNotFound(name.to_string()))
    }

    /// Does the key derived for `role` control that role right now?
    pub async fn verify_role(&self, account: &str, passphrase: &Passphrase, role: Role) -> Result<bool> {
        let pair = self.deriver.derive(account, passphrase, role)?;
        let record = self.require_account(account).await?;
        let matched = role.authority(&record).is_satisfied_by(&pair.public);
        debug!(account, %role, matched, "Role verified");
        Ok(matched)
    }

    /// All four roles must match, checked against a single snapshot.
    pub async fn verify_all(&self, account: &str, passphrase: &Passphrase) -> Result<AccountIdentity> {
        let keys = RoleKeySet::build(&self.deriver, account, passphrase)?;
        let record = self.require_account(account).await?;

        let failed: Vec<Role> = keys
            .iter()
            .filter(|(role, pair)| !role.authority(&record).is_satisfied_by(&pair.public))
            .map(|(role, _)| role)
            .collect();
        if !failed.is_empty() {
            warn!(account, roles = ?failed, "Derived keys do not match on-chain authorities");
            return Err(KeysError::RoleMismatch {
                account: account.to_string(),
                roles: failed,
            });
        }

        debug!(account, "All roles verified");
        Ok(AccountIdentity { record, keys })
    }

    /// Like [`verify_all`](Self::verify_all), for a master password in WIF
    /// form (optionally `P`-prefixed). Anything else is refused before the
    /// ledger is consulted.
    pub async fn verify_wif(&self, account: &str, secret: &Passphrase) -> Result<AccountIdentity> {
        let text = secret.expose();
        let wif = text.strip_prefix('P').unwrap_or(text);
        if PrivateKey::from_wif(wif).is_err() {
            return Err(KeysError::InvalidPassphraseEncoding(
                "expected a WIF-encoded master password".to_string(),
            ));
        }
        self.verify_all(account, secret).await
    }

    /// Does this role's own private key (not a master password) control the role?
    pub async fn verify_private_key(&self, account: &str, wif: &str, role: Role) -> Result<bool> {
        let private = PrivateKey::from_wif(wif)?;
        let record = self.require_account(account).await?;
        Ok(role
            .authority(&record)
            .is_satisfied_by(&private.public_key(self.deriver.prefix())))
    }

    /// Parse `wif`, check it controls `role`, and hand back the key together
    /// with the record it was checked against.
    pub async fn prove_private_key(
        &self,
        account: &str,
        wif: &str,
        role: Role,
    ) -> Result<(AccountRecord, PrivateKey)> {
        let private = PrivateKey::from_wif(wif)?;
        let record = self.require_account(account).await?;
        if !role
            .authority(&record)
            .is_satisfied_by(&private.public_key(self.deriver.prefix()))
        {
            warn!(account, %role, "Private key does not match on-chain authority");
            return Err(KeysError::RoleMismatch {
                account: account.to_string(),
                roles: vec![role],
            });
        }
        Ok((record, private))
    }
}
