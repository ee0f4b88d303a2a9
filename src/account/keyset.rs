use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::account::{KeyDeriver, Passphrase, Role};
use crate::crypto::{KeyPair, PrivateKey, PublicKey};
use crate::error::{KeysError, Result};

/// All four role keys of one account, derived from one passphrase.
#[derive(Clone, Debug)]
pub struct RoleKeySet {
    account: String,
    passphrase: Passphrase,
    pairs: [KeyPair; 4],
}

impl RoleKeySet {
    /// Derive every role; either all four succeed or none is returned.
    pub fn build(deriver: &KeyDeriver, account: &str, passphrase: &Passphrase) -> Result<Self> {
        let [owner, active, posting, memo] =
            Role::ALL.map(|role| deriver.derive(account, passphrase, role));
        Ok(Self {
            account: account.to_string(),
            passphrase: passphrase.clone(),
            pairs: [owner?, active?, posting?, memo?],
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn passphrase(&self) -> &Passphrase {
        &self.passphrase
    }

    pub fn get(&self, role: Role) -> &KeyPair {
        &self.pairs[role.index()]
    }

    pub fn public_key(&self, role: Role) -> &PublicKey {
        &self.get(role).public
    }

    pub fn private_key(&self, role: Role) -> &PrivateKey {
        &self.get(role).private
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &KeyPair)> {
        Role::ALL.into_iter().zip(self.pairs.iter())
    }

    pub fn export_credentials(&self) -> Credentials {
        let entries = |role: Role| {
            let pair = self.get(role);
            vec![
                CredentialEntry { kind: KeyKind::Public, value: pair.public.to_string() },
                CredentialEntry { kind: KeyKind::Private, value: pair.private.to_wif() },
            ]
        };
        Credentials {
            name: self.account.clone(),
            wif: self.passphrase.expose().to_string(),
            owner: entries(Role::Owner),
            active: entries(Role::Active),
            posting: entries(Role::Posting),
            memo: entries(Role::Memo),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Public,
    Private,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CredentialEntry {
    #[serde(rename = "type")]
    pub kind: KeyKind,
    pub value: String,
}

/// Credential file layout shared with the wallet tooling.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub name: String,
    pub wif: String,
    pub owner: Vec<CredentialEntry>,
    pub active: Vec<CredentialEntry>,
    pub posting: Vec<CredentialEntry>,
    pub memo: Vec<CredentialEntry>,
}

impl Credentials {
    pub fn entries(&self, role: Role) -> &[CredentialEntry] {
        match role {
            Role::Owner => &self.owner,
            Role::Active => &self.active,
            Role::Posting => &self.posting,
            Role::Memo => &self.memo,
        }
    }

    pub fn value(&self, role: Role, kind: KeyKind) -> Option<&str> {
        self.entries(role)
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.value.as_str())
    }

    /// A file can be written at `path`: it already exists, or its directory does.
    pub fn check_destination(path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        match path.parent() {
            Some(dir) if dir.as_os_str().is_empty() || dir.is_dir() => Ok(()),
            Some(dir) => Err(KeysError::CredentialsPath(format!(
                "There's no such directory {}",
                dir.display()
            ))),
            None => Err(KeysError::CredentialsPath(format!("{} is not a file path", path.display()))),
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        Self::check_destination(path)?;
        let json = serde_json::to_string_pretty(self)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        // `mode` only applies on creation; an existing file is narrowed before any key lands in it.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        info!(account = %self.name, path = %path.display(), "Credentials stored");
        Ok(())
    }
}
