use std::path::Path;

use crate::account::{change_password, AuthorityVerifier, Credentials, KeyDeriver, Passphrase, Role};
use crate::cli::{print_json, prompt_secret};
use crate::client::NodeClient;
use crate::config::ChainConfig;
use crate::error::{KeysError, Result};

pub async fn handle_keys(client: &NodeClient, chain: &ChainConfig, account: &str, password: Passphrase) -> Result<()> {
    let verifier = AuthorityVerifier::new(client, KeyDeriver::new(&chain.prefix));
    let identity = verifier.verify_all(account, &password).await?;
    print_json(&identity.keys.export_credentials())
}

pub async fn handle_check(
    client: &NodeClient,
    chain: &ChainConfig,
    account: &str,
    private_key: &str,
    role: Role,
) -> Result<()> {
    let verifier = AuthorityVerifier::new(client, KeyDeriver::new(&chain.prefix));
    if verifier.verify_private_key(account, private_key, role).await? {
        println!("Key proves {} authority for @{}", role, account);
        Ok(())
    } else {
        Err(KeysError::RoleMismatch {
            account: account.to_string(),
            roles: vec![role],
        })
    }
}

pub async fn handle_change_password(
    client: &NodeClient,
    chain: &ChainConfig,
    account: &str,
    store_credentials: Option<&str>,
) -> Result<()> {
    // Fail on a bad destination before any secret is typed.
    if let Some(path) = store_credentials {
        Credentials::check_destination(Path::new(path))?;
    }

    let verifier = AuthorityVerifier::new(client, KeyDeriver::new(&chain.prefix));
    let record = verifier.require_account(account).await?;

    let current = prompt_secret(&format!("Current password for @{}: ", record.name))?;
    let new = prompt_secret(&format!("New password for @{}: ", record.name))?;
    let repeat = prompt_secret(&format!("Repeat new password for @{}: ", record.name))?;

    let change = change_password(client, client, &chain.prefix, &record.name, &current, &new, &repeat).await?;
    print_json(&change.result)?;

    let credentials = change.keys.export_credentials();
    if let Some(path) = store_credentials {
        credentials.write_to(Path::new(path))?;
    }
    print_json(&credentials)
}
