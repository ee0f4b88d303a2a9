use crate::account::{fetch_profile, update_profile, AuthorityVerifier, KeyDeriver, ProfileUpdate};
use crate::cli::print_json;
use crate::client::NodeClient;
use crate::config::ChainConfig;
use crate::error::Result;

pub async fn handle_profile(client: &NodeClient, chain: &ChainConfig, account: &str, all: bool) -> Result<()> {
    if all {
        let verifier = AuthorityVerifier::new(client, KeyDeriver::new(&chain.prefix));
        let record = verifier.require_account(account).await?;
        return print_json(&record);
    }
    print_json(&fetch_profile(client, &chain.prefix, account).await?)
}

pub async fn handle_update_profile(
    client: &NodeClient,
    chain: &ChainConfig,
    account: &str,
    private_active_key: &str,
    update: &ProfileUpdate,
) -> Result<()> {
    let result = update_profile(client, client, &chain.prefix, account, private_active_key, update).await?;
    print_json(&result)
}
