use clap::Subcommand;
use rust_decimal::Decimal;

use crate::cli::print_json;
use crate::client::NodeClient;
use crate::config::ChainConfig;
use crate::error::Result;
use crate::witness::{disable_witness, list_witnesses, publish_feed, update_witness, WitnessParams};

#[derive(Subcommand, Debug, Clone)]
pub enum WitnessCommands {
    /// Register a witness or change its parameters
    Update {
        account: String,
        private_active_key: String,
        /// Public block signing key
        #[arg(long)]
        signing_key: Option<String>,
        #[arg(long)]
        url: Option<String>,
        /// Account creation fee to advertise, e.g. "0.100 PULSE"
        #[arg(long)]
        creation_fee: Option<String>,
        #[arg(long)]
        block_size: Option<u32>,
        #[arg(long)]
        interest_rate: Option<u16>,
    },
    /// Stop producing blocks
    Disable {
        account: String,
        private_active_key: String,
    },
}

pub async fn handle_witness_command(client: &NodeClient, chain: &ChainConfig, cmd: WitnessCommands) -> Result<()> {
    let result = match cmd {
        WitnessCommands::Update {
            account,
            private_active_key,
            signing_key,
            url,
            creation_fee,
            block_size,
            interest_rate,
        } => {
            let params = WitnessParams {
                signing_key,
                url,
                creation_fee,
                block_size,
                interest_rate,
            };
            update_witness(client, client, chain, &account, &private_active_key, &params).await?
        }
        WitnessCommands::Disable { account, private_active_key } => {
            disable_witness(client, client, chain, &account, &private_active_key).await?
        }
    };
    print_json(&result)
}

pub async fn handle_feed(
    client: &NodeClient,
    chain: &ChainConfig,
    witness: &str,
    private_active_key: &str,
    base_price: Decimal,
) -> Result<()> {
    let result = publish_feed(client, client, chain, witness, private_active_key, base_price).await?;
    print_json(&result)
}

pub async fn handle_witnesses(client: &NodeClient, limit: u32) -> Result<()> {
    let witnesses = list_witnesses(client, limit).await?;

    println!("{:<4} {:<20} {:>24} {:<9} URL", "#", "WITNESS", "VOTES", "STATUS");
    println!("{}", "-".repeat(80));
    for (rank, w) in witnesses.iter().enumerate() {
        let votes = match w.other.get("votes") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "-".to_string(),
        };
        let status = if w.is_disabled() { "disabled" } else { "active" };
        println!("{:<4} {:<20} {:>24} {:<9} {}", rank + 1, w.owner, votes, status, w.url);
    }
    Ok(())
}
