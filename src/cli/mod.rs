pub mod keys;
pub mod profile;
pub mod witness;

use std::io::{self, BufRead, IsTerminal, Write};

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::account::{Passphrase, Role};
use crate::client::NodeClient;
use crate::config::PulsarConfig;
use crate::error::Result;

#[derive(Parser)]
#[command(name = "pulsar")]
#[command(about = "Pulsar account keys, authorities and witness tools", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults apply when it does not exist)
    #[arg(long, global = true, default_value = "pulsar.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify a password against all four roles and print the derived keys
    Keys {
        account: String,
        password: String,
    },
    /// Check that a private key controls one role of an account
    Check {
        account: String,
        private_key: String,
        /// owner, active, posting or memo
        #[arg(long, default_value = "active")]
        role: Role,
    },
    /// Replace every key of an account with ones derived from a new password
    ChangePassword {
        account: String,
        /// Save the new credentials to this file
        #[arg(long)]
        store_credentials: Option<String>,
    },
    /// Show an account's profile
    Profile {
        account: String,
        /// Print the whole account record instead
        #[arg(long)]
        all: bool,
    },
    /// Change profile fields; omitted fields keep their current value
    UpdateProfile {
        account: String,
        private_active_key: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        about: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        profile_image: Option<String>,
        #[arg(long)]
        cover_image: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },
    /// Witness registration and shutdown
    Witness {
        #[command(subcommand)]
        cmd: witness::WitnessCommands,
    },
    /// Publish a price feed: <base-price> EUR for 1.000 PULSE
    Feed {
        witness: String,
        private_active_key: String,
        base_price: Decimal,
    },
    /// List witnesses by vote
    Witnesses {
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
}

pub async fn run(cli: Cli, config: &PulsarConfig) -> Result<()> {
    let client = NodeClient::new(&config.chain, &config.node)?;
    let chain = &config.chain;

    match cli.command {
        Commands::Keys { account, password } => {
            keys::handle_keys(&client, chain, &account, Passphrase::new(password)).await
        }
        Commands::Check { account, private_key, role } => {
            keys::handle_check(&client, chain, &account, &private_key, role).await
        }
        Commands::ChangePassword { account, store_credentials } => {
            keys::handle_change_password(&client, chain, &account, store_credentials.as_deref()).await
        }
        Commands::Profile { account, all } => profile::handle_profile(&client, chain, &account, all).await,
        Commands::UpdateProfile {
            account,
            private_active_key,
            name,
            about,
            location,
            profile_image,
            cover_image,
            website,
        } => {
            let update = crate::account::ProfileUpdate {
                name,
                about,
                location,
                profile_image,
                cover_image,
                website,
            };
            profile::handle_update_profile(&client, chain, &account, &private_active_key, &update).await
        }
        Commands::Witness { cmd } => witness::handle_witness_command(&client, chain, cmd).await,
        Commands::Feed { witness, private_active_key, base_price } => {
            witness::handle_feed(&client, chain, &witness, &private_active_key, base_price).await
        }
        Commands::Witnesses { limit } => witness::handle_witnesses(&client, limit).await,
    }
}

/// Ask for a secret without echoing it. Piped input is read line by line so
/// scripts can still feed passwords through stdin.
pub(crate) fn prompt_secret(label: &str) -> Result<Passphrase> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(Passphrase::new(rpassword::prompt_password(label)?));
    }
    eprint!("{}", label);
    io::stderr().flush()?;
    read_secret(&mut stdin.lock())
}

fn read_secret(reader: &mut impl BufRead) -> Result<Passphrase> {
    // The line moves into the passphrase, which wipes it on drop.
    Ok(Passphrase::new(rpassword::read_password_from_bufread(reader)?))
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
