use thiserror::Error;

use crate::account::Role;

#[derive(Error, Debug)]
pub enum KeysError {
    #[error("Account @{0} does not exist on the ledger")]
    AccountNotFound(String),
    #[error("Account @{0} is not a registered witness")]
    WitnessNotFound(String),
    #[error("Secret cannot be used for key derivation: {0}")]
    InvalidPassphraseEncoding(String),
    #[error("Authority mismatch for @{account} on role(s): {}", format_roles(.roles))]
    RoleMismatch { account: String, roles: Vec<Role> },
    #[error("New password and its confirmation do not match")]
    PassphraseConfirmationMismatch,
    #[error("Signing failed: {0}")]
    SigningFailed(String),
    #[error("Ledger rejected the transaction: {0}")]
    SubmissionRejected(String),
    #[error("Ledger query unavailable: {0}")]
    VerificationUnavailable(String),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Unknown role '{0}'. Allowed: owner, active, posting, memo")]
    UnknownRole(String),
    #[error("Invalid asset amount: {0}")]
    InvalidAsset(String),
    #[error("Missing witness parameter: {0}")]
    MissingWitnessParameter(&'static str),
    #[error("Credentials path error: {0}")]
    CredentialsPath(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KeysError>;

fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl KeysError {
    /// Roles that failed verification, empty for every other error.
    pub fn mismatched_roles(&self) -> &[Role] {
        match self {
            KeysError::RoleMismatch { roles, .. } => roles,
            _ => &[],
        }
    }
}
