use serde::{Deserialize, Serialize};

use crate::chain::{AccountRecord, Authority};
use crate::crypto::PublicKey;
use crate::error::KeysError;

/// The four authority roles every account carries.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Active,
    Posting,
    Memo,
}

/// How a role is published on-chain.
#[derive(Debug, Clone, Copy)]
pub enum RoleAuthority<'a> {
    Threshold(&'a Authority),
    BareKey(&'a PublicKey),
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Owner, Role::Active, Role::Posting, Role::Memo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Active => "active",
            Role::Posting => "posting",
            Role::Memo => "memo",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Role::Owner => 0,
            Role::Active => 1,
            Role::Posting => 2,
            Role::Memo => 3,
        }
    }

    /// Where this role lives in an account record.
    pub fn authority<'a>(&self, record: &'a AccountRecord) -> RoleAuthority<'a> {
        match self {
            Role::Owner => RoleAuthority::Threshold(&record.owner),
            Role::Active => RoleAuthority::Threshold(&record.active),
            Role::Posting => RoleAuthority::Threshold(&record.posting),
            Role::Memo => RoleAuthority::BareKey(&record.memo_key),
        }
    }
}

impl RoleAuthority<'_> {
    /// True when `key` alone controls this role. Multi-key, weighted or
    /// higher-threshold authorities never match.
    pub fn is_satisfied_by(&self, key: &PublicKey) -> bool {
        match self {
            RoleAuthority::Threshold(authority) => authority.sole_simple_key() == Some(key),
            RoleAuthority::BareKey(published) => *published == key,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = KeysError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "active" => Ok(Role::Active),
            "posting" => Ok(Role::Posting),
            "memo" => Ok(Role::Memo),
            _ => Err(KeysError::UnknownRole(s.to_string())),
        }
    }
}
