//! Ledger state as returned by the node's condenser API.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chain::asset::Asset;
use crate::crypto::PublicKey;
use crate::encoding::{write_varint, GrapheneSerialize};

/// Weighted threshold authority for one account role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub weight_threshold: u32,
    #[serde(default)]
    pub account_auths: Vec<(String, u16)>,
    #[serde(default)]
    pub key_auths: Vec<(PublicKey, u16)>,
}

impl Authority {
    /// Threshold 1 with `key` as the only weight-1 key, next to the given
    /// account delegations.
    pub fn single_key(key: PublicKey, account_auths: Vec<(String, u16)>) -> Self {
        Self {
            weight_threshold: 1,
            account_auths,
            key_auths: vec![(key, 1)],
        }
    }

    /// The key that alone satisfies this authority, if its shape is exactly
    /// threshold 1 with one weight-1 key. Account delegations do not count.
    pub fn sole_simple_key(&self) -> Option<&PublicKey> {
        match self.key_auths.as_slice() {
            [(key, 1)] if self.weight_threshold == 1 => Some(key),
            _ => None,
        }
    }
}

impl GrapheneSerialize for Authority {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.weight_threshold.graphene_serialize(writer)?;

        // flat_map on the node side, so entries go out sorted
        let mut accounts: Vec<&(String, u16)> = self.account_auths.iter().collect();
        accounts.sort_by(|a, b| a.0.cmp(&b.0));
        write_varint(writer, accounts.len() as u64)?;
        for entry in accounts {
            entry.graphene_serialize(writer)?;
        }

        let mut keys: Vec<&(PublicKey, u16)> = self.key_auths.iter().collect();
        keys.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        write_varint(writer, keys.len() as u64)?;
        for entry in keys {
            entry.graphene_serialize(writer)?;
        }
        Ok(())
    }
}

/// An account as published on-chain. Fields this crate does not interpret
/// are kept in `other` so the full record can be shown back to the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub name: String,
    pub owner: Authority,
    pub active: Authority,
    pub posting: Authority,
    pub memo_key: PublicKey,
    #[serde(default)]
    pub json_metadata: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Witness parameters voted on by block producers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProperties {
    pub account_creation_fee: Asset,
    pub maximum_block_size: u32,
    pub sbd_interest_rate: u16,
}

impl GrapheneSerialize for ChainProperties {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.account_creation_fee.graphene_serialize(writer)?;
        self.maximum_block_size.graphene_serialize(writer)?;
        self.sbd_interest_rate.graphene_serialize(writer)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WitnessRecord {
    pub owner: String,
    #[serde(default)]
    pub url: String,
    pub signing_key: PublicKey,
    pub props: ChainProperties,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl WitnessRecord {
    pub fn is_disabled(&self) -> bool {
        self.signing_key.is_null()
    }
}

/// The subset of `get_dynamic_global_properties` needed for TaPoS.
#[derive(Clone, Debug, Deserialize)]
pub struct DynamicGlobalProperties {
    pub head_block_number: u32,
    pub head_block_id: String,
    pub time: String,
}

/// Broadcast receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    #[serde(rename = "id")]
    pub transaction_id: String,
    pub block_num: u32,
    pub trx_num: u32,
    #[serde(default)]
    pub expired: bool,
}
