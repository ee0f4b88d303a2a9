use std::io::{self, Write};

use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};

use crate::chain::asset::{Asset, Price};
use crate::chain::records::{Authority, ChainProperties};
use crate::crypto::PublicKey;
use crate::encoding::{write_varint, GrapheneSerialize};

/// Replaces any subset of an account's authorities together with its memo
/// key and metadata. A `None` authority is left untouched by the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountUpdateOperation {
    pub account: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner: Option<Authority>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub active: Option<Authority>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub posting: Option<Authority>,
    pub memo_key: PublicKey,
    pub json_metadata: String,
}

impl AccountUpdateOperation {
    pub fn changes_authorities(&self) -> bool {
        self.owner.is_some() || self.active.is_some() || self.posting.is_some()
    }
}

impl GrapheneSerialize for AccountUpdateOperation {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.account.graphene_serialize(writer)?;
        self.owner.graphene_serialize(writer)?;
        self.active.graphene_serialize(writer)?;
        self.posting.graphene_serialize(writer)?;
        self.memo_key.graphene_serialize(writer)?;
        self.json_metadata.graphene_serialize(writer)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WitnessUpdateOperation {
    pub owner: String,
    pub url: String,
    pub block_signing_key: PublicKey,
    pub props: ChainProperties,
    pub fee: Asset,
}

impl GrapheneSerialize for WitnessUpdateOperation {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.owner.graphene_serialize(writer)?;
        self.url.graphene_serialize(writer)?;
        self.block_signing_key.graphene_serialize(writer)?;
        self.props.graphene_serialize(writer)?;
        self.fee.graphene_serialize(writer)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedPublishOperation {
    pub publisher: String,
    pub exchange_rate: Price,
}

impl GrapheneSerialize for FeedPublishOperation {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.publisher.graphene_serialize(writer)?;
        self.exchange_rate.graphene_serialize(writer)
    }
}

/// The operations this toolkit broadcasts.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    FeedPublish(FeedPublishOperation),
    AccountUpdate(AccountUpdateOperation),
    WitnessUpdate(WitnessUpdateOperation),
}

impl Operation {
    /// Position in the node's operation static_variant.
    pub fn id(&self) -> u64 {
        match self {
            Operation::FeedPublish(_) => 7,
            Operation::AccountUpdate(_) => 10,
            Operation::WitnessUpdate(_) => 11,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::FeedPublish(_) => "feed_publish",
            Operation::AccountUpdate(_) => "account_update",
            Operation::WitnessUpdate(_) => "witness_update",
        }
    }
}

// condenser_api expects operations as `[name, body]` pairs
impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(self.name())?;
        match self {
            Operation::FeedPublish(op) => tuple.serialize_element(op)?,
            Operation::AccountUpdate(op) => tuple.serialize_element(op)?,
            Operation::WitnessUpdate(op) => tuple.serialize_element(op)?,
        }
        tuple.end()
    }
}

impl GrapheneSerialize for Operation {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_varint(writer, self.id())?;
        match self {
            Operation::FeedPublish(op) => op.graphene_serialize(writer),
            Operation::AccountUpdate(op) => op.graphene_serialize(writer),
            Operation::WitnessUpdate(op) => op.graphene_serialize(writer),
        }
    }
}
