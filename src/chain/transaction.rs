use std::io::{self, Write};

use chrono::{Duration, NaiveDateTime};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::chain::operations::Operation;
use crate::chain::records::DynamicGlobalProperties;
use crate::crypto::{sha256, PrivateKey};
use crate::encoding::{write_varint, GrapheneSerialize};
use crate::error::{KeysError, Result};

/// `time_point_sec` text form used by the node.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Clone, Debug)]
pub struct Transaction {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub expiration: NaiveDateTime,
    pub operations: Vec<Operation>,
    pub signatures: Vec<String>,
}

impl Transaction {
    /// Anchor a new transaction to the current head block (TaPoS).
    pub fn from_head(
        props: &DynamicGlobalProperties,
        expiration_secs: u32,
        operations: Vec<Operation>,
    ) -> Result<Self> {
        let block_id = hex::decode(&props.head_block_id)
            .map_err(|e| KeysError::SigningFailed(format!("head block id is not hex: {}", e)))?;
        if block_id.len() < 8 {
            return Err(KeysError::SigningFailed(format!(
                "head block id '{}' is too short",
                props.head_block_id
            )));
        }
        let mut prefix = [0u8; 4];
        prefix.copy_from_slice(&block_id[4..8]);

        let head_time = NaiveDateTime::parse_from_str(&props.time, TIME_FORMAT)
            .map_err(|e| KeysError::SigningFailed(format!("bad head block time '{}': {}", props.time, e)))?;

        let tx = Self {
            ref_block_num: (props.head_block_number & 0xffff) as u16,
            ref_block_prefix: u32::from_le_bytes(prefix),
            expiration: head_time + Duration::seconds(expiration_secs as i64),
            operations,
            signatures: Vec::new(),
        };
        // serialization relies on this
        tx.expiration_secs()
            .map_err(|e| KeysError::SigningFailed(e.to_string()))?;
        Ok(tx)
    }

    /// `sha256(chain_id || serialized transaction)`, the value every key signs.
    pub fn digest(&self, chain_id: &[u8; 32]) -> [u8; 32] {
        let mut payload = chain_id.to_vec();
        payload.extend_from_slice(&self.to_bytes());
        sha256(&payload)
    }

    pub fn sign(&mut self, chain_id: &[u8; 32], keys: &[PrivateKey]) -> Result<()> {
        let digest = self.digest(chain_id);
        for key in keys {
            let compact = key.sign_digest(&digest)?;
            self.signatures.push(hex::encode(compact));
        }
        Ok(())
    }

    fn expiration_secs(&self) -> io::Result<u32> {
        u32::try_from(self.expiration.and_utc().timestamp())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "expiration out of range"))
    }
}

impl GrapheneSerialize for Transaction {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.ref_block_num.graphene_serialize(writer)?;
        self.ref_block_prefix.graphene_serialize(writer)?;
        self.expiration_secs()?.graphene_serialize(writer)?;
        self.operations.graphene_serialize(writer)?;
        // extensions
        write_varint(writer, 0)
    }
}

impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Transaction", 6)?;
        state.serialize_field("ref_block_num", &self.ref_block_num)?;
        state.serialize_field("ref_block_prefix", &self.ref_block_prefix)?;
        state.serialize_field("expiration", &self.expiration.format(TIME_FORMAT).to_string())?;
        state.serialize_field("operations", &self.operations)?;
        state.serialize_field("extensions", &Vec::<String>::new())?;
        state.serialize_field("signatures", &self.signatures)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::asset::Price;
    use crate::chain::operations::FeedPublishOperation;
    use crate::crypto::{recover_public_key, COMPACT_SIGNATURE_LEN};

    fn head() -> DynamicGlobalProperties {
        DynamicGlobalProperties {
            head_block_number: 0x0001_2345,
            head_block_id: "00012345aabbccdd00000000000000000000000000".to_string(),
            time: "2024-03-01T12:00:00".to_string(),
        }
    }

    fn feed() -> Operation {
        Operation::FeedPublish(FeedPublishOperation {
            publisher: "bob".to_string(),
            exchange_rate: Price {
                base: "4.700 EUR".parse().unwrap(),
                quote: "1.000 PULSE".parse().unwrap(),
            },
        })
    }

    #[test]
    fn test_tapos_from_head_block() {
        let tx = Transaction::from_head(&head(), 60, vec![feed()]).unwrap();
        assert_eq!(tx.ref_block_num, 0x2345);
        assert_eq!(tx.ref_block_prefix, u32::from_le_bytes([0xaa, 0xbb, 0xcc, 0xdd]));
        assert_eq!(tx.expiration.format(TIME_FORMAT).to_string(), "2024-03-01T12:01:00");
    }

    #[test]
    fn test_rejects_malformed_head() {
        let mut props = head();
        props.head_block_id = "0001".to_string();
        assert!(Transaction::from_head(&props, 60, vec![]).is_err());

        let mut props = head();
        props.time = "yesterday".to_string();
        assert!(Transaction::from_head(&props, 60, vec![]).is_err());
    }

    #[test]
    fn test_digest_depends_on_chain_id() {
        let tx = Transaction::from_head(&head(), 60, vec![feed()]).unwrap();
        assert_ne!(tx.digest(&[0u8; 32]), tx.digest(&[1u8; 32]));
        assert_eq!(tx.digest(&[0u8; 32]), tx.digest(&[0u8; 32]));
    }

    #[test]
    fn test_signatures_recover_to_signer() {
        let chain_id = [7u8; 32];
        let key = PrivateKey::from_bytes(&[3u8; 32]).unwrap();
        let mut tx = Transaction::from_head(&head(), 60, vec![feed()]).unwrap();
        tx.sign(&chain_id, &[key.clone()]).unwrap();
        assert_eq!(tx.signatures.len(), 1);

        let raw = hex::decode(&tx.signatures[0]).unwrap();
        let mut compact = [0u8; COMPACT_SIGNATURE_LEN];
        compact.copy_from_slice(&raw);
        let signer = recover_public_key(&tx.digest(&chain_id), &compact, "EUR").unwrap();
        assert_eq!(signer, key.public_key("EUR"));

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["expiration"], "2024-03-01T12:01:00");
        assert_eq!(json["operations"][0][0], "feed_publish");
        assert_eq!(json["extensions"], serde_json::json!([]));
    }
}
