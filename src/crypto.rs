//! secp256k1 key primitives in the graphene text formats.
//!
//! Private keys travel as WIF (`base58(0x80 || secret || sha256d[..4])`),
//! public keys as a chain prefix followed by
//! `base58(compressed || ripemd160(compressed)[..4])`.

use std::fmt;
use std::str::FromStr;

use k256::ecdsa::signature::hazmat::RandomizedPrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use rand::rngs::OsRng;
use ripemd::Ripemd160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{KeysError, Result};

const WIF_VERSION: u8 = 0x80;
const CHECKSUM_LEN: usize = 4;
const MAX_PREFIX_LEN: usize = 8;
const MAX_SIGNING_ATTEMPTS: usize = 64;

pub const COMPRESSED_KEY_LEN: usize = 33;
pub const COMPACT_SIGNATURE_LEN: usize = 65;

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

fn wif_checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = sha256(&sha256(payload));
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

fn key_checksum(compressed: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Ripemd160::digest(compressed);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

/// A secp256k1 secret scalar.
#[derive(Clone)]
pub struct PrivateKey {
    secret: SecretKey,
}

impl PrivateKey {
    /// Interpret 32 big-endian bytes as a scalar. Zero and values >= n are rejected.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        SecretKey::from_slice(bytes)
            .map(|secret| Self { secret })
            .map_err(|_| KeysError::InvalidKey("scalar is zero or exceeds the curve order".to_string()))
    }

    pub fn from_wif(wif: &str) -> Result<Self> {
        let raw = bs58::decode(wif.trim())
            .into_vec()
            .map_err(|e| KeysError::InvalidKey(format!("WIF is not base58: {}", e)))?;

        if raw.len() != 1 + 32 + CHECKSUM_LEN {
            return Err(KeysError::InvalidKey(format!(
                "WIF decodes to {} bytes, expected {}",
                raw.len(),
                1 + 32 + CHECKSUM_LEN
            )));
        }
        if raw[0] != WIF_VERSION {
            return Err(KeysError::InvalidKey(format!("unexpected WIF version byte 0x{:02x}", raw[0])));
        }

        let (payload, checksum) = raw.split_at(1 + 32);
        if wif_checksum(payload).as_slice() != checksum {
            return Err(KeysError::InvalidKey("WIF checksum mismatch".to_string()));
        }

        let mut secret = [0u8; 32];
        secret.copy_from_slice(&payload[1..]);
        let key = Self::from_bytes(&secret);
        zeroize::Zeroize::zeroize(&mut secret);
        key
    }

    pub fn to_wif(&self) -> String {
        let mut payload = Vec::with_capacity(1 + 32 + CHECKSUM_LEN);
        payload.push(WIF_VERSION);
        payload.extend_from_slice(&self.secret.to_bytes());
        let checksum = wif_checksum(&payload);
        payload.extend_from_slice(&checksum);
        let wif = bs58::encode(&payload).into_string();
        zeroize::Zeroize::zeroize(&mut payload);
        wif
    }

    pub fn public_key(&self, prefix: &str) -> PublicKey {
        let point = self.secret.public_key().to_encoded_point(true);
        let mut compressed = [0u8; COMPRESSED_KEY_LEN];
        compressed.copy_from_slice(point.as_bytes());
        PublicKey::from_compressed(prefix, compressed)
    }

    /// Sign a 32-byte digest, producing a canonical 65-byte compact signature
    /// (`27 + 4 + recid || r || s`).
    ///
    /// The RFC6979 nonce is tried first; graphene nodes reject signatures
    /// whose `r` or `s` carry a high bit, so further attempts use fresh nonces.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; COMPACT_SIGNATURE_LEN]> {
        let signing_key = SigningKey::from(&self.secret);

        let (signature, recovery_id) = signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|e| KeysError::SigningFailed(e.to_string()))?;
        if let Some(compact) = canonical_compact(&signature, recovery_id) {
            return Ok(compact);
        }

        let verifying_key = signing_key.verifying_key();
        for _ in 0..MAX_SIGNING_ATTEMPTS {
            let signature: Signature = signing_key
                .sign_prehash_with_rng(&mut OsRng, digest)
                .map_err(|e| KeysError::SigningFailed(e.to_string()))?;
            let signature = signature.normalize_s().unwrap_or(signature);
            let recovery_id = RecoveryId::trial_recovery_from_prehash(verifying_key, digest, &signature)
                .map_err(|e| KeysError::SigningFailed(e.to_string()))?;
            if let Some(compact) = canonical_compact(&signature, recovery_id) {
                return Ok(compact);
            }
        }

        Err(KeysError::SigningFailed(format!(
            "no canonical signature after {} attempts",
            MAX_SIGNING_ATTEMPTS + 1
        )))
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.secret
            .to_bytes()
            .as_slice()
            .ct_eq(other.secret.to_bytes().as_slice())
            .into()
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

fn canonical_compact(signature: &Signature, recovery_id: RecoveryId) -> Option<[u8; COMPACT_SIGNATURE_LEN]> {
    let mut compact = [0u8; COMPACT_SIGNATURE_LEN];
    compact[0] = 27 + 4 + recovery_id.to_byte();
    compact[1..].copy_from_slice(&signature.to_bytes());
    is_canonical(&compact).then_some(compact)
}

/// Canonical form as enforced by graphene nodes.
pub fn is_canonical(compact: &[u8; COMPACT_SIGNATURE_LEN]) -> bool {
    compact[1] & 0x80 == 0
        && !(compact[1] == 0 && compact[2] & 0x80 == 0)
        && compact[33] & 0x80 == 0
        && !(compact[33] == 0 && compact[34] & 0x80 == 0)
}

/// Recover the signer of a compact signature.
pub fn recover_public_key(
    digest: &[u8; 32],
    compact: &[u8; COMPACT_SIGNATURE_LEN],
    prefix: &str,
) -> Result<PublicKey> {
    let recovery_byte = compact[0]
        .checked_sub(27 + 4)
        .ok_or_else(|| KeysError::InvalidKey("compact signature header out of range".to_string()))?;
    let recovery_id = RecoveryId::from_byte(recovery_byte)
        .ok_or_else(|| KeysError::InvalidKey("invalid recovery id".to_string()))?;
    let signature = Signature::from_slice(&compact[1..])
        .map_err(|e| KeysError::InvalidKey(e.to_string()))?;
    let verifying_key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id)
        .map_err(|e| KeysError::InvalidKey(e.to_string()))?;

    let point = verifying_key.to_encoded_point(true);
    let mut compressed = [0u8; COMPRESSED_KEY_LEN];
    compressed.copy_from_slice(point.as_bytes());
    Ok(PublicKey::from_compressed(prefix, compressed))
}

/// A prefixed, checksummed compressed secp256k1 point.
///
/// The bytes are not required to be a valid curve point: the all-zero
/// "null key" is how the ledger marks a disabled witness.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    prefix: String,
    compressed: [u8; COMPRESSED_KEY_LEN],
}

impl PublicKey {
    pub fn from_compressed(prefix: &str, compressed: [u8; COMPRESSED_KEY_LEN]) -> Self {
        Self {
            prefix: prefix.to_string(),
            compressed,
        }
    }

    pub fn null(prefix: &str) -> Self {
        Self::from_compressed(prefix, [0u8; COMPRESSED_KEY_LEN])
    }

    pub fn is_null(&self) -> bool {
        self.compressed.iter().all(|b| *b == 0)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn as_bytes(&self) -> &[u8; COMPRESSED_KEY_LEN] {
        &self.compressed
    }

    /// Parse a key that must carry exactly `prefix`.
    pub fn parse_with_prefix(s: &str, prefix: &str) -> Result<Self> {
        let body = s
            .strip_prefix(prefix)
            .ok_or_else(|| KeysError::InvalidKey(format!("'{}' does not start with {}", s, prefix)))?;
        Self::decode_body(prefix, body)
    }

    /// Fails unless the bytes are a point on secp256k1.
    pub fn ensure_on_curve(&self) -> Result<()> {
        VerifyingKey::from_sec1_bytes(&self.compressed)
            .map(|_| ())
            .map_err(|_| KeysError::InvalidKey(format!("{} is not a secp256k1 point", self)))
    }

    fn decode_body(prefix: &str, body: &str) -> Result<Self> {
        let raw = bs58::decode(body)
            .into_vec()
            .map_err(|e| KeysError::InvalidKey(format!("public key is not base58: {}", e)))?;
        if raw.len() != COMPRESSED_KEY_LEN + CHECKSUM_LEN {
            return Err(KeysError::InvalidKey(format!(
                "public key decodes to {} bytes, expected {}",
                raw.len(),
                COMPRESSED_KEY_LEN + CHECKSUM_LEN
            )));
        }

        let (key, checksum) = raw.split_at(COMPRESSED_KEY_LEN);
        if key_checksum(key).as_slice() != checksum {
            return Err(KeysError::InvalidKey("public key checksum mismatch".to_string()));
        }

        let mut compressed = [0u8; COMPRESSED_KEY_LEN];
        compressed.copy_from_slice(key);
        Ok(Self::from_compressed(prefix, compressed))
    }
}

impl FromStr for PublicKey {
    type Err = KeysError;

    /// The prefix length is not fixed across chains, so every alphabetic
    /// split is tried and the checksum decides.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        for split in 1..=MAX_PREFIX_LEN.min(s.len()) {
            if !s.is_char_boundary(split) {
                break;
            }
            let (prefix, body) = s.split_at(split);
            if !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
                break;
            }
            if let Ok(key) = Self::decode_body(prefix, body) {
                return Ok(key);
            }
        }
        Err(KeysError::InvalidKey(format!("'{}' is not a prefixed public key", s)))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = Vec::with_capacity(COMPRESSED_KEY_LEN + CHECKSUM_LEN);
        raw.extend_from_slice(&self.compressed);
        raw.extend_from_slice(&key_checksum(&self.compressed));
        write!(f, "{}{}", self.prefix, bs58::encode(raw).into_string())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A derived or imported keypair. The public half is always recomputed
/// from the private half.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl KeyPair {
    pub fn from_private(private: PrivateKey, prefix: &str) -> Self {
        let public = private.public_key(prefix);
        Self { public, private }
    }
}
