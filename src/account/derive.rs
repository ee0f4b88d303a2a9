//! Password-based key derivation.
//!
//! Every role key of an account is a pure function of
//! `(account, role, passphrase)`, so nothing secret is ever stored.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::account::Role;
use crate::crypto::{sha256, KeyPair, PrivateKey};
use crate::error::{KeysError, Result};

/// A user secret. Wiped from memory on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Passphrase(String);

impl Passphrase {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison, for confirmation prompts.
    pub fn matches(&self, other: &Passphrase) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}

impl From<&str> for Passphrase {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone)]
pub struct KeyDeriver {
    prefix: String,
}

impl KeyDeriver {
    pub fn new(prefix: &str) -> Self {
        Self { prefix: prefix.to_string() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `sha256(account || role || passphrase)` taken as a secp256k1 scalar.
    /// Each whitespace run in the seed counts as a single space, leading and
    /// trailing runs included.
    pub fn derive(&self, account: &str, passphrase: &Passphrase, role: Role) -> Result<KeyPair> {
        if passphrase.expose().chars().all(is_seed_whitespace) {
            return Err(KeysError::InvalidPassphraseEncoding("passphrase is empty".to_string()));
        }

        let mut raw = [account, role.as_str(), passphrase.expose()].concat();
        let mut seed = collapse_whitespace(&raw);
        raw.zeroize();

        let mut digest = sha256(seed.as_bytes());
        seed.zeroize();
        let private = PrivateKey::from_bytes(&digest);
        digest.zeroize();

        let private = private.map_err(|_| {
            KeysError::InvalidPassphraseEncoding("passphrase does not hash to a valid key".to_string())
        })?;
        Ok(KeyPair::from_private(private, &self.prefix))
    }
}

// ASCII whitespace plus vertical tab, which `char::is_ascii_whitespace` leaves out.
fn is_seed_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0b' | '\x0c' | '\r' | ' ')
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for c in input.chars() {
        if is_seed_whitespace(c) {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let deriver = KeyDeriver::new("EUR");
        let secret = Passphrase::from("old-secret");
        let a = deriver.derive("alice", &secret, Role::Active).unwrap();
        let b = deriver.derive("alice", &secret, Role::Active).unwrap();
        assert_eq!(a, b);
        assert!(a.public.to_string().starts_with("EUR"));
    }

    #[test]
    fn test_roles_get_distinct_keys() {
        let deriver = KeyDeriver::new("EUR");
        let secret = Passphrase::from("old-secret");
        let keys: Vec<_> = Role::ALL
            .iter()
            .map(|role| deriver.derive("alice", &secret, *role).unwrap().public)
            .collect();
        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                assert_ne!(keys[i], keys[j]);
            }
        }
    }

    #[test]
    fn test_inputs_are_not_interchangeable() {
        let deriver = KeyDeriver::new("EUR");
        let base = deriver.derive("alice", &"secret".into(), Role::Owner).unwrap();
        assert_ne!(base, deriver.derive("bob", &"secret".into(), Role::Owner).unwrap());
        assert_ne!(base, deriver.derive("alice", &"secret2".into(), Role::Owner).unwrap());
    }

    #[test]
    fn test_inner_space_is_part_of_seed() {
        let deriver = KeyDeriver::new("EUR");
        let pair = deriver.derive("alice", &"correct horse".into(), Role::Posting).unwrap();
        let expected = PrivateKey::from_bytes(&sha256(b"alicepostingcorrect horse")).unwrap();
        assert_eq!(pair.private, expected);

        let packed = deriver.derive("alice", &"correcthorse".into(), Role::Posting).unwrap();
        assert_ne!(pair, packed);
    }

    #[test]
    fn test_whitespace_runs_collapse_to_one_space() {
        let deriver = KeyDeriver::new("EUR");
        let plain = deriver.derive("alice", &"correct horse".into(), Role::Posting).unwrap();
        for secret in ["correct  horse", "correct\thorse", "correct \r\n\x0b\x0c horse"] {
            assert_eq!(deriver.derive("alice", &secret.into(), Role::Posting).unwrap(), plain);
        }

        let padded = deriver.derive("alice", &"\t\tpw  ".into(), Role::Memo).unwrap();
        let expected = PrivateKey::from_bytes(&sha256(b"alicememo pw ")).unwrap();
        assert_eq!(padded.private, expected);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \t\n b  "), " a b ");
        assert_eq!(collapse_whitespace("ab"), "ab");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_seed_is_sha256_of_concatenation() {
        let deriver = KeyDeriver::new("EUR");
        let pair = deriver.derive("alice", &"pw".into(), Role::Memo).unwrap();
        let expected = PrivateKey::from_bytes(&sha256(b"alicememopw")).unwrap();
        assert_eq!(pair.private, expected);
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let deriver = KeyDeriver::new("EUR");
        for secret in ["", "   ", "\t\n"] {
            let err = deriver.derive("alice", &secret.into(), Role::Owner).unwrap_err();
            assert!(matches!(err, KeysError::InvalidPassphraseEncoding(_)));
        }
    }

    #[test]
    fn test_passphrase_handling() {
        let a = Passphrase::from("new-secret");
        assert!(a.matches(&Passphrase::from("new-secret")));
        assert!(!a.matches(&Passphrase::from("new-secrett")));
        assert!(!format!("{:?}", a).contains("new-secret"));
    }
}
