//! Account identities: passphrase-derived role keys, their verification
//! against on-chain authorities, and authority rotation.

pub mod derive;
pub mod keyset;
pub mod password_change;
pub mod profile;
pub mod role;
pub mod updater;
pub mod verifier;

pub use derive::{KeyDeriver, Passphrase};
pub use keyset::{CredentialEntry, Credentials, KeyKind, RoleKeySet};
pub use password_change::{change_password, PasswordChange};
pub use profile::{fetch_profile, profile_of, update_profile, ProfileUpdate};
pub use role::{Role, RoleAuthority};
pub use updater::{confirm_passphrase, AccountAuthorityUpdater, PreservedState};
pub use verifier::{AccountIdentity, AuthorityVerifier};
