//! Block producer maintenance: publishing witness parameters, switching a
//! witness off, and price feeds.

use rust_decimal::Decimal;
use tracing::info;

use crate::account::{AuthorityVerifier, KeyDeriver, Role};
use crate::chain::{
    Asset, ChainProperties, FeedPublishOperation, Operation, Price, TransactionResult, WitnessRecord,
    WitnessUpdateOperation,
};
use crate::client::{LedgerQuery, TransactionSubmitter};
use crate::config::ChainConfig;
use crate::crypto::PublicKey;
use crate::error::{KeysError, Result};

/// Requested witness settings. Unset values keep what is on-chain; a
/// witness being registered for the first time must set all of them.
#[derive(Debug, Clone, Default)]
pub struct WitnessParams {
    pub signing_key: Option<String>,
    pub url: Option<String>,
    pub creation_fee: Option<String>,
    pub block_size: Option<u32>,
    pub interest_rate: Option<u16>,
}

fn parse_signing_key(text: &str, prefix: &str) -> Result<PublicKey> {
    let key = PublicKey::parse_with_prefix(text.trim(), prefix)?;
    key.ensure_on_curve()?;
    Ok(key)
}

fn required<T>(value: Option<T>, name: &'static str) -> Result<T> {
    value.ok_or(KeysError::MissingWitnessParameter(name))
}

impl WitnessParams {
    fn resolve(&self, chain: &ChainConfig, current: Option<&WitnessRecord>) -> Result<(PublicKey, String, ChainProperties)> {
        match current {
            Some(witness) => {
                let signing_key = match &self.signing_key {
                    Some(text) => parse_signing_key(text, &chain.prefix)?,
                    None => witness.signing_key.clone(),
                };
                let url = self.url.clone().unwrap_or_else(|| witness.url.clone());
                let account_creation_fee = match &self.creation_fee {
                    Some(text) => chain.parse_asset(text)?,
                    None => witness.props.account_creation_fee.clone(),
                };
                let props = ChainProperties {
                    account_creation_fee,
                    maximum_block_size: self.block_size.unwrap_or(witness.props.maximum_block_size),
                    sbd_interest_rate: self.interest_rate.unwrap_or(witness.props.sbd_interest_rate),
                };
                Ok((signing_key, url, props))
            }
            None => {
                let signing_key = required(self.signing_key.as_deref(), "signing key")?;
                let url = required(self.url.clone(), "url")?;
                let fee = required(self.creation_fee.as_deref(), "creation fee")?;
                let block_size = required(self.block_size, "block size")?;
                let interest_rate = required(self.interest_rate, "interest rate")?;
                let props = ChainProperties {
                    account_creation_fee: chain.parse_asset(fee)?,
                    maximum_block_size: block_size,
                    sbd_interest_rate: interest_rate,
                };
                Ok((parse_signing_key(signing_key, &chain.prefix)?, url, props))
            }
        }
    }
}

/// Register a witness or change its parameters, signed with the active key.
pub async fn update_witness(
    ledger: &dyn LedgerQuery,
    submitter: &dyn TransactionSubmitter,
    chain: &ChainConfig,
    account: &str,
    active_wif: &str,
    params: &WitnessParams,
) -> Result<TransactionResult> {
    let verifier = AuthorityVerifier::new(ledger, KeyDeriver::new(&chain.prefix));
    let current = ledger.get_witness(account).await?;
    let (_, active_key) = verifier.prove_private_key(account, active_wif, Role::Active).await?;

    let (block_signing_key, url, props) = params.resolve(chain, current.as_ref())?;
    let op = WitnessUpdateOperation {
        owner: account.to_string(),
        url,
        block_signing_key,
        props,
        fee: chain.core_zero()?,
    };
    let result = submitter.submit(Operation::WitnessUpdate(op), &[active_key]).await?;
    info!(account, registered = current.is_none(), "Witness updated");
    Ok(result)
}

/// Stop producing blocks by publishing the null signing key.
pub async fn disable_witness(
    ledger: &dyn LedgerQuery,
    submitter: &dyn TransactionSubmitter,
    chain: &ChainConfig,
    account: &str,
    active_wif: &str,
) -> Result<TransactionResult> {
    let verifier = AuthorityVerifier::new(ledger, KeyDeriver::new(&chain.prefix));
    let witness = verifier.require_witness(account).await?;
    let (_, active_key) = verifier.prove_private_key(account, active_wif, Role::Active).await?;

    let op = WitnessUpdateOperation {
        owner: witness.owner,
        url: witness.url,
        block_signing_key: PublicKey::null(&chain.prefix),
        props: witness.props,
        fee: chain.core_zero()?,
    };
    let result = submitter.submit(Operation::WitnessUpdate(op), &[active_key]).await?;
    info!(account, "Witness disabled");
    Ok(result)
}

/// Publish `price` units of the backed asset per 1 unit of the core asset.
pub async fn publish_feed(
    ledger: &dyn LedgerQuery,
    submitter: &dyn TransactionSubmitter,
    chain: &ChainConfig,
    witness: &str,
    active_wif: &str,
    price: Decimal,
) -> Result<TransactionResult> {
    if price <= Decimal::ZERO {
        return Err(KeysError::InvalidAsset(format!("feed price must be positive, got {}", price)));
    }
    let base = chain.asset(price, &chain.backed_symbol)?;
    if base.amount == 0 {
        return Err(KeysError::InvalidAsset(format!("{} rounds to zero", price)));
    }
    let quote = Asset::from_decimal(Decimal::ONE, chain.precision_of(&chain.core_symbol)?, &chain.core_symbol)?;

    let verifier = AuthorityVerifier::new(ledger, KeyDeriver::new(&chain.prefix));
    verifier.require_witness(witness).await?;
    let (_, active_key) = verifier.prove_private_key(witness, active_wif, Role::Active).await?;

    let op = FeedPublishOperation {
        publisher: witness.to_string(),
        exchange_rate: Price { base, quote },
    };
    let result = submitter.submit(Operation::FeedPublish(op), &[active_key]).await?;
    info!(witness, %price, "Price feed published");
    Ok(result)
}

pub async fn list_witnesses(ledger: &dyn LedgerQuery, limit: u32) -> Result<Vec<WitnessRecord>> {
    ledger.get_witnesses_by_vote(limit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::RoleKeySet;
    use crate::client::memory::{account_for, MemoryLedger};
    use serde_json::Map;

    struct Fixture {
        ledger: MemoryLedger,
        chain: ChainConfig,
        keys: RoleKeySet,
    }

    impl Fixture {
        fn new() -> Self {
            let ledger = MemoryLedger::new("EUR");
            let keys = RoleKeySet::build(&KeyDeriver::new("EUR"), "bob", &"witness-secret".into()).unwrap();
            ledger.insert_account(account_for(&keys));
            Self { ledger, chain: ChainConfig::default(), keys }
        }

        fn with_witness(self) -> Self {
            self.ledger.insert_witness(WitnessRecord {
                owner: "bob".to_string(),
                url: "https://bob.example".to_string(),
                signing_key: self.keys.public_key(Role::Owner).clone(),
                props: ChainProperties {
                    account_creation_fee: "0.100 PULSE".parse().unwrap(),
                    maximum_block_size: 65536,
                    sbd_interest_rate: 0,
                },
                other: Map::new(),
            });
            self
        }

        fn active(&self) -> String {
            self.keys.private_key(Role::Active).to_wif()
        }
    }

    #[tokio::test]
    async fn test_existing_witness_keeps_unset_params() {
        let fx = Fixture::new().with_witness();
        let params = WitnessParams {
            url: Some("https://new.example".to_string()),
            block_size: Some(131072),
            ..Default::default()
        };
        update_witness(&fx.ledger, &fx.ledger, &fx.chain, "bob", &fx.active(), &params)
            .await
            .unwrap();

        let witness = fx.ledger.witness("bob").unwrap();
        assert_eq!(witness.url, "https://new.example");
        assert_eq!(witness.props.maximum_block_size, 131072);
        assert_eq!(witness.props.account_creation_fee.to_string(), "0.100 PULSE");
        assert_eq!(witness.signing_key, *fx.keys.public_key(Role::Owner));
    }

    #[tokio::test]
    async fn test_new_witness_needs_every_param() {
        let fx = Fixture::new();
        let params = WitnessParams {
            signing_key: Some(fx.keys.public_key(Role::Active).to_string()),
            url: Some("https://bob.example".to_string()),
            creation_fee: Some("0.1 PULSE".to_string()),
            block_size: Some(65536),
            interest_rate: None,
        };
        let err = update_witness(&fx.ledger, &fx.ledger, &fx.chain, "bob", &fx.active(), &params)
            .await
            .unwrap_err();
        assert!(matches!(err, KeysError::MissingWitnessParameter("interest rate")));

        let params = WitnessParams { interest_rate: Some(0), ..params };
        update_witness(&fx.ledger, &fx.ledger, &fx.chain, "bob", &fx.active(), &params)
            .await
            .unwrap();
        let witness = fx.ledger.witness("bob").unwrap();
        assert_eq!(witness.props.account_creation_fee.to_string(), "0.100 PULSE");
        assert!(!witness.is_disabled());
    }

    #[tokio::test]
    async fn test_bad_signing_key_rejected() {
        let fx = Fixture::new().with_witness();
        let params = WitnessParams {
            signing_key: Some("EUR1111111111111111111111111111111114T1Anm".to_string()),
            ..Default::default()
        };
        let err = update_witness(&fx.ledger, &fx.ledger, &fx.chain, "bob", &fx.active(), &params)
            .await
            .unwrap_err();
        assert!(matches!(err, KeysError::InvalidKey(_)));
        assert_eq!(fx.ledger.submit_count(), 0);
    }

    #[tokio::test]
    async fn test_disable_sets_null_key() {
        let fx = Fixture::new().with_witness();
        disable_witness(&fx.ledger, &fx.ledger, &fx.chain, "bob", &fx.active())
            .await
            .unwrap();
        let witness = fx.ledger.witness("bob").unwrap();
        assert!(witness.is_disabled());
        assert_eq!(witness.url, "https://bob.example");

        let stranger = Fixture::new();
        let err = disable_witness(&stranger.ledger, &stranger.ledger, &stranger.chain, "bob", &stranger.active())
            .await
            .unwrap_err();
        assert!(matches!(err, KeysError::WitnessNotFound(_)));
    }

    #[tokio::test]
    async fn test_publish_feed() {
        let fx = Fixture::new().with_witness();
        publish_feed(&fx.ledger, &fx.ledger, &fx.chain, "bob", &fx.active(), Decimal::new(47, 1))
            .await
            .unwrap();
        let feeds = fx.ledger.feeds();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].exchange_rate.base.to_string(), "4.700 EUR");
        assert_eq!(feeds[0].exchange_rate.quote.to_string(), "1.000 PULSE");
    }

    #[tokio::test]
    async fn test_feed_rejects_bad_price_and_key() {
        let fx = Fixture::new().with_witness();
        let err = publish_feed(&fx.ledger, &fx.ledger, &fx.chain, "bob", &fx.active(), Decimal::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, KeysError::InvalidAsset(_)));

        let posting = fx.keys.private_key(Role::Posting).to_wif();
        let err = publish_feed(&fx.ledger, &fx.ledger, &fx.chain, "bob", &posting, Decimal::ONE)
            .await
            .unwrap_err();
        assert_eq!(err.mismatched_roles(), &[Role::Active]);
        assert!(fx.ledger.feeds().is_empty());
    }

    #[tokio::test]
    async fn test_list_witnesses_respects_limit() {
        let fx = Fixture::new().with_witness();
        assert_eq!(list_witnesses(&fx.ledger, 10).await.unwrap().len(), 1);
        assert!(list_witnesses(&fx.ledger, 0).await.unwrap().is_empty());
    }
}
