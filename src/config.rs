use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::chain::asset::{validate_precision, Asset};
use crate::error::{KeysError, Result};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PulsarConfig {
    pub node: NodeConfig,
    pub chain: ChainConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NodeConfig {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChainConfig {
    pub chain_id: String,
    pub prefix: String,
    /// Symbol fees and feed quotes are paid in.
    pub core_symbol: String,
    /// Symbol a price feed is published for.
    pub backed_symbol: String,
    pub assets: Vec<AssetSpec>,
    #[serde(default = "default_expiration_secs")]
    pub expiration_secs: u32,
}

fn default_expiration_secs() -> u32 {
    60
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AssetSpec {
    pub symbol: String,
    pub precision: u8,
}

impl Default for PulsarConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig {
                url: "https://apidev.blkcc.xyz".to_string(),
                timeout_secs: default_timeout_secs(),
                log_level: default_log_level(),
            },
            chain: ChainConfig::default(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: "07c687c01f134adaf217a9b9367d1cef679c3c020167fdd25ee8c403f687528e".to_string(),
            prefix: "EUR".to_string(),
            core_symbol: "PULSE".to_string(),
            backed_symbol: "EUR".to_string(),
            assets: vec![
                AssetSpec { symbol: "EUR".to_string(), precision: 3 },
                AssetSpec { symbol: "PULSE".to_string(), precision: 3 },
                AssetSpec { symbol: "VESTS".to_string(), precision: 6 },
            ],
            expiration_secs: default_expiration_secs(),
        }
    }
}

impl PulsarConfig {
    /// Missing file means defaults; a file that exists but does not parse is an error.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !std::path::Path::new(path).exists() {
            return Ok(Self::default());
        }
        let s = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&s).map_err(|e| KeysError::Config(format!("{}: {}", path, e)))?;
        for spec in &config.chain.assets {
            validate_precision(spec.precision, &spec.symbol)
                .map_err(|e| KeysError::Config(format!("{}: {}", path, e)))?;
        }
        Ok(config)
    }
}

impl ChainConfig {
    pub fn chain_id_bytes(&self) -> Result<[u8; 32]> {
        let raw = hex::decode(&self.chain_id)
            .map_err(|e| KeysError::Config(format!("chain_id is not hex: {}", e)))?;
        raw.try_into()
            .map_err(|_| KeysError::Config("chain_id must be 32 bytes".to_string()))
    }

    pub fn precision_of(&self, symbol: &str) -> Result<u8> {
        self.assets
            .iter()
            .find(|a| a.symbol == symbol)
            .map(|a| a.precision)
            .ok_or_else(|| KeysError::InvalidAsset(format!("unknown asset symbol '{}'", symbol)))
    }

    /// Build an amount of a known asset, rounded to the chain's precision.
    pub fn asset(&self, value: Decimal, symbol: &str) -> Result<Asset> {
        Asset::from_decimal(value, self.precision_of(symbol)?, symbol)
    }

    /// Parse user input like `0.5 PULSE` and re-express it at the chain's precision.
    pub fn parse_asset(&self, s: &str) -> Result<Asset> {
        let asset: Asset = s.parse()?;
        asset.with_precision(self.precision_of(&asset.symbol)?)
    }

    pub fn core_zero(&self) -> Result<Asset> {
        Asset::zero(self.precision_of(&self.core_symbol)?, &self.core_symbol)
    }
}
