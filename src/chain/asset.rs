use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::encoding::GrapheneSerialize;
use crate::error::{KeysError, Result};

const SYMBOL_FIELD_LEN: usize = 7;

/// Most decimals a `Decimal` can carry.
pub const MAX_PRECISION: u8 = 28;

/// A fixed-point amount such as `4.700 EUR`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    pub amount: i64,
    pub precision: u8,
    pub symbol: String,
}

impl Asset {
    pub fn new(amount: i64, precision: u8, symbol: &str) -> Result<Self> {
        validate_precision(precision, symbol)?;
        validate_symbol(symbol)?;
        Ok(Self {
            amount,
            precision,
            symbol: symbol.to_string(),
        })
    }

    pub fn zero(precision: u8, symbol: &str) -> Result<Self> {
        Self::new(0, precision, symbol)
    }

    /// Round `value` to `precision` decimals.
    pub fn from_decimal(value: Decimal, precision: u8, symbol: &str) -> Result<Self> {
        validate_precision(precision, symbol)?;
        let mut scaled = value.round_dp(precision as u32);
        scaled.rescale(precision as u32);
        let amount = i64::try_from(scaled.mantissa())
            .map_err(|_| KeysError::InvalidAsset(format!("{} {} is out of range", value, symbol)))?;
        Self::new(amount, precision, symbol)
    }

    /// Re-express at another precision; fails if digits would be lost.
    pub fn with_precision(&self, precision: u8) -> Result<Self> {
        validate_precision(precision, &self.symbol)?;
        let value = self.to_decimal();
        if value.round_dp(precision as u32) != value {
            return Err(KeysError::InvalidAsset(format!(
                "{} has more than {} decimals",
                self, precision
            )));
        }
        Self::from_decimal(value, precision, &self.symbol)
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.amount as i128, self.precision as u32)
    }
}

pub(crate) fn validate_precision(precision: u8, symbol: &str) -> Result<()> {
    if precision > MAX_PRECISION {
        return Err(KeysError::InvalidAsset(format!(
            "{} precision {} exceeds {}",
            symbol, precision, MAX_PRECISION
        )));
    }
    Ok(())
}

fn validate_symbol(symbol: &str) -> Result<()> {
    if symbol.is_empty()
        || symbol.len() > SYMBOL_FIELD_LEN
        || !symbol.chars().all(|c| c.is_ascii_uppercase())
    {
        return Err(KeysError::InvalidAsset(format!("bad asset symbol '{}'", symbol)));
    }
    Ok(())
}

impl FromStr for Asset {
    type Err = KeysError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let (Some(amount), Some(symbol), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(KeysError::InvalidAsset(format!("expected '<amount> <SYMBOL>', got '{}'", s)));
        };
        let value = Decimal::from_str(amount)
            .map_err(|e| KeysError::InvalidAsset(format!("'{}': {}", amount, e)))?;
        let precision = u8::try_from(value.scale())
            .map_err(|_| KeysError::InvalidAsset(format!("'{}' has too many decimals", amount)))?;
        Self::from_decimal(value, precision, symbol)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal(), self.symbol)
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl GrapheneSerialize for Asset {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.amount.graphene_serialize(writer)?;
        self.precision.graphene_serialize(writer)?;
        let mut symbol = [0u8; SYMBOL_FIELD_LEN];
        symbol[..self.symbol.len()].copy_from_slice(self.symbol.as_bytes());
        writer.write_all(&symbol)
    }
}

/// Exchange rate as published in a price feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub base: Asset,
    pub quote: Asset,
}

impl GrapheneSerialize for Price {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.base.graphene_serialize(writer)?;
        self.quote.graphene_serialize(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let asset: Asset = "4.700 EUR".parse().unwrap();
        assert_eq!(asset.amount, 4700);
        assert_eq!(asset.precision, 3);
        assert_eq!(asset.symbol, "EUR");
        assert_eq!(asset.to_string(), "4.700 EUR");

        let vests: Asset = "12.000001 VESTS".parse().unwrap();
        assert_eq!(vests.amount, 12_000_001);
        assert_eq!(vests.to_string(), "12.000001 VESTS");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("4.700".parse::<Asset>().is_err());
        assert!("abc EUR".parse::<Asset>().is_err());
        assert!("1.000 eur".parse::<Asset>().is_err());
        assert!("1.000 TOOLONGSYM".parse::<Asset>().is_err());
        assert!("1.000 EUR extra".parse::<Asset>().is_err());
    }

    #[test]
    fn test_precision_changes() {
        let asset: Asset = "0.1 EUR".parse().unwrap();
        assert_eq!(asset.with_precision(3).unwrap().to_string(), "0.100 EUR");

        let fine: Asset = "0.1234 EUR".parse().unwrap();
        assert!(fine.with_precision(3).is_err());
    }

    #[test]
    fn test_from_decimal_rounds() {
        let asset = Asset::from_decimal(Decimal::new(47, 1), 3, "EUR").unwrap();
        assert_eq!(asset.to_string(), "4.700 EUR");
        let rounded = Asset::from_decimal(Decimal::new(123456, 5), 3, "EUR").unwrap();
        assert_eq!(rounded.amount, 1235);
    }

    #[test]
    fn test_precision_is_capped() {
        let max = Asset::new(1, MAX_PRECISION, "EUR").unwrap();
        assert_eq!(max.to_decimal(), Decimal::from_i128_with_scale(1, 28));

        for result in [
            Asset::new(1, 29, "EUR"),
            Asset::zero(u8::MAX, "EUR"),
            Asset::from_decimal(Decimal::ONE, 40, "EUR"),
            max.with_precision(29),
        ] {
            assert!(matches!(result, Err(KeysError::InvalidAsset(_))));
        }
    }

    #[test]
    fn test_binary_form() {
        let asset: Asset = "1.000 PULSE".parse().unwrap();
        let mut expected = 1000i64.to_le_bytes().to_vec();
        expected.push(3);
        expected.extend_from_slice(b"PULSE\0\0");
        assert_eq!(asset.to_bytes(), expected);
    }
}
