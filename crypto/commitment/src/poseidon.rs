//! Poseidon commitment to `(secret_price, secret_amount, nonce)`

use std::fmt;
use std::str::FromStr;

use ark_bn254::Fr;
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shade_hash::{field_from_be_bytes, field_to_be_bytes, poseidon_hash3};
use thiserror::Error;

/// Errors when parsing a published commitment
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommitmentError {
    #[error("invalid commitment encoding: {0}")]
    InvalidEncoding(String),

    #[error("commitment is not a canonical BN254 scalar")]
    OutOfField,
}

/// Public commitment to a maker's hidden limits.
///
/// Text form is the decimal integer, which is how it travels in order
/// metadata. `0x`-prefixed hex is accepted when parsing.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Commitment(Fr);

impl Commitment {
    /// Wrap a field element
    pub fn from_field(value: Fr) -> Self {
        Self(value)
    }

    /// Underlying field element
    pub fn as_field(&self) -> &Fr {
        &self.0
    }

    /// 32-byte big-endian encoding
    pub fn to_be_bytes(&self) -> [u8; 32] {
        field_to_be_bytes(&self.0)
    }

    /// Decode a canonical 32-byte big-endian encoding
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Result<Self, CommitmentError> {
        field_from_be_bytes(bytes)
            .map(Self)
            .ok_or(CommitmentError::OutOfField)
    }
}

/// Commit to hidden order limits.
///
/// Pure and total: every integer triple yields a commitment. Range checks
/// belong to the circuit.
pub fn commit(secret_price: u128, secret_amount: u128, nonce: u128) -> Commitment {
    Commitment(poseidon_hash3(
        &Fr::from(secret_price),
        &Fr::from(secret_amount),
        &Fr::from(nonce),
    ))
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BigUint::from_bytes_be(&self.to_be_bytes()))
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", self)
    }
}

impl FromStr for Commitment {
    type Err = CommitmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => BigUint::parse_bytes(hex.as_bytes(), 16),
            None => BigUint::parse_bytes(s.as_bytes(), 10),
        }
        .ok_or_else(|| CommitmentError::InvalidEncoding(s.to_string()))?;

        let raw = parsed.to_bytes_be();
        if raw.len() > 32 {
            return Err(CommitmentError::OutOfField);
        }
        let mut bytes = [0u8; 32];
        bytes[32 - raw.len()..].copy_from_slice(&raw);
        Self::from_be_bytes(&bytes)
    }
}

impl Serialize for Commitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
