//! Hidden-limit orders and order form validation

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shade_commitment::Commitment;
use thiserror::Error;

/// A published hidden-limit order.
///
/// `making_amount` / `taking_amount` are the visible order terms; the
/// binding limits live behind `commitment`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenLimitOrder {
    pub order_id: String,
    pub maker: String,
    pub maker_asset: String,
    pub taker_asset: String,
    pub making_amount: u128,
    pub taking_amount: u128,
    /// Unix seconds
    pub expiry: u64,
    pub commitment: Commitment,
    pub signature: Option<String>,
    /// Encoded predicate data, empty until a fill is authorized
    #[serde(default, with = "hex_bytes")]
    pub authorization_data: Vec<u8>,
}

impl HiddenLimitOrder {
    pub fn is_expired(&self, now: u64) -> bool {
        self.expiry <= now
    }

    pub fn with_authorization_data(mut self, data: Vec<u8>) -> Self {
        self.authorization_data = data;
        self
    }
}

mod hex_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

/// Order form as entered by a maker; every field is raw text
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderForm {
    pub maker: String,
    pub maker_asset: String,
    pub taker_asset: String,
    pub making_amount: String,
    pub taking_amount: String,
    /// Unix seconds
    pub expiry: String,
    pub commitment: String,
}

/// Order form validation failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} is not a valid address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} is not a valid amount: {value}")]
    InvalidAmount { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroAmount(&'static str),

    #[error("maker and taker assets must differ")]
    SameAsset,

    #[error("expiry is not a valid timestamp: {0}")]
    InvalidExpiry(String),

    #[error("expiry is in the past")]
    Expired,

    #[error("invalid commitment: {0}")]
    InvalidCommitment(String),
}

/// An order form that passed validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedOrder {
    pub maker: String,
    pub maker_asset: String,
    pub taker_asset: String,
    pub making_amount: u128,
    pub taking_amount: u128,
    pub expiry: u64,
    pub commitment: Commitment,
}

impl ValidatedOrder {
    /// Content-addressed order id
    pub fn order_id(&self) -> String {
        let making = self.making_amount.to_be_bytes();
        let taking = self.taking_amount.to_be_bytes();
        let expiry = self.expiry.to_be_bytes();
        let commitment = self.commitment.to_be_bytes();
        let digest = shade_hash::hash_many(&[
            self.maker.as_bytes(),
            self.maker_asset.as_bytes(),
            self.taker_asset.as_bytes(),
            &making,
            &taking,
            &expiry,
            &commitment,
        ]);
        format!("0x{}", hex::encode(digest))
    }

    pub fn into_order(self, signature: Option<String>) -> HiddenLimitOrder {
        HiddenLimitOrder {
            order_id: self.order_id(),
            maker: self.maker,
            maker_asset: self.maker_asset,
            taker_asset: self.taker_asset,
            making_amount: self.making_amount,
            taking_amount: self.taking_amount,
            expiry: self.expiry,
            commitment: self.commitment,
            signature,
            authorization_data: Vec::new(),
        }
    }
}

/// Validate an order form against the current time
pub fn validate_order_form(form: &OrderForm) -> Result<ValidatedOrder, ValidationError> {
    validate_order_form_at(form, crate::lifecycle::now())
}

/// Validate an order form; `now` is Unix seconds
pub fn validate_order_form_at(form: &OrderForm, now: u64) -> Result<ValidatedOrder, ValidationError> {
    let maker = address("maker", &form.maker)?;
    let maker_asset = address("maker_asset", &form.maker_asset)?;
    let taker_asset = address("taker_asset", &form.taker_asset)?;
    if maker_asset == taker_asset {
        return Err(ValidationError::SameAsset);
    }

    let making_amount = amount("making_amount", &form.making_amount)?;
    let taking_amount = amount("taking_amount", &form.taking_amount)?;

    let expiry_text = required("expiry", &form.expiry)?;
    let expiry: u64 = expiry_text
        .parse()
        .map_err(|_| ValidationError::InvalidExpiry(expiry_text.to_string()))?;
    if expiry <= now {
        return Err(ValidationError::Expired);
    }

    let commitment = required("commitment", &form.commitment)?
        .parse::<Commitment>()
        .map_err(|e| ValidationError::InvalidCommitment(e.to_string()))?;

    Ok(ValidatedOrder {
        maker,
        maker_asset,
        taker_asset,
        making_amount,
        taking_amount,
        expiry,
        commitment,
    })
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value)
}

/// `0x` followed by 40 hex digits, normalised to lowercase
fn address(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = required(field, value)?;
    let valid = value
        .strip_prefix("0x")
        .map_or(false, |digits| digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
    Ok(value.to_ascii_lowercase())
}

fn amount(field: &'static str, value: &str) -> Result<u128, ValidationError> {
    let value = required(field, value)?;
    let parsed: u128 = value.parse().map_err(|_| ValidationError::InvalidAmount {
        field,
        value: value.to_string(),
    })?;
    if parsed == 0 {
        return Err(ValidationError::ZeroAmount(field));
    }
    Ok(parsed)
}
