//! Core types for hidden-limit proofs

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use shade_commitment::Commitment;

use crate::calldata::Word;
use crate::errors::ZkError;

/// Bit width of every price/amount range check.
///
/// Prices, amounts and both differences are decomposed into this many
/// bits, so token quantities are limited to `u128`. Changing it changes
/// the circuit and requires new keys.
pub const RANGE_BITS: usize = 128;

/// Number of public signals: `[validity_flag, commitment, nonce, offered_price, offered_amount]`
pub const PUBLIC_SIGNAL_COUNT: usize = 5;

/// Value of the validity flag in every proof the circuit admits
pub const VALIDITY_FLAG: u64 = 1;

/// Circuit identifier carried in key artifacts
pub const CIRCUIT_VERSION: &str = "shade-hidden-limit/v1";

/// Taker-supplied fill terms
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferValues {
    /// Price the taker offers
    pub offered_price: u128,
    /// Amount the taker wants to fill
    pub offered_amount: u128,
}

impl OfferValues {
    pub fn new(offered_price: u128, offered_amount: u128) -> Self {
        Self {
            offered_price,
            offered_amount,
        }
    }
}

/// Public signals a proof is bound to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicSignals {
    /// Order commitment
    pub commitment: Commitment,
    /// Commitment nonce
    pub nonce: u128,
    /// Offer the proof was generated for
    pub offer: OfferValues,
}

impl PublicSignals {
    pub fn new(commitment: Commitment, nonce: u128, offer: OfferValues) -> Self {
        Self {
            commitment,
            nonce,
            offer,
        }
    }

    /// Field elements in circuit input order
    pub fn to_field_elements(&self) -> [Fr; PUBLIC_SIGNAL_COUNT] {
        [
            Fr::from(VALIDITY_FLAG),
            *self.commitment.as_field(),
            Fr::from(self.nonce),
            Fr::from(self.offer.offered_price),
            Fr::from(self.offer.offered_amount),
        ]
    }

    /// Calldata words in circuit input order
    pub fn to_words(&self) -> [Word; PUBLIC_SIGNAL_COUNT] {
        [
            Word::from_u128(VALIDITY_FLAG as u128),
            Word::from_be_bytes(self.commitment.to_be_bytes()),
            Word::from_u128(self.nonce),
            Word::from_u128(self.offer.offered_price),
            Word::from_u128(self.offer.offered_amount),
        ]
    }

    /// Parse untrusted calldata words
    pub fn from_words(words: &[Word]) -> Result<Self, ZkError> {
        if words.len() != PUBLIC_SIGNAL_COUNT {
            return Err(ZkError::InvalidPublicInput(format!(
                "expected {} public signals, got {}",
                PUBLIC_SIGNAL_COUNT,
                words.len()
            )));
        }
        if words[0] != Word::from_u128(VALIDITY_FLAG as u128) {
            return Err(ZkError::InvalidPublicInput("validity flag is not set".into()));
        }

        let commitment = Commitment::from_be_bytes(words[1].as_bytes())
            .map_err(|e| ZkError::InvalidPublicInput(e.to_string()))?;
        let nonce = narrow(&words[2], "nonce")?;
        let offered_price = narrow(&words[3], "offered price")?;
        let offered_amount = narrow(&words[4], "offered amount")?;

        Ok(Self::new(
            commitment,
            nonce,
            OfferValues::new(offered_price, offered_amount),
        ))
    }
}

fn narrow(word: &Word, name: &str) -> Result<u128, ZkError> {
    word.to_u128()
        .ok_or_else(|| ZkError::InvalidPublicInput(format!("{} exceeds {} bits", name, RANGE_BITS)))
}
