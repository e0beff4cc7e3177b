//! Predicate data attached to an order's authorization field
//!
//! Sixteen 32-byte words:
//!
//! | words  | content                          |
//! |--------|----------------------------------|
//! | 0      | commitment                       |
//! | 1, 2   | offered price, offered amount    |
//! | 3..5   | proof `a`                        |
//! | 5..9   | proof `b` (precompile order)     |
//! | 9..11  | proof `c`                        |
//! | 11..16 | public signals                   |

use serde::{Deserialize, Serialize};
use shade_commitment::Commitment;
use shade_zk::{CalldataProof, GeneratedProof, OfferValues, Word, PUBLIC_SIGNAL_COUNT};

use crate::errors::PredicateError;

/// Number of words in an encoded blob
pub const BLOB_WORDS: usize = 3 + CalldataProof::WORDS + PUBLIC_SIGNAL_COUNT;
/// Encoded length in bytes
pub const BLOB_LEN: usize = BLOB_WORDS * 32;

/// Decoded predicate data
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateBlob {
    pub commitment: Commitment,
    pub offer: OfferValues,
    pub proof: CalldataProof,
    pub signals: [Word; PUBLIC_SIGNAL_COUNT],
}

impl PredicateBlob {
    /// Bind a generated proof to the order it was made for
    pub fn from_generated(commitment: Commitment, offer: OfferValues, generated: &GeneratedProof) -> Self {
        Self {
            commitment,
            offer,
            proof: generated.calldata(),
            signals: generated.signal_words(),
        }
    }

    pub fn to_words(&self) -> Vec<Word> {
        let mut words = Vec::with_capacity(BLOB_WORDS);
        words.push(Word::from_be_bytes(self.commitment.to_be_bytes()));
        words.push(Word::from_u128(self.offer.offered_price));
        words.push(Word::from_u128(self.offer.offered_amount));
        words.extend_from_slice(&self.proof.to_words());
        words.extend_from_slice(&self.signals);
        words
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_words()
            .iter()
            .flat_map(|w| w.as_bytes().iter().copied())
            .collect()
    }

    /// Decode an exact-length blob.
    ///
    /// Only the declared commitment and offer are range checked here; proof
    /// and signal words are left to the verifier.
    pub fn decode(bytes: &[u8]) -> Result<Self, PredicateError> {
        if bytes.len() != BLOB_LEN {
            return Err(PredicateError::InvalidLength {
                expected: BLOB_LEN,
                found: bytes.len(),
            });
        }

        let words: Vec<Word> = bytes
            .chunks_exact(32)
            .map(|chunk| {
                let mut word = [0u8; 32];
                word.copy_from_slice(chunk);
                Word::from_be_bytes(word)
            })
            .collect();

        let commitment = Commitment::from_be_bytes(words[0].as_bytes())
            .map_err(|_| PredicateError::OutOfRange("commitment"))?;
        let offered_price = words[1]
            .to_u128()
            .ok_or(PredicateError::OutOfRange("offered_price"))?;
        let offered_amount = words[2]
            .to_u128()
            .ok_or(PredicateError::OutOfRange("offered_amount"))?;

        let proof_end = 3 + CalldataProof::WORDS;
        let proof = CalldataProof::from_words(&words[3..proof_end])
            .ok_or(PredicateError::OutOfRange("proof"))?;

        let mut signals = [Word::ZERO; PUBLIC_SIGNAL_COUNT];
        signals.copy_from_slice(&words[proof_end..]);

        Ok(Self {
            commitment,
            offer: OfferValues::new(offered_price, offered_amount),
            proof,
            signals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shade_commitment::commit;

    fn blob() -> PredicateBlob {
        let commitment = commit(2000, 10, 123456789);
        let offer = OfferValues::new(2100, 50);
        let signals = shade_zk::PublicSignals::new(commitment, 123456789, offer).to_words();
        PredicateBlob {
            commitment,
            offer,
            proof: CalldataProof::from_words(&[Word::ONE; 8]).unwrap(),
            signals,
        }
    }

    #[test]
    fn test_layout() {
        assert_eq!(BLOB_WORDS, 16);
        let bytes = blob().encode();
        assert_eq!(bytes.len(), BLOB_LEN);
        // offered price sits in word 1
        assert_eq!(Word::from_u128(2100).as_bytes()[..], bytes[32..64]);
        // signals start at word 11 with the validity flag
        assert_eq!(bytes[11 * 32 + 31], 1);
    }

    #[test]
    fn test_decode_roundtrip() {
        let original = blob();
        assert_eq!(PredicateBlob::decode(&original.encode()).unwrap(), original);
    }

    #[test]
    fn test_decode_rejects_length() {
        assert_eq!(
            PredicateBlob::decode(&[]),
            Err(PredicateError::InvalidLength {
                expected: BLOB_LEN,
                found: 0
            })
        );
        let mut bytes = blob().encode();
        bytes.push(0);
        assert!(PredicateBlob::decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_wide_offer() {
        let mut bytes = blob().encode();
        bytes[32] = 1;
        assert_eq!(
            PredicateBlob::decode(&bytes),
            Err(PredicateError::OutOfRange("offered_price"))
        );
    }
}
