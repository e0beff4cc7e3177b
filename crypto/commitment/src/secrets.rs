//! Maker-held secret parameters

use std::fmt;

use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::poseidon::{commit, Commitment};

/// Hidden limits attached to an order.
///
/// Owned by the maker and never sent in clear. The values are fixed at
/// construction; changing any of them would invalidate the published
/// commitment, so there are no setters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretParameters {
    secret_price: u128,
    secret_amount: u128,
    nonce: u128,
}

impl SecretParameters {
    pub fn new(secret_price: u128, secret_amount: u128, nonce: u128) -> Self {
        Self {
            secret_price,
            secret_amount,
            nonce,
        }
    }

    /// Create parameters with a fresh random nonce
    pub fn generate<R: RngCore + CryptoRng>(
        secret_price: u128,
        secret_amount: u128,
        rng: &mut R,
    ) -> Self {
        Self::new(secret_price, secret_amount, rng.gen())
    }

    /// Minimum acceptable price
    pub fn secret_price(&self) -> u128 {
        self.secret_price
    }

    /// Minimum acceptable amount
    pub fn secret_amount(&self) -> u128 {
        self.secret_amount
    }

    pub fn nonce(&self) -> u128 {
        self.nonce
    }

    /// Commitment published with the order
    pub fn commitment(&self) -> Commitment {
        commit(self.secret_price, self.secret_amount, self.nonce)
    }
}

impl fmt::Debug for SecretParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretParameters")
            .field("secret_price", &"<redacted>")
            .field("secret_amount", &"<redacted>")
            .field("nonce", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_commitment_matches_commit() {
        let secrets = SecretParameters::new(2000, 10, 123456789);
        assert_eq!(secrets.commitment(), commit(2000, 10, 123456789));
    }

    #[test]
    fn test_generate_uses_fresh_nonce() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let a = SecretParameters::generate(2000, 10, &mut rng);
        let b = SecretParameters::generate(2000, 10, &mut rng);
        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.commitment(), b.commitment());
    }

    #[test]
    fn test_debug_redacts_values() {
        let secrets = SecretParameters::new(2000, 10, 123456789);
        let debug = format!("{:?}", secrets);
        assert!(!debug.contains("2000"));
        assert!(!debug.contains("123456789"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_zeroize_clears_values() {
        let mut secrets = SecretParameters::new(2000, 10, 123456789);
        secrets.zeroize();
        assert_eq!(secrets.secret_price(), 0);
        assert_eq!(secrets.secret_amount(), 0);
        assert_eq!(secrets.nonce(), 0);
    }
}
