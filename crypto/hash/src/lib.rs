//! SHADE Hash Functions
//!
//! - Poseidon: ZK-friendly algebraic hash (circom parameters over BN254),
//!   used for order commitments both natively and inside the circuit
//! - BLAKE3: fast general-purpose hashing for artifact fingerprints

pub mod poseidon;

pub use blake3;
pub use poseidon::{
    field_from_be_bytes, field_to_be_bytes, poseidon_hash, poseidon_hash3, HashError,
    PoseidonParams,
};

/// Hash data using BLAKE3
pub fn hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Hash multiple inputs with BLAKE3
pub fn hash_many(inputs: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for input in inputs {
        hasher.update(input);
    }
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_many_matches_concatenation() {
        assert_eq!(hash_many(&[b"shade", b"-vk"]), hash(b"shade-vk"));
    }
}
