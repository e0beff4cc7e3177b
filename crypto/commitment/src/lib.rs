//! SHADE Commitment Scheme
//!
//! Binds a maker's hidden minimum price, minimum amount and nonce into a
//! single public field element. The same Poseidon permutation is replayed
//! inside the constraint circuit, so a commitment published here can be
//! re-derived bit-for-bit by the prover.

pub mod poseidon;
pub mod secrets;

pub use poseidon::{commit, Commitment, CommitmentError};
pub use secrets::SecretParameters;
