//! SHADE Hidden-Limit Proofs
//!
//! Groth16 over BN254 for orders with hidden minimum price and amount.
//! A proof convinces a verifier that a taker's offer meets the maker's
//! committed limits without revealing them.
//!
//! # Key Features
//! - Poseidon commitment opening inside the circuit
//! - 128-bit range checks on every price and amount
//! - EIP-197 calldata encoding and snarkjs JSON export
//! - Cancellable proving on the tokio blocking pool

pub mod calldata;
pub mod errors;
pub mod gadgets;
pub mod groth16_prover;
pub mod prover;
pub mod r1cs_circuit;
pub mod types;
pub mod verifier;

pub use calldata::{CalldataProof, SnarkJsProof, Word};
pub use errors::ZkError;
pub use groth16_prover::{
    artifact_dir, groth16_setup, groth16_setup_seeded, load_verifying_key, CircuitArtifacts, Groth16Backend,
    ProvingBackend, ProvingContext, VerifyingContext, PROVING_KEY_FILE, VERIFYING_KEY_FILE,
};
pub use prover::{check_witness, GeneratedProof, ProofGenerator};
pub use r1cs_circuit::{circuit_stats, CircuitStats, HiddenLimitCircuit};
pub use types::*;
pub use verifier::{verify, OnChainVerifier};
