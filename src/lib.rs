//! SHADE: Hidden-Limit Order Fill Authorization
//!
//! This is the root crate that re-exports all SHADE components for integration
//! testing and provides unified access to the protocol primitives.
//!
//! ## Architecture Overview
//!
//! A maker publishes an order whose minimum price and amount are hidden
//! behind a Poseidon commitment. A taker's fill is authorized only by a
//! Groth16 proof that the offer meets those limits:
//!
//! - **Commitments**: circom-compatible Poseidon over BN254
//! - **Proofs**: Groth16 with 128-bit range checks, EIP-197 calldata
//! - **Predicate**: binding checks plus verification, the only approval path
//! - **Fill lifecycle**: authorize, approve, execute and confirm with retry
//!
//! ## Crate Organization
//!
//! - `shade-hash`: Poseidon and BLAKE3 hashing
//! - `shade-commitment`: Commitments and maker secrets
//! - `shade-zk`: Circuit, proving, verification and calldata
//! - `shade-predicate`: Settlement predicate adapter
//! - `shade-fill`: Fill state machine and maker authorization service

pub use shade_commitment as commitment;
pub use shade_fill as fill;
pub use shade_hash as hash;
pub use shade_predicate as predicate;
pub use shade_zk as zk;

/// SHADE protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used types
pub mod prelude {
    pub use shade_commitment::{commit, Commitment, SecretParameters};
    pub use shade_fill::{
        FillAuthorization, FillConfig, FillError, FillEvent, FillPhase, FillRequest,
        FillServices, HiddenLimitOrder, MakerService, StepId, StepState,
    };
    pub use shade_predicate::{AuthorizationDecision, PredicateAdapter, RejectionReason};
    pub use shade_zk::{
        verify, CalldataProof, CircuitArtifacts, GeneratedProof, OfferValues, OnChainVerifier,
        ProofGenerator, PublicSignals, Word, ZkError, RANGE_BITS,
    };
}
