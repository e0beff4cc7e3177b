//! Verification with on-chain semantics
//!
//! Mirrors what a precompile-backed contract verifier does with untrusted
//! calldata: malformed input of any kind is a rejection, never a panic or an
//! error the caller has to handle.

use std::sync::Arc;

use ark_bn254::Fr;
use tracing::debug;

use crate::calldata::{CalldataProof, Word};
use crate::groth16_prover::{groth16_verify, VerifyingContext};
use crate::prover::GeneratedProof;
use crate::types::PUBLIC_SIGNAL_COUNT;

/// Verify `proof` against `signals` under `vk`.
///
/// Returns `false` for wrong arity, non-canonical words, invalid curve
/// points, or a failing pairing check.
pub fn verify(proof: &CalldataProof, signals: &[Word], vk: &VerifyingContext) -> bool {
    if signals.len() != PUBLIC_SIGNAL_COUNT {
        debug!(
            expected = PUBLIC_SIGNAL_COUNT,
            found = signals.len(),
            "rejecting proof: wrong signal count"
        );
        return false;
    }

    let inputs: Option<Vec<Fr>> = signals.iter().map(Word::to_field::<Fr>).collect();
    let Some(inputs) = inputs else {
        debug!("rejecting proof: signal outside scalar field");
        return false;
    };

    let Some(proof) = proof.to_proof() else {
        debug!("rejecting proof: invalid curve point");
        return false;
    };

    groth16_verify(vk, &proof, &inputs)
}

/// Verifier bound to one verifying key, the way a deployed contract is
#[derive(Clone)]
pub struct OnChainVerifier {
    vk: Arc<VerifyingContext>,
}

impl OnChainVerifier {
    pub fn new(vk: Arc<VerifyingContext>) -> Self {
        Self { vk }
    }

    pub fn verifying_context(&self) -> &VerifyingContext {
        &self.vk
    }

    pub fn verify(&self, proof: &CalldataProof, signals: &[Word]) -> bool {
        verify(proof, signals, &self.vk)
    }

    /// Verify a locally generated proof through the calldata path
    pub fn verify_generated(&self, generated: &GeneratedProof) -> bool {
        self.verify(&generated.calldata(), &generated.signal_words())
    }
}
