//! Proof generation for hidden-limit fills

use std::sync::Arc;
use std::time::Instant;

use ark_bn254::Bn254;
use ark_groth16::Proof;
use shade_commitment::{Commitment, SecretParameters};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::calldata::{CalldataProof, SnarkJsProof, Word};
use crate::errors::ZkError;
use crate::groth16_prover::{Groth16Backend, ProvingBackend, ProvingContext};
use crate::r1cs_circuit::HiddenLimitCircuit;
use crate::types::{OfferValues, PublicSignals, PUBLIC_SIGNAL_COUNT};

/// A proof together with the signals it was generated for
#[derive(Clone, Debug)]
pub struct GeneratedProof {
    pub proof: Proof<Bn254>,
    pub public_signals: PublicSignals,
}

impl GeneratedProof {
    /// Proof in precompile calldata order
    pub fn calldata(&self) -> CalldataProof {
        CalldataProof::from_proof(&self.proof)
    }

    /// Public signals as calldata words
    pub fn signal_words(&self) -> [Word; PUBLIC_SIGNAL_COUNT] {
        self.public_signals.to_words()
    }

    /// Proof in snarkjs JSON layout
    pub fn to_snarkjs(&self) -> SnarkJsProof {
        SnarkJsProof::from_proof(&self.proof)
    }
}

/// Check the witness against the fill before proving.
///
/// Order matters: commitment, then price, then amount.
pub fn check_witness(
    secrets: &SecretParameters,
    commitment: &Commitment,
    offer: &OfferValues,
) -> Result<(), ZkError> {
    if secrets.commitment() != *commitment {
        return Err(ZkError::CommitmentMismatch);
    }
    if offer.offered_price < secrets.secret_price() {
        return Err(ZkError::PriceConstraintViolated);
    }
    if offer.offered_amount < secrets.secret_amount() {
        return Err(ZkError::AmountConstraintViolated);
    }
    Ok(())
}

/// Generates hidden-limit proofs.
///
/// Cheap to clone; the proving key is shared.
#[derive(Clone)]
pub struct ProofGenerator {
    backend: Arc<dyn ProvingBackend>,
}

impl ProofGenerator {
    /// Groth16 generator over a loaded proving key
    pub fn new(ctx: Arc<ProvingContext>) -> Self {
        Self::with_backend(Arc::new(Groth16Backend::new(ctx)))
    }

    pub fn with_backend(backend: Arc<dyn ProvingBackend>) -> Self {
        Self { backend }
    }

    /// Prove that `offer` satisfies the limits behind `commitment`.
    ///
    /// Fails fast on constraint violations without touching the backend.
    pub fn prove(
        &self,
        secrets: &SecretParameters,
        commitment: &Commitment,
        offer: &OfferValues,
    ) -> Result<GeneratedProof, ZkError> {
        if let Err(e) = check_witness(secrets, commitment, offer) {
            debug!(commitment = %commitment, error = %e, "witness rejected before proving");
            return Err(e);
        }

        let public_signals = PublicSignals::new(*commitment, secrets.nonce(), *offer);
        let circuit = HiddenLimitCircuit::with_inputs(secrets.clone(), public_signals);

        let started = Instant::now();
        let proof = self.backend.prove(circuit).map_err(|e| {
            warn!(commitment = %commitment, error = %e, "proof generation failed");
            e
        })?;
        debug!(
            commitment = %commitment,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "proof generated"
        );

        Ok(GeneratedProof {
            proof,
            public_signals,
        })
    }

    /// Prove on the blocking pool.
    ///
    /// When `cancel` fires first the result is discarded and
    /// [`ZkError::Cancelled`] is returned.
    pub async fn prove_async(
        &self,
        secrets: SecretParameters,
        commitment: Commitment,
        offer: OfferValues,
        cancel: CancellationToken,
    ) -> Result<GeneratedProof, ZkError> {
        check_witness(&secrets, &commitment, &offer)?;

        let generator = self.clone();
        let task =
            tokio::task::spawn_blocking(move || generator.prove(&secrets, &commitment, &offer));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(commitment = %commitment, "proof generation cancelled");
                Err(ZkError::Cancelled)
            }
            joined = task => joined.map_err(|e| {
                ZkError::ProofGenerationFailed(format!("Proving task failed: {}", e))
            })?,
        }
    }
}
