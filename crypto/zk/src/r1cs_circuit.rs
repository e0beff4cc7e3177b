//! Hidden-limit R1CS circuit
//!
//! Proves, without revealing the maker's secrets, that:
//! 1. `Poseidon(secret_price, secret_amount, nonce)` equals the public commitment
//! 2. the private nonce equals the public nonce
//! 3. every price and amount fits in [`RANGE_BITS`] bits
//! 4. `offered_price >= secret_price` and `offered_amount >= secret_amount`
//!
//! Public inputs are allocated in signal order:
//! `[validity_flag, commitment, nonce, offered_price, offered_amount]`.

use ark_bn254::Fr;
use ark_r1cs_std::{
    alloc::AllocVar,
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, SynthesisError, SynthesisMode,
};
use shade_commitment::SecretParameters;

use crate::errors::ZkError;
use crate::gadgets::{enforce_bit_length, enforce_geq, poseidon_hash3_var};
use crate::types::{PublicSignals, RANGE_BITS, VALIDITY_FLAG};

/// Hidden-limit order circuit
#[derive(Clone, Default)]
pub struct HiddenLimitCircuit {
    /// Maker secrets (private witness)
    pub secrets: Option<SecretParameters>,
    /// Commitment, nonce and offer (public inputs)
    pub public_signals: Option<PublicSignals>,
}

impl HiddenLimitCircuit {
    /// Create an empty circuit (for setup)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a circuit with a full assignment
    pub fn with_inputs(secrets: SecretParameters, public_signals: PublicSignals) -> Self {
        Self {
            secrets: Some(secrets),
            public_signals: Some(public_signals),
        }
    }
}

fn assigned<T>(value: Option<T>) -> Result<T, SynthesisError> {
    value.ok_or(SynthesisError::AssignmentMissing)
}

impl ConstraintSynthesizer<Fr> for HiddenLimitCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let secrets = self.secrets.as_ref();
        let public = self.public_signals.as_ref();

        // === Public inputs ===

        let validity = FpVar::new_input(cs.clone(), || Ok(Fr::from(VALIDITY_FLAG)))?;
        let commitment = FpVar::new_input(cs.clone(), || {
            assigned(public.map(|p| *p.commitment.as_field()))
        })?;
        let public_nonce =
            FpVar::new_input(cs.clone(), || assigned(public.map(|p| Fr::from(p.nonce))))?;
        let offered_price = FpVar::new_input(cs.clone(), || {
            assigned(public.map(|p| Fr::from(p.offer.offered_price)))
        })?;
        let offered_amount = FpVar::new_input(cs.clone(), || {
            assigned(public.map(|p| Fr::from(p.offer.offered_amount)))
        })?;

        // === Private witness ===

        let secret_price = FpVar::new_witness(cs.clone(), || {
            assigned(secrets.map(|s| Fr::from(s.secret_price())))
        })?;
        let secret_amount = FpVar::new_witness(cs.clone(), || {
            assigned(secrets.map(|s| Fr::from(s.secret_amount())))
        })?;
        let nonce =
            FpVar::new_witness(cs.clone(), || assigned(secrets.map(|s| Fr::from(s.nonce()))))?;

        validity.enforce_equal(&FpVar::one())?;
        nonce.enforce_equal(&public_nonce)?;

        // === Commitment opening ===

        let recomputed = poseidon_hash3_var(&secret_price, &secret_amount, &nonce)?;
        recomputed.enforce_equal(&commitment)?;

        // === Range checks ===

        let native_secret_price = secrets.map(|s| s.secret_price());
        let native_secret_amount = secrets.map(|s| s.secret_amount());
        let native_offered_price = public.map(|p| p.offer.offered_price);
        let native_offered_amount = public.map(|p| p.offer.offered_amount);

        enforce_bit_length(cs.clone(), &secret_price, native_secret_price, RANGE_BITS)?;
        enforce_bit_length(cs.clone(), &secret_amount, native_secret_amount, RANGE_BITS)?;
        enforce_bit_length(cs.clone(), &offered_price, native_offered_price, RANGE_BITS)?;
        enforce_bit_length(cs.clone(), &offered_amount, native_offered_amount, RANGE_BITS)?;

        // === Limit checks ===

        enforce_geq(
            cs.clone(),
            &offered_price,
            &secret_price,
            native_offered_price,
            native_secret_price,
            RANGE_BITS,
        )?;
        enforce_geq(
            cs,
            &offered_amount,
            &secret_amount,
            native_offered_amount,
            native_secret_amount,
            RANGE_BITS,
        )?;

        Ok(())
    }
}

/// Circuit statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitStats {
    /// Number of instance variables, including the constant one
    pub num_public_inputs: usize,
    /// Number of private witness variables
    pub num_witness_vars: usize,
    /// Number of constraints
    pub num_constraints: usize,
}

impl CircuitStats {
    /// Get stats from a constraint system
    pub fn from_cs(cs: &ConstraintSystemRef<Fr>) -> Self {
        Self {
            num_public_inputs: cs.num_instance_variables(),
            num_witness_vars: cs.num_witness_variables(),
            num_constraints: cs.num_constraints(),
        }
    }
}

/// Synthesize the empty circuit in setup mode and report its shape
pub fn circuit_stats() -> Result<CircuitStats, ZkError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    cs.set_mode(SynthesisMode::Setup);
    HiddenLimitCircuit::new()
        .generate_constraints(cs.clone())
        .map_err(|e| ZkError::SetupError(format!("Circuit synthesis failed: {}", e)))?;
    Ok(CircuitStats::from_cs(&cs))
}
