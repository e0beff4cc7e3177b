//! Range and comparison constraints

use ark_bn254::Fr;
use ark_ff::Field;
use ark_r1cs_std::{
    alloc::AllocVar,
    boolean::Boolean,
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Decompose `value` into `bits` boolean witnesses and bind their weighted
/// sum to `value`, proving `0 <= value < 2^bits`.
///
/// `native` is the witness value as an integer; `None` during setup.
pub fn enforce_bit_length(
    cs: ConstraintSystemRef<Fr>,
    value: &FpVar<Fr>,
    native: Option<u128>,
    bits: usize,
) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
    if bits == 0 || bits > u128::BITS as usize {
        return Err(SynthesisError::Unsatisfiable);
    }

    let mut decomposed = Vec::with_capacity(bits);
    let mut sum = FpVar::<Fr>::zero();
    let mut weight = Fr::ONE;

    for i in 0..bits {
        let bit = Boolean::new_witness(cs.clone(), || {
            native
                .map(|v| (v >> i) & 1 == 1)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        sum += FpVar::from(bit.clone()) * weight;
        weight.double_in_place();
        decomposed.push(bit);
    }

    sum.enforce_equal(value)?;
    Ok(decomposed)
}

/// Enforce `lhs >= rhs` for operands already known to fit in `bits` bits.
///
/// The difference is range checked; when `lhs < rhs` it wraps to a field
/// element near the modulus, which no `bits`-bit decomposition can reach.
pub fn enforce_geq(
    cs: ConstraintSystemRef<Fr>,
    lhs: &FpVar<Fr>,
    rhs: &FpVar<Fr>,
    lhs_native: Option<u128>,
    rhs_native: Option<u128>,
    bits: usize,
) -> Result<(), SynthesisError> {
    let difference = lhs - rhs;
    let native = lhs_native.zip(rhs_native).map(|(l, r)| l.wrapping_sub(r));
    enforce_bit_length(cs, &difference, native, bits)?;
    Ok(())
}
