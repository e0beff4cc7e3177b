//! Poseidon permutation over `FpVar`
//!
//! Replays the native permutation from `shade_hash` round by round, reading
//! the same constants, so the in-circuit digest equals the off-circuit
//! commitment.

use ark_bn254::Fr;
use ark_r1cs_std::fields::{fp::FpVar, FieldVar};
use ark_relations::r1cs::SynthesisError;
use shade_hash::PoseidonParams;

/// Hash `inputs` with `params`; `inputs.len()` must be `params.width() - 1`
pub fn poseidon_hash_var(
    params: &PoseidonParams,
    inputs: &[FpVar<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let width = params.width();
    if inputs.len() + 1 != width || params.alpha() != 5 {
        return Err(SynthesisError::Unsatisfiable);
    }

    // capacity element carries the zero domain tag
    let mut state = Vec::with_capacity(width);
    state.push(FpVar::Constant(Fr::from(0u64)));
    state.extend(inputs.iter().cloned());

    for round in 0..params.rounds() {
        for (i, element) in state.iter_mut().enumerate() {
            *element += params.round_constant(round, i);
        }

        if params.is_full_round(round) {
            for element in state.iter_mut() {
                *element = sbox(element)?;
            }
        } else {
            state[0] = sbox(&state[0])?;
        }

        state = (0..width)
            .map(|row| {
                state
                    .iter()
                    .enumerate()
                    .fold(FpVar::zero(), |acc, (col, element)| {
                        acc + element * params.mds(row, col)
                    })
            })
            .collect();
    }

    Ok(state.swap_remove(0))
}

/// Three-input hash matching `shade_hash::poseidon_hash3`
pub fn poseidon_hash3_var(
    a: &FpVar<Fr>,
    b: &FpVar<Fr>,
    c: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    poseidon_hash_var(
        PoseidonParams::three_to_one(),
        &[a.clone(), b.clone(), c.clone()],
    )
}

fn sbox(x: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let x2 = x.square()?;
    let x4 = x2.square()?;
    Ok(x4 * x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_r1cs_std::{alloc::AllocVar, R1CSVar};
    use ark_relations::r1cs::ConstraintSystem;
    use shade_hash::poseidon_hash3;

    #[test]
    fn test_gadget_matches_native() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let values = [Fr::from(2000u64), Fr::from(10u64), Fr::from(123456789u64)];
        let vars: Vec<FpVar<Fr>> = values
            .iter()
            .map(|v| FpVar::new_witness(cs.clone(), || Ok(*v)).unwrap())
            .collect();

        let digest = poseidon_hash3_var(&vars[0], &vars[1], &vars[2]).unwrap();

        assert_eq!(
            digest.value().unwrap(),
            poseidon_hash3(&values[0], &values[1], &values[2])
        );
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_constraint_count_is_fixed() {
        // 8 full rounds * 4 sboxes + 56 partial rounds * 1 sbox, 3 constraints each
        let cs = ConstraintSystem::<Fr>::new_ref();
        let vars: Vec<FpVar<Fr>> = (1..=3u64)
            .map(|v| FpVar::new_witness(cs.clone(), || Ok(Fr::from(v))).unwrap())
            .collect();
        let _digest = poseidon_hash3_var(&vars[0], &vars[1], &vars[2]).unwrap();
        assert!(cs.num_constraints() <= (8 * 4 + 56) * 3);
        assert!(cs.num_constraints() > 0);
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let a = FpVar::new_witness(cs, || Ok(Fr::from(1u64))).unwrap();
        let result = poseidon_hash_var(PoseidonParams::three_to_one(), &[a]);
        assert!(matches!(result, Err(SynthesisError::Unsatisfiable)));
    }
}
