//! Poseidon Hash Implementation
//!
//! Circom-compatible Poseidon over the BN254 scalar field. Round constants
//! and MDS matrices come from `light-poseidon`, so digests match circomlib.
//! The permutation is exposed through [`PoseidonParams`] so the R1CS gadget
//! can replay exactly the same rounds inside the circuit.

use ark_bn254::Fr;
use ark_ff::{BigInt, BigInteger, Field, PrimeField, Zero};
use light_poseidon::parameters::bn254_x5::get_poseidon_parameters;
use light_poseidon::PoseidonParameters;
use once_cell::sync::Lazy;
use thiserror::Error;

/// Largest state width shipped with the circom parameter set
pub const MAX_WIDTH: usize = 13;

/// Errors from Poseidon parameter lookup and hashing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("unsupported Poseidon input count: {0} (expected 1..={})", MAX_WIDTH - 1)]
    UnsupportedInputCount(usize),

    #[error("Poseidon parameters unavailable: {0}")]
    Parameters(String),
}

/// Commitment hash parameters (three inputs, state width four)
static THREE_TO_ONE: Lazy<PoseidonParams> = Lazy::new(|| {
    PoseidonParams::for_inputs(3).expect("width 4 is part of the circom parameter set")
});

/// Poseidon parameters for a fixed number of inputs
pub struct PoseidonParams {
    inner: PoseidonParameters<Fr>,
}

impl PoseidonParams {
    /// Load the circom parameters for `inputs` field elements
    pub fn for_inputs(inputs: usize) -> Result<Self, HashError> {
        if inputs == 0 || inputs >= MAX_WIDTH {
            return Err(HashError::UnsupportedInputCount(inputs));
        }
        let width = (inputs + 1) as u8;
        let inner = get_poseidon_parameters::<Fr>(width)
            .map_err(|e| HashError::Parameters(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Shared parameters for the 3-input commitment hash
    pub fn three_to_one() -> &'static Self {
        &THREE_TO_ONE
    }

    /// State width (inputs + 1 capacity element)
    pub fn width(&self) -> usize {
        self.inner.width
    }

    pub fn full_rounds(&self) -> usize {
        self.inner.full_rounds
    }

    pub fn partial_rounds(&self) -> usize {
        self.inner.partial_rounds
    }

    /// S-box exponent
    pub fn alpha(&self) -> u64 {
        self.inner.alpha
    }

    /// Total number of rounds
    pub fn rounds(&self) -> usize {
        self.inner.full_rounds + self.inner.partial_rounds
    }

    /// Whether `round` applies the S-box to every state element
    pub fn is_full_round(&self, round: usize) -> bool {
        let half = self.inner.full_rounds / 2;
        round < half || round >= half + self.inner.partial_rounds
    }

    /// Additive round constant for state element `i` in `round`
    pub fn round_constant(&self, round: usize, i: usize) -> Fr {
        self.inner.ark[round * self.inner.width + i]
    }

    /// MDS matrix entry
    pub fn mds(&self, row: usize, col: usize) -> Fr {
        self.inner.mds[row][col]
    }

    /// Hash exactly `width - 1` inputs; the domain tag occupies slot 0
    pub fn hash(&self, inputs: &[Fr]) -> Result<Fr, HashError> {
        if inputs.len() + 1 != self.width() {
            return Err(HashError::UnsupportedInputCount(inputs.len()));
        }
        let mut state = Vec::with_capacity(self.width());
        state.push(Fr::zero());
        state.extend_from_slice(inputs);
        self.permute(&mut state);
        Ok(state[0])
    }

    /// Apply the full Poseidon permutation in place
    pub fn permute(&self, state: &mut [Fr]) {
        let width = self.width();
        debug_assert_eq!(state.len(), width);

        for round in 0..self.rounds() {
            for (i, element) in state.iter_mut().enumerate() {
                *element += self.round_constant(round, i);
            }

            if self.is_full_round(round) {
                for element in state.iter_mut() {
                    *element = element.pow([self.alpha()]);
                }
            } else {
                state[0] = state[0].pow([self.alpha()]);
            }

            let mixed: Vec<Fr> = (0..width)
                .map(|row| {
                    state
                        .iter()
                        .enumerate()
                        .fold(Fr::zero(), |acc, (col, s)| acc + self.mds(row, col) * s)
                })
                .collect();
            state.copy_from_slice(&mixed);
        }
    }
}

/// Hash 1..=12 field elements with circom Poseidon
pub fn poseidon_hash(inputs: &[Fr]) -> Result<Fr, HashError> {
    if inputs.len() == 3 {
        return PoseidonParams::three_to_one().hash(inputs);
    }
    PoseidonParams::for_inputs(inputs.len())?.hash(inputs)
}

/// Hash three field elements (the commitment arity)
pub fn poseidon_hash3(a: &Fr, b: &Fr, c: &Fr) -> Fr {
    let params = PoseidonParams::three_to_one();
    let mut state = [Fr::zero(), *a, *b, *c];
    params.permute(&mut state);
    state[0]
}

/// Encode a field element as 32 big-endian bytes
pub fn field_to_be_bytes<F: PrimeField>(element: &F) -> [u8; 32] {
    let repr = element.into_bigint().to_bytes_be();
    let mut bytes = [0u8; 32];
    let offset = 32usize.saturating_sub(repr.len());
    let start = repr.len().saturating_sub(32);
    bytes[offset..].copy_from_slice(&repr[start..]);
    bytes
}

/// Decode 32 big-endian bytes into a field element.
///
/// Returns `None` when the integer is not a canonical field element
/// (greater than or equal to the modulus); nothing is reduced.
pub fn field_from_be_bytes<F: PrimeField<BigInt = BigInt<4>>>(bytes: &[u8; 32]) -> Option<F> {
    let mut limbs = [0u64; 4];
    for (i, chunk) in bytes.chunks_exact(8).enumerate() {
        let mut limb = [0u8; 8];
        limb.copy_from_slice(chunk);
        limbs[3 - i] = u64::from_be_bytes(limb);
    }
    F::from_bigint(BigInt(limbs))
}
