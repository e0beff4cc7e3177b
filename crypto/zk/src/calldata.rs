//! EVM calldata encoding of Groth16 proofs
//!
//! Precompile-compatible verifiers (EIP-197) take G2 coordinates with the
//! imaginary component first, the reverse of how snarkjs prints them. The
//! swap is done here and nowhere else: [`CalldataProof`] is always in
//! precompile order and [`SnarkJsProof`] always in snarkjs order.

use std::fmt;
use std::str::FromStr;

use ark_bn254::{Bn254, Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInt, PrimeField};
use ark_groth16::Proof;
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shade_hash::{field_from_be_bytes, field_to_be_bytes};

use crate::errors::ZkError;

/// A 256-bit big-endian calldata word
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Word([u8; 32]);

impl Word {
    pub const ZERO: Word = Word([0u8; 32]);

    pub const ONE: Word = {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        Word(bytes)
    };

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// `None` if the word does not fit in 128 bits
    pub fn to_u128(&self) -> Option<u128> {
        if self.0[..16].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&self.0[16..]);
        Some(u128::from_be_bytes(low))
    }

    pub fn from_field<F: PrimeField>(value: &F) -> Self {
        Self(field_to_be_bytes(value))
    }

    /// Strict conversion; `None` for values at or above the field modulus
    pub fn to_field<F: PrimeField<BigInt = BigInt<4>>>(&self) -> Option<F> {
        field_from_be_bytes(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BigUint::from_bytes_be(&self.0))
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Word {
    type Err = ZkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(digits) => BigUint::parse_bytes(digits.as_bytes(), 16),
            None => BigUint::parse_bytes(s.as_bytes(), 10),
        }
        .ok_or_else(|| ZkError::SerializationError(format!("invalid integer: {:?}", s)))?;

        let raw = parsed.to_bytes_be();
        if raw.len() > 32 {
            return Err(ZkError::SerializationError(format!(
                "integer does not fit in 256 bits: {}",
                s
            )));
        }
        let mut bytes = [0u8; 32];
        bytes[32 - raw.len()..].copy_from_slice(&raw);
        Ok(Self(bytes))
    }
}

impl Serialize for Word {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Word {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Groth16 proof as `(a, b, c)` in precompile order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalldataProof {
    pub a: [Word; 2],
    /// `[[x.c1, x.c0], [y.c1, y.c0]]`
    pub b: [[Word; 2]; 2],
    pub c: [Word; 2],
}

impl CalldataProof {
    /// Number of words in the flat encoding
    pub const WORDS: usize = 8;

    pub fn from_proof(proof: &Proof<Bn254>) -> Self {
        Self {
            a: encode_g1(&proof.a),
            b: encode_g2(&proof.b),
            c: encode_g1(&proof.c),
        }
    }

    /// Decode back into curve points.
    ///
    /// Returns `None` if any coordinate is non-canonical or any point is off
    /// the curve or outside the prime-order subgroup.
    pub fn to_proof(&self) -> Option<Proof<Bn254>> {
        Some(Proof {
            a: decode_g1(&self.a)?,
            b: decode_g2(&self.b)?,
            c: decode_g1(&self.c)?,
        })
    }

    /// Flat `a ‖ b ‖ c` word order
    pub fn to_words(&self) -> [Word; Self::WORDS] {
        [
            self.a[0], self.a[1], self.b[0][0], self.b[0][1], self.b[1][0], self.b[1][1],
            self.c[0], self.c[1],
        ]
    }

    pub fn from_words(words: &[Word]) -> Option<Self> {
        if words.len() != Self::WORDS {
            return None;
        }
        Some(Self {
            a: [words[0], words[1]],
            b: [[words[2], words[3]], [words[4], words[5]]],
            c: [words[6], words[7]],
        })
    }
}

fn encode_g1(point: &G1Affine) -> [Word; 2] {
    match point.xy() {
        Some((x, y)) => [Word::from_field(x), Word::from_field(y)],
        None => [Word::ZERO; 2],
    }
}

fn encode_g2(point: &G2Affine) -> [[Word; 2]; 2] {
    match point.xy() {
        Some((x, y)) => [
            [Word::from_field(&x.c1), Word::from_field(&x.c0)],
            [Word::from_field(&y.c1), Word::from_field(&y.c0)],
        ],
        None => [[Word::ZERO; 2]; 2],
    }
}

fn decode_g1(words: &[Word; 2]) -> Option<G1Affine> {
    if words.iter().all(Word::is_zero) {
        return Some(G1Affine::zero());
    }
    let x: Fq = words[0].to_field()?;
    let y: Fq = words[1].to_field()?;
    let point = G1Affine::new_unchecked(x, y);
    (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
}

fn decode_g2(words: &[[Word; 2]; 2]) -> Option<G2Affine> {
    if words.iter().flatten().all(Word::is_zero) {
        return Some(G2Affine::zero());
    }
    let x = Fq2::new(words[0][1].to_field()?, words[0][0].to_field()?);
    let y = Fq2::new(words[1][1].to_field()?, words[1][0].to_field()?);
    let point = G2Affine::new_unchecked(x, y);
    (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
}

/// Proof in the JSON layout snarkjs emits (`proof.json`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnarkJsProof {
    pub pi_a: [String; 3],
    /// `[[x.c0, x.c1], [y.c0, y.c1], [1, 0]]`
    pub pi_b: [[String; 2]; 3],
    pub pi_c: [String; 3],
    pub protocol: String,
    pub curve: String,
}

impl SnarkJsProof {
    pub fn from_proof(proof: &Proof<Bn254>) -> Self {
        let projective_g1 = |p: &G1Affine| match p.xy() {
            Some((x, y)) => [field_string(x), field_string(y), "1".to_string()],
            None => ["0".to_string(), "1".to_string(), "0".to_string()],
        };
        let pi_b = match proof.b.xy() {
            Some((x, y)) => [
                [field_string(&x.c0), field_string(&x.c1)],
                [field_string(&y.c0), field_string(&y.c1)],
                ["1".to_string(), "0".to_string()],
            ],
            None => [
                ["0".to_string(), "0".to_string()],
                ["1".to_string(), "0".to_string()],
                ["0".to_string(), "0".to_string()],
            ],
        };
        Self {
            pi_a: projective_g1(&proof.a),
            pi_b,
            pi_c: projective_g1(&proof.c),
            protocol: "groth16".to_string(),
            curve: "bn128".to_string(),
        }
    }

    /// Reorder into precompile calldata
    pub fn to_calldata(&self) -> Result<CalldataProof, ZkError> {
        if self.protocol != "groth16" || self.curve != "bn128" {
            return Err(ZkError::SerializationError(format!(
                "unsupported proof type {}/{}",
                self.protocol, self.curve
            )));
        }
        let g1 = |coords: &[String; 3]| -> Result<[Word; 2], ZkError> {
            if coords[2].trim() == "0" {
                return Ok([Word::ZERO; 2]);
            }
            Ok([coords[0].parse()?, coords[1].parse()?])
        };
        let b = if self.pi_b[2][0].trim() == "0" {
            [[Word::ZERO; 2]; 2]
        } else {
            [
                [self.pi_b[0][1].parse()?, self.pi_b[0][0].parse()?],
                [self.pi_b[1][1].parse()?, self.pi_b[1][0].parse()?],
            ]
        };
        Ok(CalldataProof {
            a: g1(&self.pi_a)?,
            b,
            c: g1(&self.pi_c)?,
        })
    }
}

fn field_string(value: &Fq) -> String {
    Word::from_field(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::CurveGroup;
    use ark_std::UniformRand;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const G2_X_C0: &str =
        "10857046999023057135944570762232829481370756359578518086990519993285655852781";
    const G2_X_C1: &str =
        "11559732032986387107991004021392285783925812861821192530917403151452391805634";
    const G2_Y_C0: &str =
        "8495653923123431417604973247489272438418190587263600148770280649306958101930";
    const G2_Y_C1: &str =
        "4082367875863433681332203403145435568316851327593401208105741076214120093531";

    fn sample_proof() -> Proof<Bn254> {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        Proof {
            a: (G1Affine::generator() * ark_bn254::Fr::rand(&mut rng)).into_affine(),
            b: G2Affine::generator(),
            c: (G1Affine::generator() * ark_bn254::Fr::rand(&mut rng)).into_affine(),
        }
    }

    #[test]
    fn test_g2_generator_golden_vector() {
        let calldata = CalldataProof::from_proof(&sample_proof());
        assert_eq!(calldata.b[0][0].to_string(), G2_X_C1);
        assert_eq!(calldata.b[0][1].to_string(), G2_X_C0);
        assert_eq!(calldata.b[1][0].to_string(), G2_Y_C1);
        assert_eq!(calldata.b[1][1].to_string(), G2_Y_C0);
    }

    #[test]
    fn test_snarkjs_keeps_natural_order() {
        let json = SnarkJsProof::from_proof(&sample_proof());
        assert_eq!(json.pi_b[0], [G2_X_C0.to_string(), G2_X_C1.to_string()]);
        assert_eq!(json.pi_b[1], [G2_Y_C0.to_string(), G2_Y_C1.to_string()]);
        assert_eq!(json.pi_b[2], ["1".to_string(), "0".to_string()]);
        assert_eq!(json.protocol, "groth16");
        assert_eq!(json.curve, "bn128");
    }

    #[test]
    fn test_snarkjs_to_calldata_swaps_once() {
        let proof = sample_proof();
        let via_json = SnarkJsProof::from_proof(&proof).to_calldata().unwrap();
        assert_eq!(via_json, CalldataProof::from_proof(&proof));
    }

    #[test]
    fn test_calldata_decodes_to_same_points() {
        let proof = sample_proof();
        let decoded = CalldataProof::from_proof(&proof).to_proof().unwrap();
        assert_eq!(decoded, proof);
    }

    #[test]
    fn test_unswapped_g2_is_rejected() {
        let mut calldata = CalldataProof::from_proof(&sample_proof());
        calldata.b[0].swap(0, 1);
        calldata.b[1].swap(0, 1);
        assert!(calldata.to_proof().is_none());
    }

    #[test]
    fn test_off_curve_point_is_rejected() {
        let mut calldata = CalldataProof::from_proof(&sample_proof());
        calldata.a[1] = Word::ONE;
        assert!(calldata.to_proof().is_none());
    }

    #[test]
    fn test_non_canonical_coordinate_is_rejected() {
        let mut calldata = CalldataProof::from_proof(&sample_proof());
        calldata.c[0] = Word::from_be_bytes([0xff; 32]);
        assert!(calldata.to_proof().is_none());
    }

    #[test]
    fn test_flat_words_roundtrip() {
        let calldata = CalldataProof::from_proof(&sample_proof());
        let words = calldata.to_words();
        assert_eq!(CalldataProof::from_words(&words), Some(calldata));
        assert_eq!(CalldataProof::from_words(&words[..7]), None);
    }

    #[test]
    fn test_word_text_forms() {
        let w: Word = "0x10".parse().unwrap();
        assert_eq!(w, Word::from_u128(16));
        assert_eq!(w.to_string(), "16");
        assert_eq!(Word::ONE.to_u128(), Some(1));
        assert_eq!(Word::ZERO.to_string(), "0");
        assert!("12abc".parse::<Word>().is_err());

        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, "\"16\"");
    }
}
