//! Groth16 key material for the hidden-limit circuit
//!
//! Keys are produced once by [`groth16_setup`] and then shared read-only
//! between every prover and verifier in the process. Serialized keys carry a
//! small header naming the circuit version and range width, so a key built
//! for a different circuit is refused at load time instead of producing
//! proofs that never verify.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ark_bn254::{Bn254, Fr};
use ark_groth16::{
    prepare_verifying_key, Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey,
};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{debug, info};

use crate::errors::ZkError;
use crate::r1cs_circuit::HiddenLimitCircuit;
use crate::types::{CIRCUIT_VERSION, PUBLIC_SIGNAL_COUNT, RANGE_BITS};

const PROVING_KEY_MAGIC: &[u8; 4] = b"SHPK";
const VERIFYING_KEY_MAGIC: &[u8; 4] = b"SHVK";

/// File name of the proving key inside an artifact directory
pub const PROVING_KEY_FILE: &str = "proving.key";
/// File name of the verifying key inside an artifact directory
pub const VERIFYING_KEY_FILE: &str = "verifying.key";

/// Groth16 proving key for the hidden-limit circuit
pub struct ProvingContext {
    pk: ProvingKey<Bn254>,
}

/// Groth16 verifying key for the hidden-limit circuit
#[derive(Clone)]
pub struct VerifyingContext {
    /// The prepared verifying key for efficient verification
    pvk: PreparedVerifyingKey<Bn254>,
}

/// Run circuit-specific setup.
///
/// A fixed-seed rng yields reproducible keys for tests and local demos; a
/// deployment uses keys from a ceremony instead.
pub fn groth16_setup<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<(ProvingContext, VerifyingContext), ZkError> {
    let (pk, vk) = Groth16::<Bn254>::setup(HiddenLimitCircuit::new(), rng)
        .map_err(|e| ZkError::SetupError(format!("Setup failed: {}", e)))?;

    if vk.gamma_abc_g1.len() != PUBLIC_SIGNAL_COUNT + 1 {
        return Err(ZkError::SetupError(format!(
            "verifying key expects {} public inputs",
            vk.gamma_abc_g1.len().saturating_sub(1)
        )));
    }

    let pvk = prepare_verifying_key(&vk);
    Ok((ProvingContext { pk }, VerifyingContext { pvk }))
}

/// Setup with a deterministic seed
pub fn groth16_setup_seeded(seed: u64) -> Result<(ProvingContext, VerifyingContext), ZkError> {
    groth16_setup(&mut ChaCha20Rng::seed_from_u64(seed))
}

impl ProvingContext {
    pub fn proving_key(&self) -> &ProvingKey<Bn254> {
        &self.pk
    }

    /// Verifying key embedded in the proving key
    pub fn verifying_context(&self) -> VerifyingContext {
        VerifyingContext {
            pvk: prepare_verifying_key(&self.pk.vk),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ZkError> {
        let mut bytes = artifact_header(PROVING_KEY_MAGIC);
        self.pk.serialize_compressed(&mut bytes)?;
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ZkError> {
        let body = strip_artifact_header(PROVING_KEY_MAGIC, bytes)?;
        let pk = ProvingKey::<Bn254>::deserialize_compressed(body)?;
        Ok(Self { pk })
    }
}

impl VerifyingContext {
    pub fn verifying_key(&self) -> &VerifyingKey<Bn254> {
        &self.pvk.vk
    }

    pub fn prepared(&self) -> &PreparedVerifyingKey<Bn254> {
        &self.pvk
    }

    /// BLAKE3 digest of the compressed key, hex encoded
    pub fn fingerprint(&self) -> Result<String, ZkError> {
        let mut bytes = Vec::new();
        self.pvk.vk.serialize_compressed(&mut bytes)?;
        Ok(hex::encode(shade_hash::hash(&bytes)))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ZkError> {
        let mut bytes = artifact_header(VERIFYING_KEY_MAGIC);
        self.pvk.vk.serialize_compressed(&mut bytes)?;
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ZkError> {
        let body = strip_artifact_header(VERIFYING_KEY_MAGIC, bytes)?;
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(body)?;
        if vk.gamma_abc_g1.len() != PUBLIC_SIGNAL_COUNT + 1 {
            return Err(ZkError::ArtifactMismatch {
                expected: format!("{} public inputs", PUBLIC_SIGNAL_COUNT),
                found: format!("{} public inputs", vk.gamma_abc_g1.len().saturating_sub(1)),
            });
        }
        Ok(Self {
            pvk: prepare_verifying_key(&vk),
        })
    }
}

fn artifact_header(magic: &[u8; 4]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(64);
    bytes.extend_from_slice(magic);
    bytes.extend_from_slice(&(RANGE_BITS as u32).to_be_bytes());
    bytes.extend_from_slice(&(CIRCUIT_VERSION.len() as u16).to_be_bytes());
    bytes.extend_from_slice(CIRCUIT_VERSION.as_bytes());
    bytes
}

fn strip_artifact_header<'a>(magic: &[u8; 4], bytes: &'a [u8]) -> Result<&'a [u8], ZkError> {
    let truncated = || ZkError::SerializationError("truncated key artifact".into());

    if bytes.len() < 10 {
        return Err(truncated());
    }
    if &bytes[..4] != magic {
        return Err(ZkError::ArtifactMismatch {
            expected: String::from_utf8_lossy(magic).into_owned(),
            found: String::from_utf8_lossy(&bytes[..4]).into_owned(),
        });
    }

    let range_bits = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let version_len = u16::from_be_bytes([bytes[8], bytes[9]]) as usize;
    let version = bytes.get(10..10 + version_len).ok_or_else(truncated)?;

    if version != CIRCUIT_VERSION.as_bytes() || range_bits != RANGE_BITS {
        return Err(ZkError::ArtifactMismatch {
            expected: format!("{} ({} bits)", CIRCUIT_VERSION, RANGE_BITS),
            found: format!("{} ({} bits)", String::from_utf8_lossy(version), range_bits),
        });
    }

    Ok(&bytes[10 + version_len..])
}

/// Proving and verifying keys loaded once and shared
#[derive(Clone)]
pub struct CircuitArtifacts {
    pub proving: Arc<ProvingContext>,
    pub verifying: Arc<VerifyingContext>,
}

impl CircuitArtifacts {
    pub fn new(proving: ProvingContext, verifying: VerifyingContext) -> Self {
        Self {
            proving: Arc::new(proving),
            verifying: Arc::new(verifying),
        }
    }

    /// Run setup; a seed gives reproducible keys
    pub fn generate(seed: Option<u64>) -> Result<Self, ZkError> {
        let (pk, vk) = match seed {
            Some(seed) => groth16_setup_seeded(seed)?,
            None => groth16_setup(&mut OsRng)?,
        };
        info!(deterministic = seed.is_some(), "circuit keys generated");
        Ok(Self::new(pk, vk))
    }

    /// Write both keys into `dir`
    pub fn save(&self, dir: &Path) -> Result<(), ZkError> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(PROVING_KEY_FILE), self.proving.to_bytes()?)?;
        fs::write(dir.join(VERIFYING_KEY_FILE), self.verifying.to_bytes()?)?;
        debug!(dir = %dir.display(), "circuit keys saved");
        Ok(())
    }

    /// Load both keys from `dir`
    pub fn load(dir: &Path) -> Result<Self, ZkError> {
        let proving = ProvingContext::from_bytes(&fs::read(dir.join(PROVING_KEY_FILE))?)?;
        let verifying = load_verifying_key(&dir.join(VERIFYING_KEY_FILE))?;
        Ok(Self::new(proving, verifying))
    }
}

/// Load a standalone verifying key file
pub fn load_verifying_key(path: &Path) -> Result<VerifyingContext, ZkError> {
    VerifyingContext::from_bytes(&fs::read(path)?)
}

/// Default artifact location relative to a data directory
pub fn artifact_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("keys")
}

/// Groth16 proving backend over a shared key
pub struct Groth16Backend {
    ctx: Arc<ProvingContext>,
}

impl Groth16Backend {
    pub fn new(ctx: Arc<ProvingContext>) -> Self {
        Self { ctx }
    }
}

/// Something that turns an assigned circuit into a proof
pub trait ProvingBackend: Send + Sync {
    fn prove(&self, circuit: HiddenLimitCircuit) -> Result<Proof<Bn254>, ZkError>;
}

impl ProvingBackend for Groth16Backend {
    fn prove(&self, circuit: HiddenLimitCircuit) -> Result<Proof<Bn254>, ZkError> {
        // fresh blinding per proof
        let mut rng = OsRng;
        Groth16::<Bn254>::prove(&self.ctx.pk, circuit, &mut rng)
            .map_err(|e| ZkError::ProofGenerationFailed(format!("Proving failed: {}", e)))
    }
}

/// Verify against prepared key and field inputs
pub(crate) fn groth16_verify(
    vk: &VerifyingContext,
    proof: &Proof<Bn254>,
    public_inputs: &[Fr],
) -> bool {
    Groth16::<Bn254>::verify_with_processed_vk(&vk.pvk, public_inputs, proof).unwrap_or(false)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use once_cell::sync::Lazy;

    /// Keys are expensive; one setup per test binary
    pub static ARTIFACTS: Lazy<CircuitArtifacts> =
        Lazy::new(|| CircuitArtifacts::generate(Some(12345)).expect("Setup should succeed"));
}
