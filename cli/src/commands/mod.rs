//! CLI Commands

mod commit;
mod fill;
mod predicate;
mod prove;
mod setup;
mod verify;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use shade_commitment::Commitment;
use shade_predicate::PredicateBlob;
use shade_zk::{
    CalldataProof, CircuitArtifacts, GeneratedProof, OfferValues, SnarkJsProof, Word,
    PUBLIC_SIGNAL_COUNT,
};
use tokio_util::sync::CancellationToken;

use crate::config::ShadeConfig;

pub use commit::CommitCommand;
pub use fill::FillCommand;
pub use predicate::PredicateCommand;
pub use prove::ProveCommand;
pub use setup::SetupCommand;
pub use verify::VerifyCommand;

/// Resolved settings shared by every command
pub struct Context {
    pub data_dir: PathBuf,
    pub config: ShadeConfig,
}

impl Context {
    pub fn artifact_dir(&self) -> PathBuf {
        self.config.artifact_dir(&self.data_dir)
    }

    /// Load keys written by `shade setup`
    pub fn load_artifacts(&self) -> anyhow::Result<CircuitArtifacts> {
        let dir = self.artifact_dir();
        CircuitArtifacts::load(&dir).with_context(|| {
            format!(
                "Could not load circuit keys from {}. Run `shade setup` first.",
                dir.display()
            )
        })
    }
}

/// Proof file written by `shade prove`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofFile {
    pub commitment: Commitment,
    pub offer: OfferValues,
    pub calldata: CalldataProof,
    pub signals: [Word; PUBLIC_SIGNAL_COUNT],
    pub snarkjs: SnarkJsProof,
    /// Hex-encoded predicate data for settlement
    pub predicate: String,
}

impl ProofFile {
    pub fn new(commitment: Commitment, offer: OfferValues, generated: &GeneratedProof) -> Self {
        let blob = PredicateBlob::from_generated(commitment, offer, generated);
        Self {
            commitment,
            offer,
            calldata: generated.calldata(),
            signals: generated.signal_words(),
            snarkjs: generated.to_snarkjs(),
            predicate: format!("0x{}", hex::encode(blob.encode())),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read proof file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Malformed proof file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn predicate_bytes(&self) -> anyhow::Result<Vec<u8>> {
        hex::decode(self.predicate.trim_start_matches("0x")).context("Predicate data is not hex")
    }
}

/// Token cancelled on Ctrl-C
pub fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            child.cancel();
        }
    });
    token
}
