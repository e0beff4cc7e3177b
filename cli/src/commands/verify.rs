//! Verify Command - Verify a proof file

use std::path::PathBuf;

use clap::Args;
use shade_zk::{load_verifying_key, verify, VERIFYING_KEY_FILE};

use super::{Context, ProofFile};

/// Verify a proof file
#[derive(Args)]
pub struct VerifyCommand {
    /// Proof file written by `shade prove`
    #[arg(short, long)]
    proof: PathBuf,

    /// Verifying key; defaults to the configured key directory
    #[arg(long)]
    key: Option<PathBuf>,
}

impl VerifyCommand {
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        let key_path = self
            .key
            .unwrap_or_else(|| ctx.artifact_dir().join(VERIFYING_KEY_FILE));
        let vk = load_verifying_key(&key_path)?;
        let file = ProofFile::load(&self.proof)?;

        if verify(&file.calldata, &file.signals, &vk) {
            println!("✅ Proof is valid (key {})", vk.fingerprint()?);
            Ok(())
        } else {
            anyhow::bail!("Proof is invalid for key {}", vk.fingerprint()?)
        }
    }
}
