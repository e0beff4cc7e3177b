//! Prove Command - Generate a proof for an offer

use std::path::PathBuf;

use clap::Args;
use shade_commitment::{Commitment, SecretParameters};
use shade_zk::{OfferValues, ProofGenerator};
use tracing::info;

use super::{ctrl_c_token, Context, ProofFile};

/// Generate a proof that an offer meets hidden limits
#[derive(Args)]
pub struct ProveCommand {
    /// Hidden minimum price
    #[arg(long)]
    price: u128,

    /// Hidden minimum amount
    #[arg(long)]
    amount: u128,

    /// Commitment nonce
    #[arg(long)]
    nonce: u128,

    /// Published commitment; recomputed from the limits when omitted
    #[arg(long)]
    commitment: Option<Commitment>,

    /// Taker's offered price
    #[arg(long)]
    offered_price: u128,

    /// Taker's offered amount
    #[arg(long)]
    offered_amount: u128,

    /// Output file
    #[arg(short, long, default_value = "proof.json")]
    output: PathBuf,
}

impl ProveCommand {
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        let secrets = SecretParameters::new(self.price, self.amount, self.nonce);
        let commitment = self.commitment.unwrap_or_else(|| secrets.commitment());
        let offer = OfferValues::new(self.offered_price, self.offered_amount);

        let artifacts = ctx.load_artifacts()?;
        let generator = ProofGenerator::new(artifacts.proving.clone());

        info!(commitment = %commitment, "generating proof");
        let limit = ctx.config.prover.timeout();
        let generated = tokio::time::timeout(
            limit,
            generator.prove_async(secrets, commitment, offer, ctrl_c_token()),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Proof generation timed out after {:?}", limit))??;

        let file = ProofFile::new(commitment, offer, &generated);
        file.save(&self.output)?;

        println!("Proof written to {}", self.output.display());
        println!("Public signals:");
        for word in &file.signals {
            println!("  {}", word);
        }
        Ok(())
    }
}
