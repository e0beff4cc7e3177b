//! Predicate Command - Evaluate predicate data as settlement would

use std::path::PathBuf;

use clap::Args;
use shade_predicate::{AuthorizationDecision, PredicateAdapter};
use shade_zk::OnChainVerifier;

use super::{Context, ProofFile};

/// Evaluate a proof file's predicate data
#[derive(Args)]
pub struct PredicateCommand {
    /// Proof file written by `shade prove`
    #[arg(short, long, conflicts_with = "data")]
    proof: Option<PathBuf>,

    /// Raw hex predicate data
    #[arg(long)]
    data: Option<String>,
}

impl PredicateCommand {
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        let bytes = match (&self.proof, &self.data) {
            (Some(path), _) => ProofFile::load(path)?.predicate_bytes()?,
            (None, Some(data)) => hex::decode(data.trim_start_matches("0x"))?,
            (None, None) => anyhow::bail!("Pass --proof or --data"),
        };

        let artifacts = ctx.load_artifacts()?;
        let adapter = PredicateAdapter::new(OnChainVerifier::new(artifacts.verifying.clone()));

        println!("Predicate result: {}", adapter.check_predicate(&bytes));
        match adapter.authorize_blob(&bytes) {
            AuthorizationDecision::Authorized(ticket) => {
                println!("✅ Authorized for commitment {}", ticket.commitment());
                Ok(())
            }
            AuthorizationDecision::Rejected(reason) => {
                anyhow::bail!("Rejected: {}", reason)
            }
        }
    }
}
