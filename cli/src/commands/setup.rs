//! Setup Command - Generate circuit keys

use clap::Args;
use shade_zk::{circuit_stats, CircuitArtifacts};
use tracing::info;

use super::Context;

/// Generate circuit keys
#[derive(Args)]
pub struct SetupCommand {
    /// Seed for reproducible development keys; never use in production
    #[arg(long)]
    seed: Option<u64>,

    /// Force overwrite existing keys
    #[arg(short, long)]
    force: bool,
}

impl SetupCommand {
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        let dir = ctx.artifact_dir();
        if CircuitArtifacts::load(&dir).is_ok() && !self.force {
            anyhow::bail!(
                "Circuit keys already exist at {}. Use --force to overwrite.",
                dir.display()
            );
        }

        let seed = self.seed.or(ctx.config.artifacts.seed);
        let stats = circuit_stats()?;
        info!(
            constraints = stats.num_constraints,
            public_inputs = stats.num_public_inputs,
            deterministic = seed.is_some(),
            "running circuit setup"
        );

        let artifacts =
            tokio::task::spawn_blocking(move || CircuitArtifacts::generate(seed)).await??;
        artifacts.save(&dir)?;

        println!();
        println!("Circuit keys written to {}", dir.display());
        println!("Circuit:      {}", shade_zk::CIRCUIT_VERSION);
        println!("Constraints:  {}", stats.num_constraints);
        println!("Verifying key fingerprint: {}", artifacts.verifying.fingerprint()?);
        if seed.is_some() {
            println!();
            println!("Keys were derived from a seed and are for development only.");
        }

        Ok(())
    }
}
