//! Commit Command - Commit to hidden limits

use clap::Args;
use rand::rngs::OsRng;
use shade_commitment::SecretParameters;

use super::Context;

/// Commit to a hidden minimum price and amount
#[derive(Args)]
pub struct CommitCommand {
    /// Minimum acceptable price
    #[arg(long)]
    price: u128,

    /// Minimum acceptable amount
    #[arg(long)]
    amount: u128,

    /// Nonce; a random one is drawn when omitted
    #[arg(long)]
    nonce: Option<u128>,
}

impl CommitCommand {
    pub async fn execute(self, _ctx: &Context) -> anyhow::Result<()> {
        let secrets = match self.nonce {
            Some(nonce) => SecretParameters::new(self.price, self.amount, nonce),
            None => SecretParameters::generate(self.price, self.amount, &mut OsRng),
        };

        println!("Commitment: {}", secrets.commitment());
        println!("Nonce:      {}", secrets.nonce());
        println!();
        println!("Publish the commitment with the order. Keep the limits and nonce private.");
        Ok(())
    }
}
