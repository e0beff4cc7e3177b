//! Fill Command - Run one fill against an in-memory chain

use std::sync::Arc;

use clap::Args;
use rand::rngs::OsRng;
use shade_commitment::SecretParameters;
use shade_fill::{
    now, validate_order_form, FillAuthorization, FillEvent, FillRequest, FillServices,
    InMemoryChain, InMemoryOrderStore, InMemorySecretStore, MakerService, OrderForm,
};
use shade_predicate::PredicateAdapter;
use shade_zk::{OfferValues, OnChainVerifier, ProofGenerator};
use tracing::info;

use super::Context;

const DAY_SECS: u64 = 24 * 60 * 60;

/// Publish an order and walk one taker fill through every step
#[derive(Args)]
pub struct FillCommand {
    /// Maker's hidden minimum price
    #[arg(long)]
    price: u128,

    /// Maker's hidden minimum amount
    #[arg(long)]
    amount: u128,

    /// Visible order size
    #[arg(long, default_value = "1000")]
    making_amount: String,

    /// Visible order price in taker asset
    #[arg(long, default_value = "1000000")]
    taking_amount: String,

    /// Taker's offered price
    #[arg(long)]
    offered_price: u128,

    /// Taker's offered amount
    #[arg(long)]
    offered_amount: u128,

    #[arg(long, default_value = "0x1111111111111111111111111111111111111111")]
    maker: String,

    #[arg(long, default_value = "0x2222222222222222222222222222222222222222")]
    taker: String,

    #[arg(long, default_value = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")]
    maker_asset: String,

    #[arg(long, default_value = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb")]
    taker_asset: String,
}

impl FillCommand {
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        let artifacts = ctx.load_artifacts()?;
        let adapter = Arc::new(PredicateAdapter::new(OnChainVerifier::new(
            artifacts.verifying.clone(),
        )));

        let secrets = SecretParameters::generate(self.price, self.amount, &mut OsRng);
        let form = OrderForm {
            maker: self.maker,
            maker_asset: self.maker_asset,
            taker_asset: self.taker_asset,
            making_amount: self.making_amount,
            taking_amount: self.taking_amount,
            expiry: (now() + DAY_SECS).to_string(),
            commitment: secrets.commitment().to_string(),
        };
        let order = validate_order_form(&form)?.into_order(None);
        info!(order_id = %order.order_id, "order validated");

        let maker = Arc::new(MakerService::new(
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(InMemorySecretStore::new()),
            ProofGenerator::new(artifacts.proving.clone()),
            adapter.clone(),
        ));
        maker.publish(order.clone(), secrets)?;

        let chain = Arc::new(InMemoryChain::new(adapter.clone()));
        let services = FillServices {
            provider: maker.clone(),
            approver: chain.clone(),
            settlement: chain,
            adapter,
        };

        let request = FillRequest::for_order(
            &order,
            OfferValues::new(self.offered_price, self.offered_amount),
            self.taker,
        );
        let mut fill =
            FillAuthorization::new(request, services, ctx.config.fill.to_fill_config());
        let mut events = fill.subscribe();
        let printer = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    FillEvent::PhaseChanged { phase, .. } => println!("phase  {}", phase),
                    FillEvent::StepUpdated { step, .. } => println!(
                        "step   {:<10} {:?}{}",
                        step.id,
                        step.state,
                        step.transaction_hash
                            .map(|h| format!(" {}", h))
                            .unwrap_or_default()
                    ),
                }
            }
        });

        let cancel = fill.cancellation_token();
        let interrupt = super::ctrl_c_token();
        let forward = tokio::spawn(async move {
            interrupt.cancelled().await;
            cancel.cancel();
        });

        let result = fill.run().await;
        forward.abort();
        drop(fill);
        let _ = printer.await;
        maker.shutdown();

        let outcome = result?;
        println!();
        println!("✅ Fill settled in block {}", outcome.block_number);
        println!("Transaction: {}", outcome.transaction_hash);
        Ok(())
    }
}
