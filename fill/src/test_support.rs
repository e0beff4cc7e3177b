//! Shared fixtures: one key setup per test binary

use std::sync::Arc;

use once_cell::sync::Lazy;
use shade_commitment::SecretParameters;
use shade_predicate::PredicateAdapter;
use shade_zk::{CircuitArtifacts, OnChainVerifier, ProofGenerator};

use crate::chain::InMemoryChain;
use crate::lifecycle::FillServices;
use crate::maker::{InMemoryOrderStore, InMemorySecretStore, MakerService};
use crate::order::HiddenLimitOrder;

pub static ARTIFACTS: Lazy<CircuitArtifacts> =
    Lazy::new(|| CircuitArtifacts::generate(Some(12345)).expect("Setup should succeed"));

pub const TAKER: &str = "0x2222222222222222222222222222222222222222";

pub fn adapter() -> Arc<PredicateAdapter> {
    Arc::new(PredicateAdapter::new(OnChainVerifier::new(
        ARTIFACTS.verifying.clone(),
    )))
}

pub fn secrets() -> SecretParameters {
    SecretParameters::new(2000, 10, 123456789)
}

pub fn order() -> HiddenLimitOrder {
    HiddenLimitOrder {
        order_id: "order-1".into(),
        maker: "0x1111111111111111111111111111111111111111".into(),
        maker_asset: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".into(),
        taker_asset: "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".into(),
        making_amount: 100,
        taking_amount: 200_000,
        expiry: u64::MAX,
        commitment: secrets().commitment(),
        signature: Some("0xsigned".into()),
        authorization_data: Vec::new(),
    }
}

pub struct Harness {
    pub maker: Arc<MakerService>,
    pub chain: Arc<InMemoryChain>,
    pub services: FillServices,
}

/// Maker with one published order and an in-memory chain
pub fn harness() -> Harness {
    let adapter = adapter();
    let maker = Arc::new(MakerService::new(
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(InMemorySecretStore::new()),
        ProofGenerator::new(ARTIFACTS.proving.clone()),
        adapter.clone(),
    ));
    maker
        .publish(order(), secrets())
        .expect("publish should succeed");
    let chain = Arc::new(InMemoryChain::new(adapter.clone()));
    let services = FillServices {
        provider: maker.clone(),
        approver: chain.clone(),
        settlement: chain.clone(),
        adapter,
    };
    Harness {
        maker,
        chain,
        services,
    }
}
