//! Maker-side authorization service
//!
//! Holds the maker's orders and hidden limits, and answers taker
//! authorization requests with an order carrying predicate data.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shade_commitment::{Commitment, SecretParameters};
use shade_predicate::{AuthorizationDecision, PredicateAdapter, PredicateBlob};
use shade_zk::{OfferValues, ProofGenerator};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::errors::{FillError, FillResult};
use crate::lifecycle::{now, AuthorizationProvider};
use crate::order::HiddenLimitOrder;
use crate::request::{AuthorizationRequest, AuthorizationResponse};

/// Order lookup
pub trait OrderStore: Send + Sync {
    fn get(&self, order_id: &str) -> Option<HiddenLimitOrder>;
    fn insert(&self, order: HiddenLimitOrder);
}

/// Secret lookup by published commitment
pub trait SecretStore: Send + Sync {
    fn get(&self, commitment: &Commitment) -> Option<SecretParameters>;
    /// Store secrets, returning the commitment they are filed under
    fn insert(&self, secrets: SecretParameters) -> Commitment;
}

/// Simple in-memory order store
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<String, HiddenLimitOrder>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn get(&self, order_id: &str) -> Option<HiddenLimitOrder> {
        self.orders.read().get(order_id).cloned()
    }

    fn insert(&self, order: HiddenLimitOrder) {
        self.orders.write().insert(order.order_id.clone(), order);
    }
}

/// Simple in-memory secret store
#[derive(Default)]
pub struct InMemorySecretStore {
    secrets: RwLock<HashMap<Commitment, SecretParameters>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for InMemorySecretStore {
    fn get(&self, commitment: &Commitment) -> Option<SecretParameters> {
        self.secrets.read().get(commitment).cloned()
    }

    fn insert(&self, secrets: SecretParameters) -> Commitment {
        let commitment = secrets.commitment();
        self.secrets.write().insert(commitment, secrets);
        commitment
    }
}

/// Answers fill authorization requests for one maker
pub struct MakerService {
    orders: Arc<dyn OrderStore>,
    secrets: Arc<dyn SecretStore>,
    generator: ProofGenerator,
    adapter: Arc<PredicateAdapter>,
    shutdown: CancellationToken,
}

impl MakerService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        secrets: Arc<dyn SecretStore>,
        generator: ProofGenerator,
        adapter: Arc<PredicateAdapter>,
    ) -> Self {
        Self {
            orders,
            secrets,
            generator,
            adapter,
            shutdown: CancellationToken::new(),
        }
    }

    /// Abandon in-flight proofs
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Publish an order together with its hidden limits
    pub fn publish(&self, order: HiddenLimitOrder, secrets: SecretParameters) -> FillResult<()> {
        if secrets.commitment() != order.commitment {
            return Err(FillError::Proof(shade_zk::ZkError::CommitmentMismatch));
        }
        self.secrets.insert(secrets);
        info!(order_id = %order.order_id, commitment = %order.commitment, "order published");
        self.orders.insert(order);
        Ok(())
    }

    /// Answer a request; failures become a refusal without secret values
    pub async fn handle(&self, request: &AuthorizationRequest) -> AuthorizationResponse {
        match self.authorize(request).await {
            Ok(order) => {
                info!(order_id = %request.order_id, "fill authorization issued");
                AuthorizationResponse::approved(order)
            }
            Err(e) => {
                warn!(order_id = %request.order_id, error = %e, "fill authorization refused");
                AuthorizationResponse::refused(e.to_string(), e.is_retryable())
            }
        }
    }

    async fn authorize(&self, request: &AuthorizationRequest) -> FillResult<HiddenLimitOrder> {
        let order = self
            .orders
            .get(&request.order_id)
            .ok_or_else(|| FillError::OrderNotFound(request.order_id.clone()))?;
        if order.is_expired(now()) {
            return Err(FillError::OrderExpired);
        }
        if request.fill_amount == 0 || request.fill_amount > order.making_amount {
            return Err(FillError::InvalidRequest(format!(
                "fill amount must be between 1 and {}",
                order.making_amount
            )));
        }

        let secrets = self
            .secrets
            .get(&order.commitment)
            .ok_or(FillError::SecretsUnavailable)?;
        let offer = OfferValues::new(request.offered_price, request.fill_amount);

        let generated = self
            .generator
            .prove_async(secrets, order.commitment, offer, self.shutdown.child_token())
            .await?;

        // refuse to hand out data settlement would reject
        let blob = PredicateBlob::from_generated(order.commitment, offer, &generated);
        if let AuthorizationDecision::Rejected(reason) =
            self.adapter
                .authorize(&order.commitment, &offer, &blob.signals, &blob.proof)
        {
            return Err(FillError::Rejected(reason));
        }

        Ok(order.with_authorization_data(blob.encode()))
    }
}

#[async_trait::async_trait]
impl AuthorizationProvider for MakerService {
    async fn request_authorization(
        &self,
        request: &AuthorizationRequest,
    ) -> FillResult<AuthorizationResponse> {
        Ok(self.handle(request).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{harness, order, secrets, TAKER};

    fn request(fill_amount: u128, offered_price: u128) -> AuthorizationRequest {
        AuthorizationRequest {
            order_id: "order-1".into(),
            fill_amount,
            taker_address: TAKER.into(),
            offered_price,
        }
    }

    #[tokio::test]
    async fn test_authorized_order_carries_predicate_data() {
        let h = harness();
        let response = h.maker.handle(&request(50, 2100)).await;
        assert!(response.success);
        assert_eq!(response.signature.as_deref(), Some("0xsigned"));

        let order = response.order_with_authorization_data.unwrap();
        let blob = PredicateBlob::decode(&order.authorization_data).unwrap();
        assert_eq!(blob.commitment, order.commitment);
        assert_eq!(blob.offer, OfferValues::new(2100, 50));
    }

    #[tokio::test]
    async fn test_fill_amount_bounds() {
        let h = harness();
        for amount in [0, order().making_amount + 1] {
            let response = h.maker.handle(&request(amount, 2100)).await;
            assert!(!response.success);
            assert!(!response.retryable);
            assert!(response.message.unwrap().contains("fill amount"));
        }
    }

    #[tokio::test]
    async fn test_refusal_hides_limits() {
        let h = harness();
        let response = h.maker.handle(&request(50, 1999)).await;
        assert!(!response.success);
        let message = response.message.unwrap();
        assert!(!message.contains("2000"));
        assert!(!message.contains("123456789"));
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let h = harness();
        let mut req = request(50, 2100);
        req.order_id = "nope".into();
        let response = h.maker.request_authorization(&req).await.unwrap();
        assert!(!response.success);
        assert!(response.message.unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_expired_order() {
        let h = harness();
        let mut expired = order();
        expired.order_id = "old".into();
        expired.expiry = 1;
        h.maker.publish(expired, secrets()).unwrap();

        let mut req = request(50, 2100);
        req.order_id = "old".into();
        let response = h.maker.handle(&req).await;
        assert_eq!(response.message.as_deref(), Some("Order expired"));
    }

    #[test]
    fn test_publish_rejects_wrong_secrets() {
        let h = harness();
        let mut other = order();
        other.order_id = "order-2".into();
        let result = h.maker.publish(other, SecretParameters::new(2000, 11, 123456789));
        assert_eq!(result, Err(FillError::Proof(shade_zk::ZkError::CommitmentMismatch)));
    }

    #[test]
    fn test_secret_store_keyed_by_commitment() {
        let store = InMemorySecretStore::new();
        let commitment = store.insert(secrets());
        assert_eq!(commitment, secrets().commitment());
        assert_eq!(store.get(&commitment).unwrap().secret_price(), 2000);
        assert!(store.get(&Commitment::from_field(Default::default())).is_none());
    }
}
