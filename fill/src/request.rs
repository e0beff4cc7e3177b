//! Fill requests and the maker authorization wire types

use rand::RngCore;
use serde::{Deserialize, Serialize};
use shade_commitment::Commitment;
use shade_zk::OfferValues;

use crate::order::HiddenLimitOrder;

/// One fill attempt by a taker.
///
/// Ephemeral: a retry after a terminal failure needs a new request, and
/// every request gets a fresh random id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillRequest {
    pub request_id: String,
    pub order_id: String,
    pub commitment: Commitment,
    pub offer: OfferValues,
    pub taker: String,
}

impl FillRequest {
    pub fn new(
        order_id: impl Into<String>,
        commitment: Commitment,
        offer: OfferValues,
        taker: impl Into<String>,
    ) -> Self {
        let mut id = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut id);
        Self {
            request_id: hex::encode(id),
            order_id: order_id.into(),
            commitment,
            offer,
            taker: taker.into(),
        }
    }

    /// Fill against `order` at `offer`
    pub fn for_order(order: &HiddenLimitOrder, offer: OfferValues, taker: impl Into<String>) -> Self {
        Self::new(order.order_id.clone(), order.commitment, offer, taker)
    }

    /// Taker asset amount to approve: price times amount
    pub fn taker_payment(&self) -> Option<u128> {
        self.offer.offered_price.checked_mul(self.offer.offered_amount)
    }

    pub fn authorization_request(&self) -> AuthorizationRequest {
        AuthorizationRequest {
            order_id: self.order_id.clone(),
            fill_amount: self.offer.offered_amount,
            taker_address: self.taker.clone(),
            offered_price: self.offer.offered_price,
        }
    }
}

/// Request sent to the maker's authorization service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub order_id: String,
    pub fill_amount: u128,
    pub taker_address: String,
    pub offered_price: u128,
}

/// Maker's answer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub success: bool,
    pub order_with_authorization_data: Option<HiddenLimitOrder>,
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether repeating the same request may succeed
    #[serde(default)]
    pub retryable: bool,
}

impl AuthorizationResponse {
    pub fn approved(order: HiddenLimitOrder) -> Self {
        Self {
            signature: order.signature.clone(),
            success: true,
            order_with_authorization_data: Some(order),
            message: None,
            retryable: false,
        }
    }

    pub fn refused(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            success: false,
            order_with_authorization_data: None,
            signature: None,
            message: Some(message.into()),
            retryable,
        }
    }
}
