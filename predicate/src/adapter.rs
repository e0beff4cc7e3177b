//! Fill authorization from proof verification

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use shade_commitment::Commitment;
use shade_zk::{CalldataProof, OfferValues, OnChainVerifier, Word, PUBLIC_SIGNAL_COUNT, VALIDITY_FLAG};
use tracing::{debug, info};

use crate::blob::PredicateBlob;

/// Which bound value disagreed with the proof's signals
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingField {
    Commitment,
    OfferedPrice,
    OfferedAmount,
}

impl fmt::Display for BindingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingField::Commitment => write!(f, "commitment"),
            BindingField::OfferedPrice => write!(f, "offered price"),
            BindingField::OfferedAmount => write!(f, "offered amount"),
        }
    }
}

/// Why a fill was not authorized
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// Proof signals are for a different order or offer
    BindingMismatch(BindingField),
    /// Proof did not verify
    VerificationFailed,
    /// Input could not be interpreted
    MalformedInput(String),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::BindingMismatch(field) => {
                write!(f, "proof is bound to a different {}", field)
            }
            RejectionReason::VerificationFailed => write!(f, "proof verification failed"),
            RejectionReason::MalformedInput(detail) => write!(f, "malformed input: {}", detail),
        }
    }
}

/// Proof that a fill passed the adapter.
///
/// Only [`PredicateAdapter`] can create one, so holding a ticket means the
/// binding and verification checks ran.
#[derive(Clone, Debug)]
pub struct AuthorizationTicket {
    blob: PredicateBlob,
    issued_at: Instant,
}

impl AuthorizationTicket {
    pub fn commitment(&self) -> &Commitment {
        &self.blob.commitment
    }

    pub fn offer(&self) -> &OfferValues {
        &self.blob.offer
    }

    pub fn blob(&self) -> &PredicateBlob {
        &self.blob
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    /// Predicate data for settlement calldata
    pub fn encode(&self) -> Vec<u8> {
        self.blob.encode()
    }
}

/// Outcome of [`PredicateAdapter::authorize`]
#[derive(Clone, Debug)]
pub enum AuthorizationDecision {
    Authorized(AuthorizationTicket),
    Rejected(RejectionReason),
}

impl AuthorizationDecision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthorizationDecision::Authorized(_))
    }

    pub fn ticket(self) -> Option<AuthorizationTicket> {
        match self {
            AuthorizationDecision::Authorized(ticket) => Some(ticket),
            AuthorizationDecision::Rejected(_) => None,
        }
    }
}

/// Settlement-side check that a proof authorizes exactly this fill
#[derive(Clone)]
pub struct PredicateAdapter {
    verifier: OnChainVerifier,
}

impl PredicateAdapter {
    pub fn new(verifier: OnChainVerifier) -> Self {
        Self { verifier }
    }

    pub fn verifier(&self) -> &OnChainVerifier {
        &self.verifier
    }

    /// Authorize a fill of `offer` against the order committed to by
    /// `commitment`.
    ///
    /// Binding is checked before the pairing so a replayed proof for another
    /// order or offer is rejected cheaply.
    pub fn authorize(
        &self,
        commitment: &Commitment,
        offer: &OfferValues,
        signals: &[Word],
        proof: &CalldataProof,
    ) -> AuthorizationDecision {
        let decision = self.decide(commitment, offer, signals, proof);
        match &decision {
            AuthorizationDecision::Authorized(_) => {
                info!(commitment = %commitment, "fill authorized");
            }
            AuthorizationDecision::Rejected(reason) => {
                debug!(commitment = %commitment, reason = %reason, "fill rejected");
            }
        }
        decision
    }

    fn decide(
        &self,
        commitment: &Commitment,
        offer: &OfferValues,
        signals: &[Word],
        proof: &CalldataProof,
    ) -> AuthorizationDecision {
        use AuthorizationDecision::Rejected;

        if signals.len() != PUBLIC_SIGNAL_COUNT {
            return Rejected(RejectionReason::MalformedInput(format!(
                "expected {} public signals, got {}",
                PUBLIC_SIGNAL_COUNT,
                signals.len()
            )));
        }
        if signals[0] != Word::from_u128(VALIDITY_FLAG as u128) {
            return Rejected(RejectionReason::MalformedInput("validity flag is not set".into()));
        }

        if signals[1] != Word::from_be_bytes(commitment.to_be_bytes()) {
            return Rejected(RejectionReason::BindingMismatch(BindingField::Commitment));
        }
        if signals[3] != Word::from_u128(offer.offered_price) {
            return Rejected(RejectionReason::BindingMismatch(BindingField::OfferedPrice));
        }
        if signals[4] != Word::from_u128(offer.offered_amount) {
            return Rejected(RejectionReason::BindingMismatch(BindingField::OfferedAmount));
        }

        if !self.verifier.verify(proof, signals) {
            return Rejected(RejectionReason::VerificationFailed);
        }

        let mut bound = [Word::ZERO; PUBLIC_SIGNAL_COUNT];
        bound.copy_from_slice(signals);
        AuthorizationDecision::Authorized(AuthorizationTicket {
            blob: PredicateBlob {
                commitment: *commitment,
                offer: *offer,
                proof: proof.clone(),
                signals: bound,
            },
            issued_at: Instant::now(),
        })
    }

    /// Authorize from encoded predicate data
    pub fn authorize_blob(&self, bytes: &[u8]) -> AuthorizationDecision {
        match PredicateBlob::decode(bytes) {
            Ok(blob) => self.authorize(&blob.commitment, &blob.offer, &blob.signals, &blob.proof),
            Err(e) => {
                debug!(error = %e, "predicate data rejected");
                AuthorizationDecision::Rejected(RejectionReason::MalformedInput(e.to_string()))
            }
        }
    }

    /// Settlement predicate entry point: one for authorized, zero otherwise
    pub fn check_predicate(&self, bytes: &[u8]) -> Word {
        if self.authorize_blob(bytes).is_authorized() {
            Word::ONE
        } else {
            Word::ZERO
        }
    }
}
