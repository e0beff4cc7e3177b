//! Fill Authorization Lifecycle
//!
//! Drives one fill attempt through its fixed steps:
//! 1. Authorize - obtain a hidden-limit proof from the maker and check it locally
//! 2. Approve - allow settlement to spend the taker asset
//! 3. Execute - submit the fill with its predicate data
//! 4. Confirm - wait for the fill transaction to land
//!
//! Every phase and step change is published as a [`FillEvent`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shade_predicate::{AuthorizationDecision, AuthorizationTicket, PredicateAdapter, PredicateBlob};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{FillError, FillResult};
use crate::order::HiddenLimitOrder;
use crate::request::{AuthorizationRequest, AuthorizationResponse, FillRequest};
use crate::steps::{StepId, StepTracker, TransactionStep};

/// Transaction hash as reported by the chain client
pub type TxHash = String;

/// Phase of a fill attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum FillPhase {
    Idle,
    Authorizing,
    Authorized,
    /// Waiting on an on-chain step; `Execute` also covers its confirmation
    Confirming { step: StepId },
    Confirmed,
    Success,
    Failed { step: StepId, error: String },
    /// Stopped locally; `broadcast` records whether the fill was already sent
    Cancelled { broadcast: bool },
}

impl FillPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FillPhase::Success | FillPhase::Failed { .. } | FillPhase::Cancelled { .. }
        )
    }
}

impl fmt::Display for FillPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillPhase::Idle => write!(f, "idle"),
            FillPhase::Authorizing => write!(f, "authorizing"),
            FillPhase::Authorized => write!(f, "authorized"),
            FillPhase::Confirming { step } => write!(f, "confirming({})", step),
            FillPhase::Confirmed => write!(f, "confirmed"),
            FillPhase::Success => write!(f, "success"),
            FillPhase::Failed { step, .. } => write!(f, "failed({})", step),
            FillPhase::Cancelled { broadcast } => write!(f, "cancelled(broadcast={})", broadcast),
        }
    }
}

/// Lifecycle events
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FillEvent {
    PhaseChanged { request_id: String, phase: FillPhase },
    StepUpdated { request_id: String, step: TransactionStep },
}

/// Outcome of a successful fill
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillOutcome {
    pub request_id: String,
    pub transaction_hash: TxHash,
    pub block_number: u64,
}

/// Configuration for fill attempts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillConfig {
    /// Bound on the maker authorization round trip
    pub authorization_timeout: Duration,
    /// Bound on the token approval transaction
    pub approval_timeout: Duration,
    /// Bound on fill submission
    pub execution_timeout: Duration,
    /// Bound on waiting for the fill to confirm
    pub confirmation_timeout: Duration,
    /// How long an authorization may be used for execution
    pub authorization_ttl: Duration,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            authorization_timeout: Duration::from_secs(60),
            approval_timeout: Duration::from_secs(120),
            execution_timeout: Duration::from_secs(60),
            confirmation_timeout: Duration::from_secs(300), // 5 minutes
            authorization_ttl: Duration::from_secs(600),
        }
    }
}

/// Maker-side authorization service
#[async_trait::async_trait]
pub trait AuthorizationProvider: Send + Sync {
    async fn request_authorization(
        &self,
        request: &AuthorizationRequest,
    ) -> FillResult<AuthorizationResponse>;
}

/// Taker token approval
#[async_trait::async_trait]
pub trait TokenApprover: Send + Sync {
    /// Approve `amount` of `token` for settlement
    async fn approve(&self, owner: &str, token: &str, amount: u128) -> FillResult<TxHash>;
}

/// Fill receipt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    /// `false` when the transaction was mined but reverted
    pub success: bool,
}

/// Settlement contract client.
///
/// Execution takes an [`AuthorizationTicket`], which only the predicate
/// adapter issues.
#[async_trait::async_trait]
pub trait SettlementClient: Send + Sync {
    async fn execute(
        &self,
        order: &HiddenLimitOrder,
        ticket: &AuthorizationTicket,
        taker: &str,
    ) -> FillResult<TxHash>;

    async fn wait_for_confirmation(&self, transaction_hash: &str) -> FillResult<Receipt>;
}

/// Collaborators shared by every attempt
#[derive(Clone)]
pub struct FillServices {
    pub provider: Arc<dyn AuthorizationProvider>,
    pub approver: Arc<dyn TokenApprover>,
    pub settlement: Arc<dyn SettlementClient>,
    pub adapter: Arc<PredicateAdapter>,
}

/// State machine for one [`FillRequest`]
pub struct FillAuthorization {
    request: FillRequest,
    config: FillConfig,
    services: FillServices,
    tracker: StepTracker,
    phase: FillPhase,
    order: Option<HiddenLimitOrder>,
    ticket: Option<AuthorizationTicket>,
    fill_tx: Option<TxHash>,
    receipt: Option<Receipt>,
    broadcast: bool,
    last_error: Option<FillError>,
    cancel: CancellationToken,
    event_tx: Option<mpsc::UnboundedSender<FillEvent>>,
}

impl FillAuthorization {
    pub fn new(request: FillRequest, services: FillServices, config: FillConfig) -> Self {
        Self {
            request,
            config,
            services,
            tracker: StepTracker::new(),
            phase: FillPhase::Idle,
            order: None,
            ticket: None,
            fill_tx: None,
            receipt: None,
            broadcast: false,
            last_error: None,
            cancel: CancellationToken::new(),
            event_tx: None,
        }
    }

    /// Receive phase and step changes
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<FillEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.event_tx = Some(tx);
        rx
    }

    pub fn request(&self) -> &FillRequest {
        &self.request
    }

    pub fn phase(&self) -> &FillPhase {
        &self.phase
    }

    pub fn steps(&self) -> &[TransactionStep] {
        self.tracker.steps()
    }

    pub fn current_step(&self) -> Option<StepId> {
        self.tracker.current_step()
    }

    pub fn ticket(&self) -> Option<&AuthorizationTicket> {
        self.ticket.as_ref()
    }

    pub fn last_error(&self) -> Option<&FillError> {
        self.last_error.as_ref()
    }

    /// Token that cancels the attempt from another task
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel locally; a no-op once the attempt is terminal
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        if !self.phase.is_terminal() {
            self.set_phase(FillPhase::Cancelled {
                broadcast: self.broadcast,
            });
        }
    }

    /// Run the attempt from the first step
    pub async fn run(&mut self) -> FillResult<FillOutcome> {
        if self.phase != FillPhase::Idle {
            return Err(FillError::InvalidState(format!(
                "cannot start from {}",
                self.phase
            )));
        }
        info!(
            request_id = %self.request.request_id,
            order_id = %self.request.order_id,
            "starting fill"
        );
        self.drive().await
    }

    /// Re-enter the failed step.
    ///
    /// Refused for terminal causes and for an expired authorization; both
    /// need a new [`FillRequest`].
    pub async fn retry(&mut self) -> FillResult<FillOutcome> {
        let (step, cause) = match (&self.phase, &self.last_error) {
            (FillPhase::Failed { step, .. }, Some(cause)) => (*step, cause.clone()),
            _ => {
                return Err(FillError::InvalidState(format!(
                    "nothing to retry in {}",
                    self.phase
                )))
            }
        };

        if !cause.is_retryable() {
            return Err(FillError::RetryRefused {
                step,
                reason: cause.to_string(),
            });
        }
        if step != StepId::Authorize && self.authorization_expired() {
            return Err(FillError::AuthorizationExpired);
        }

        info!(request_id = %self.request.request_id, step = %step, "retrying fill step");
        let updated = self.tracker.reset(step)?.clone();
        self.emit_step(updated);
        self.last_error = None;
        self.drive().await
    }

    async fn drive(&mut self) -> FillResult<FillOutcome> {
        while let Some(step) = self.tracker.current_step() {
            let result = match step {
                StepId::Authorize => self.authorize().await,
                StepId::Approve => self.approve().await,
                StepId::Execute => self.execute().await,
                StepId::Confirm => self.confirm().await,
            };
            if let Err(e) = result {
                return Err(self.handle_failure(step, e));
            }
        }

        self.set_phase(FillPhase::Success);
        let receipt = self
            .receipt
            .clone()
            .ok_or_else(|| FillError::InvalidState("completed without a receipt".into()))?;
        info!(
            request_id = %self.request.request_id,
            tx = %receipt.transaction_hash,
            "fill settled"
        );
        Ok(FillOutcome {
            request_id: self.request.request_id.clone(),
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }

    async fn authorize(&mut self) -> FillResult<()> {
        self.start_step(StepId::Authorize)?;
        self.set_phase(FillPhase::Authorizing);

        let provider = self.services.provider.clone();
        let request = self.request.authorization_request();
        let response = self
            .guarded(StepId::Authorize, self.config.authorization_timeout, async move {
                provider.request_authorization(&request).await
            })
            .await?;

        if !response.success {
            return Err(FillError::AuthorizationRefused {
                message: response.message.unwrap_or_else(|| "no reason given".into()),
                retryable: response.retryable,
            });
        }
        let order = response
            .order_with_authorization_data
            .ok_or_else(|| FillError::MalformedResponse("missing order".into()))?;
        if order.order_id != self.request.order_id || order.commitment != self.request.commitment {
            return Err(FillError::MalformedResponse("response is for another order".into()));
        }

        // same checks settlement will run, against what this taker asked for
        let blob = PredicateBlob::decode(&order.authorization_data)
            .map_err(|e| FillError::MalformedResponse(e.to_string()))?;
        let decision = self.services.adapter.authorize(
            &self.request.commitment,
            &self.request.offer,
            &blob.signals,
            &blob.proof,
        );
        let ticket = match decision {
            AuthorizationDecision::Authorized(ticket) => ticket,
            AuthorizationDecision::Rejected(reason) => return Err(FillError::Rejected(reason)),
        };

        self.order = Some(order);
        self.ticket = Some(ticket);
        self.finish_step(StepId::Authorize)?;
        self.set_phase(FillPhase::Authorized);
        Ok(())
    }

    async fn approve(&mut self) -> FillResult<()> {
        self.start_step(StepId::Approve)?;
        self.set_phase(FillPhase::Confirming {
            step: StepId::Approve,
        });

        let token = self.authorized_order()?.taker_asset.clone();
        let amount = self
            .request
            .taker_payment()
            .ok_or_else(|| FillError::InvalidRequest("taker payment overflows".into()))?;
        let approver = self.services.approver.clone();
        let owner = self.request.taker.clone();

        let tx = self
            .guarded(StepId::Approve, self.config.approval_timeout, async move {
                approver.approve(&owner, &token, amount).await
            })
            .await?;

        let updated = self.tracker.set_transaction_hash(StepId::Approve, tx).clone();
        self.emit_step(updated);
        self.finish_step(StepId::Approve)
    }

    async fn execute(&mut self) -> FillResult<()> {
        self.start_step(StepId::Execute)?;
        self.set_phase(FillPhase::Confirming {
            step: StepId::Execute,
        });

        if self.authorization_expired() {
            return Err(FillError::AuthorizationExpired);
        }
        let order = self.authorized_order()?.clone();
        let ticket = self
            .ticket
            .clone()
            .ok_or_else(|| FillError::InvalidState("no authorization ticket".into()))?;
        let settlement = self.services.settlement.clone();
        let taker = self.request.taker.clone();

        // an interrupted send may still land
        self.broadcast = true;
        let tx = self
            .guarded(StepId::Execute, self.config.execution_timeout, async move {
                settlement.execute(&order, &ticket, &taker).await
            })
            .await?;

        self.fill_tx = Some(tx.clone());
        let updated = self.tracker.set_transaction_hash(StepId::Execute, tx).clone();
        self.emit_step(updated);
        self.finish_step(StepId::Execute)
    }

    async fn confirm(&mut self) -> FillResult<()> {
        self.start_step(StepId::Confirm)?;

        let tx = self
            .fill_tx
            .clone()
            .ok_or_else(|| FillError::InvalidState("no fill transaction to confirm".into()))?;
        let settlement = self.services.settlement.clone();
        let wait_for = tx.clone();

        let receipt = self
            .guarded(StepId::Confirm, self.config.confirmation_timeout, async move {
                settlement.wait_for_confirmation(&wait_for).await
            })
            .await?;

        if !receipt.success {
            return Err(FillError::SettlementReverted(format!(
                "transaction {} reverted in block {}",
                receipt.transaction_hash, receipt.block_number
            )));
        }

        let updated = self.tracker.set_transaction_hash(StepId::Confirm, tx).clone();
        self.emit_step(updated);
        self.receipt = Some(receipt);
        self.finish_step(StepId::Confirm)?;
        self.set_phase(FillPhase::Confirmed);
        Ok(())
    }

    /// Await `fut` under the step timeout, giving way to cancellation
    async fn guarded<T, F>(&self, step: StepId, limit: Duration, fut: F) -> FillResult<T>
    where
        F: Future<Output = FillResult<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FillError::Cancelled),
            outcome = tokio::time::timeout(limit, fut) => {
                outcome.map_err(|_| FillError::Timeout(step))?
            }
        }
    }

    fn handle_failure(&mut self, step: StepId, error: FillError) -> FillError {
        if error == FillError::Cancelled || self.cancel.is_cancelled() {
            // local state stays as it was when cancellation hit
            debug!(request_id = %self.request.request_id, step = %step, "fill cancelled");
            if !self.phase.is_terminal() {
                self.set_phase(FillPhase::Cancelled {
                    broadcast: self.broadcast,
                });
            }
            return FillError::Cancelled;
        }

        warn!(
            request_id = %self.request.request_id,
            step = %step,
            error = %error,
            retryable = error.is_retryable(),
            "fill step failed"
        );
        let message = error.to_string();
        let updated = self.tracker.fail(step, message.clone(), now()).clone();
        self.emit_step(updated);
        self.set_phase(FillPhase::Failed {
            step,
            error: message,
        });
        self.last_error = Some(error.clone());
        FillError::StepFailed {
            step,
            cause: Box::new(error),
        }
    }

    fn authorization_expired(&self) -> bool {
        self.ticket
            .as_ref()
            .map_or(true, |t| t.issued_at().elapsed() > self.config.authorization_ttl)
    }

    fn authorized_order(&self) -> FillResult<&HiddenLimitOrder> {
        self.order
            .as_ref()
            .ok_or_else(|| FillError::InvalidState("order has not been authorized".into()))
    }

    fn start_step(&mut self, step: StepId) -> FillResult<()> {
        let updated = self.tracker.start(step, now())?.clone();
        self.emit_step(updated);
        Ok(())
    }

    fn finish_step(&mut self, step: StepId) -> FillResult<()> {
        let updated = self.tracker.succeed(step, now())?.clone();
        self.emit_step(updated);
        Ok(())
    }

    fn set_phase(&mut self, phase: FillPhase) {
        debug!(request_id = %self.request.request_id, phase = %phase, "fill phase changed");
        self.phase = phase.clone();
        self.emit(FillEvent::PhaseChanged {
            request_id: self.request.request_id.clone(),
            phase,
        });
    }

    fn emit_step(&self, step: TransactionStep) {
        self.emit(FillEvent::StepUpdated {
            request_id: self.request.request_id.clone(),
            step,
        });
    }

    fn emit(&self, event: FillEvent) {
        if let Some(tx) = &self.event_tx {
            // receiver may have gone away; the attempt carries on
            let _ = tx.send(event);
        }
    }
}

/// Current unix time in seconds
pub fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::StepState;
    use crate::chain::InMemoryChain;
    use crate::test_support::{harness, order, TAKER};
    use shade_zk::{OfferValues, ZkError};

    fn request(price: u128, amount: u128) -> FillRequest {
        FillRequest::for_order(&order(), OfferValues::new(price, amount), TAKER)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<FillEvent>) -> Vec<FillEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn phases(events: &[FillEvent]) -> Vec<FillPhase> {
        events
            .iter()
            .filter_map(|e| match e {
                FillEvent::PhaseChanged { phase, .. } => Some(phase.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_happy_path() {
        let h = harness();
        let mut fill = FillAuthorization::new(request(2100, 50), h.services.clone(), FillConfig::default());
        let mut rx = fill.subscribe();

        let outcome = fill.run().await.unwrap();
        assert_eq!(fill.phase(), &FillPhase::Success);
        assert!(fill.steps().iter().all(|s| s.state == StepState::Success));
        assert_eq!(fill.current_step(), None);
        assert!(h.chain.is_filled("order-1"));
        assert_eq!(
            h.chain.allowance(TAKER, &order().taker_asset),
            2100 * 50
        );
        assert_eq!(
            fill.steps()[StepId::Confirm.index()].transaction_hash.as_deref(),
            Some(outcome.transaction_hash.as_str())
        );

        let events = drain(&mut rx);
        assert_eq!(
            phases(&events),
            vec![
                FillPhase::Authorizing,
                FillPhase::Authorized,
                FillPhase::Confirming { step: StepId::Approve },
                FillPhase::Confirming { step: StepId::Execute },
                FillPhase::Confirmed,
                FillPhase::Success,
            ]
        );
        assert!(events.iter().all(|e| match e {
            FillEvent::PhaseChanged { request_id, .. } | FillEvent::StepUpdated { request_id, .. } =>
                request_id == &outcome.request_id,
        }));
    }

    #[tokio::test]
    async fn test_price_below_limit_is_terminal() {
        let h = harness();
        let mut fill = FillAuthorization::new(request(1500, 50), h.services.clone(), FillConfig::default());

        let err = fill.run().await.unwrap_err();
        assert!(matches!(
            err.root_cause(),
            FillError::AuthorizationRefused { retryable: false, .. }
        ));
        assert!(err.to_string().contains(&ZkError::PriceConstraintViolated.to_string()));
        assert!(matches!(fill.phase(), FillPhase::Failed { step: StepId::Authorize, .. }));
        assert!(fill.ticket().is_none());

        let retry = fill.retry().await.unwrap_err();
        assert!(matches!(retry, FillError::RetryRefused { step: StepId::Authorize, .. }));
        assert!(!h.chain.is_filled("order-1"));
    }

    #[tokio::test]
    async fn test_approval_failure_retries_from_approve() {
        let h = harness();
        h.chain.fail_next_approvals(1);
        let mut fill = FillAuthorization::new(request(2100, 50), h.services.clone(), FillConfig::default());

        let err = fill.run().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(fill.current_step(), Some(StepId::Approve));
        assert_eq!(fill.steps()[StepId::Authorize.index()].state, StepState::Success);
        assert_eq!(fill.steps()[StepId::Approve.index()].state, StepState::Error);

        let outcome = fill.retry().await.unwrap();
        assert_eq!(fill.phase(), &FillPhase::Success);
        assert!(outcome.block_number > 0);
    }

    #[tokio::test]
    async fn test_confirmation_network_failure_retries_confirm_only() {
        let h = harness();
        h.chain.fail_next_confirmations(1);
        let mut fill = FillAuthorization::new(request(2100, 50), h.services.clone(), FillConfig::default());

        let err = fill.run().await.unwrap_err();
        assert!(matches!(err.root_cause(), FillError::Network(_)));
        assert!(matches!(fill.phase(), FillPhase::Failed { step: StepId::Confirm, .. }));
        let fill_tx = fill.steps()[StepId::Execute.index()].transaction_hash.clone();

        let outcome = fill.retry().await.unwrap();
        // the fill is not resubmitted
        assert_eq!(Some(outcome.transaction_hash), fill_tx);
    }

    #[tokio::test]
    async fn test_reverted_fill_is_terminal() {
        let h = harness();
        h.chain.revert_next_fill();
        let mut fill = FillAuthorization::new(request(2100, 50), h.services.clone(), FillConfig::default());

        let err = fill.run().await.unwrap_err();
        assert!(matches!(err.root_cause(), FillError::SettlementReverted(_)));
        assert!(matches!(fill.phase(), FillPhase::Failed { step: StepId::Confirm, .. }));
        assert!(matches!(
            fill.retry().await,
            Err(FillError::RetryRefused { step: StepId::Confirm, .. })
        ));
    }

    #[tokio::test]
    async fn test_expired_authorization_needs_new_request() {
        let h = harness();
        let config = FillConfig {
            authorization_ttl: Duration::ZERO,
            ..FillConfig::default()
        };
        let mut fill = FillAuthorization::new(request(2100, 50), h.services.clone(), config);

        let err = fill.run().await.unwrap_err();
        assert_eq!(err.root_cause(), &FillError::AuthorizationExpired);
        assert!(matches!(fill.phase(), FillPhase::Failed { step: StepId::Execute, .. }));
        assert!(fill.retry().await.is_err());
        assert!(!h.chain.is_filled("order-1"));
    }

    #[tokio::test]
    async fn test_cancel_after_broadcast() {
        let h = harness();
        h.chain.set_confirmation_delay(Duration::from_secs(30));
        let mut fill = FillAuthorization::new(request(2100, 50), h.services.clone(), FillConfig::default());
        let mut rx = fill.subscribe();
        let token = fill.cancellation_token();

        let watcher = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let FillEvent::StepUpdated { step, .. } = event {
                    if step.id == StepId::Confirm && step.state == StepState::Loading {
                        token.cancel();
                        break;
                    }
                }
            }
        });

        let err = fill.run().await.unwrap_err();
        watcher.await.unwrap();
        assert_eq!(err, FillError::Cancelled);
        assert_eq!(fill.phase(), &FillPhase::Cancelled { broadcast: true });
        // step state is left where cancellation found it
        assert_eq!(fill.steps()[StepId::Confirm.index()].state, StepState::Loading);
        assert!(fill.retry().await.is_err());
    }

    /// Settlement that hangs after handing the fill to the network
    struct SlowSettlement {
        inner: Arc<InMemoryChain>,
        sent: Arc<tokio::sync::Notify>,
    }

    #[async_trait::async_trait]
    impl SettlementClient for SlowSettlement {
        async fn execute(
            &self,
            order: &HiddenLimitOrder,
            ticket: &AuthorizationTicket,
            taker: &str,
        ) -> FillResult<TxHash> {
            let tx = self.inner.execute(order, ticket, taker).await?;
            self.sent.notify_one();
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(tx)
        }

        async fn wait_for_confirmation(&self, transaction_hash: &str) -> FillResult<Receipt> {
            self.inner.wait_for_confirmation(transaction_hash).await
        }
    }

    #[tokio::test]
    async fn test_cancel_during_execute_counts_as_broadcast() {
        let h = harness();
        let sent = Arc::new(tokio::sync::Notify::new());
        let services = FillServices {
            settlement: Arc::new(SlowSettlement {
                inner: h.chain.clone(),
                sent: sent.clone(),
            }),
            ..h.services.clone()
        };
        let mut fill = FillAuthorization::new(request(2100, 50), services, FillConfig::default());
        let token = fill.cancellation_token();

        let canceller = tokio::spawn(async move {
            sent.notified().await;
            token.cancel();
        });

        let err = fill.run().await.unwrap_err();
        canceller.await.unwrap();
        assert_eq!(err, FillError::Cancelled);
        assert_eq!(fill.phase(), &FillPhase::Cancelled { broadcast: true });
        assert_eq!(fill.steps()[StepId::Execute.index()].state, StepState::Loading);
        // the fill reached the chain before the reply was abandoned
        assert!(h.chain.is_filled("order-1"));
    }

    #[test]
    fn test_now_tracks_order_expiry() {
        let mut expiring = order();
        expiring.expiry = now() + 60;
        assert!(!expiring.is_expired(now()));
        assert!(expiring.is_expired(now() + 61));
    }

    #[tokio::test]
    async fn test_cancel_before_run() {
        let h = harness();
        let mut fill = FillAuthorization::new(request(2100, 50), h.services.clone(), FillConfig::default());
        fill.cancel();
        assert_eq!(fill.phase(), &FillPhase::Cancelled { broadcast: false });
        assert!(matches!(fill.run().await, Err(FillError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_confirmation_timeout_then_retry() {
        let h = harness();
        h.chain.set_confirmation_delay(Duration::from_secs(5));
        let config = FillConfig {
            confirmation_timeout: Duration::from_millis(50),
            ..FillConfig::default()
        };
        let mut fill = FillAuthorization::new(request(2100, 50), h.services.clone(), config);

        let err = fill.run().await.unwrap_err();
        assert_eq!(err.root_cause(), &FillError::Timeout(StepId::Confirm));

        h.chain.set_confirmation_delay(Duration::ZERO);
        fill.retry().await.unwrap();
        assert_eq!(fill.phase(), &FillPhase::Success);
    }

    #[tokio::test]
    async fn test_unknown_order_refused() {
        let h = harness();
        let mut other = order();
        other.order_id = "missing".into();
        let req = FillRequest::for_order(&other, OfferValues::new(2100, 50), TAKER);
        let mut fill = FillAuthorization::new(req, h.services.clone(), FillConfig::default());

        let err = fill.run().await.unwrap_err();
        assert!(matches!(
            err.root_cause(),
            FillError::AuthorizationRefused { retryable: false, .. }
        ));
    }
}
