//! In-memory settlement chain for tests and local runs
//!
//! Approvals and fills are recorded instead of broadcast. Execution replays
//! the settlement predicate against the order being filled, the way the
//! contract would, and a filled order cannot be filled twice.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use shade_predicate::{AuthorizationTicket, PredicateAdapter};

use crate::errors::{FillError, FillResult};
use crate::lifecycle::{Receipt, SettlementClient, TokenApprover, TxHash};
use crate::order::HiddenLimitOrder;

#[derive(Default)]
struct ChainState {
    block: u64,
    allowances: HashMap<(String, String), u128>,
    filled: HashSet<String>,
    pending: HashMap<TxHash, bool>,
    approval_failures: u32,
    network_failures: u32,
    revert_next: bool,
}

/// Simple in-memory chain
pub struct InMemoryChain {
    adapter: Arc<PredicateAdapter>,
    state: Mutex<ChainState>,
    confirmation_delay: Mutex<Duration>,
}

impl InMemoryChain {
    pub fn new(adapter: Arc<PredicateAdapter>) -> Self {
        Self {
            adapter,
            state: Mutex::new(ChainState::default()),
            confirmation_delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Fail the next `n` approvals
    pub fn fail_next_approvals(&self, n: u32) {
        self.state.lock().approval_failures = n;
    }

    /// Fail the next `n` confirmation queries with a network error
    pub fn fail_next_confirmations(&self, n: u32) {
        self.state.lock().network_failures = n;
    }

    /// Mine the next fill as reverted
    pub fn revert_next_fill(&self) {
        self.state.lock().revert_next = true;
    }

    pub fn set_confirmation_delay(&self, delay: Duration) {
        *self.confirmation_delay.lock() = delay;
    }

    pub fn allowance(&self, owner: &str, token: &str) -> u128 {
        self.state
            .lock()
            .allowances
            .get(&(owner.to_string(), token.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_filled(&self, order_id: &str) -> bool {
        self.state.lock().filled.contains(order_id)
    }

    fn next_hash(state: &mut ChainState, tag: &[u8]) -> TxHash {
        state.block += 1;
        let digest = shade_hash::hash_many(&[tag, &state.block.to_be_bytes()]);
        format!("0x{}", hex::encode(digest))
    }
}

#[async_trait::async_trait]
impl TokenApprover for InMemoryChain {
    async fn approve(&self, owner: &str, token: &str, amount: u128) -> FillResult<TxHash> {
        let mut state = self.state.lock();
        if state.approval_failures > 0 {
            state.approval_failures -= 1;
            return Err(FillError::ApprovalFailed("approval transaction dropped".into()));
        }
        state
            .allowances
            .insert((owner.to_string(), token.to_string()), amount);
        Ok(Self::next_hash(&mut state, b"approve"))
    }
}

#[async_trait::async_trait]
impl SettlementClient for InMemoryChain {
    async fn execute(
        &self,
        order: &HiddenLimitOrder,
        ticket: &AuthorizationTicket,
        taker: &str,
    ) -> FillResult<TxHash> {
        // bind to the order being settled, not the commitment the ticket declares
        let blob = ticket.blob();
        let authorized = self
            .adapter
            .authorize(&order.commitment, ticket.offer(), &blob.signals, &blob.proof)
            .is_authorized();

        let mut state = self.state.lock();
        let allowance = state
            .allowances
            .get(&(taker.to_string(), order.taker_asset.clone()))
            .copied()
            .unwrap_or(0);
        let required = ticket
            .offer()
            .offered_price
            .checked_mul(ticket.offer().offered_amount)
            .unwrap_or(u128::MAX);

        let success = authorized
            && !state.revert_next
            && allowance >= required
            && !state.filled.contains(&order.order_id);
        state.revert_next = false;
        if success {
            state.filled.insert(order.order_id.clone());
        }

        let hash = Self::next_hash(&mut state, b"fill");
        state.pending.insert(hash.clone(), success);
        Ok(hash)
    }

    async fn wait_for_confirmation(&self, transaction_hash: &str) -> FillResult<Receipt> {
        let delay = *self.confirmation_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.network_failures > 0 {
            state.network_failures -= 1;
            return Err(FillError::Network("receipt query failed".into()));
        }
        let success = *state
            .pending
            .get(transaction_hash)
            .ok_or_else(|| FillError::Network(format!("unknown transaction {}", transaction_hash)))?;
        Ok(Receipt {
            transaction_hash: transaction_hash.to_string(),
            block_number: state.block,
            success,
        })
    }
}
