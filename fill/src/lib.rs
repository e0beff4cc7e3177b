//! SHADE Fill Authorization
//!
//! Taker-side state machine that walks one fill through authorization,
//! token approval, execution and confirmation, plus the maker-side service
//! that answers authorization requests with hidden-limit proofs.

pub mod chain;
pub mod errors;
pub mod lifecycle;
pub mod maker;
pub mod order;
pub mod request;
pub mod steps;

#[cfg(test)]
pub(crate) mod test_support;

pub use chain::InMemoryChain;
pub use errors::{FillError, FillResult};
pub use lifecycle::{
    now, AuthorizationProvider, FillAuthorization, FillConfig, FillEvent, FillOutcome, FillPhase,
    FillServices, Receipt, SettlementClient, TokenApprover, TxHash,
};
pub use maker::{InMemoryOrderStore, InMemorySecretStore, MakerService, OrderStore, SecretStore};
pub use order::{
    validate_order_form, validate_order_form_at, HiddenLimitOrder, OrderForm, ValidatedOrder,
    ValidationError,
};
pub use request::{AuthorizationRequest, AuthorizationResponse, FillRequest};
pub use steps::{StepId, StepState, StepTracker, TransactionStep};
