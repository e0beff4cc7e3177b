//! SHADE Predicate Adapter
//!
//! The settlement-side gate for hidden-limit fills. A fill is approved only
//! when the proof's public signals name exactly the order commitment and
//! offer being settled, and the proof verifies.

pub mod adapter;
pub mod blob;
pub mod errors;

pub use adapter::{
    AuthorizationDecision, AuthorizationTicket, BindingField, PredicateAdapter, RejectionReason,
};
pub use blob::{PredicateBlob, BLOB_LEN, BLOB_WORDS};
pub use errors::PredicateError;
