//! R1CS gadgets used by the hidden-limit circuit

pub mod compare;
pub mod poseidon;

pub use compare::{enforce_bit_length, enforce_geq};
pub use poseidon::{poseidon_hash3_var, poseidon_hash_var};
