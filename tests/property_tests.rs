//! Property-Based Tests for SHADE Primitives
//!
//! Uses proptest to generate random inputs and check the properties that hold
//! without running the prover.

use proptest::prelude::*;
use shade::predicate::{PredicateAdapter, BLOB_LEN};
use shade::prelude::*;
use shade::zk::check_witness;

// =============================================================================
// PROPTEST STRATEGIES
// =============================================================================

/// Strategy for a byte vector around the predicate blob length
fn blob_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=BLOB_LEN + 32)
}

fn adapter() -> PredicateAdapter {
    // verification is never reached for random data; any key works
    use once_cell::sync::Lazy;
    static ARTIFACTS: Lazy<CircuitArtifacts> =
        Lazy::new(|| CircuitArtifacts::generate(Some(1)).expect("Setup should succeed"));
    PredicateAdapter::new(OnChainVerifier::new(ARTIFACTS.verifying.clone()))
}

// =============================================================================
// COMMITMENT PROPERTIES
// =============================================================================

proptest! {
    /// Property: commitments are deterministic
    #[test]
    fn commit_is_deterministic(price in any::<u128>(), amount in any::<u128>(), nonce in any::<u128>()) {
        prop_assert_eq!(commit(price, amount, nonce), commit(price, amount, nonce));
    }

    /// Property: changing the nonce changes the commitment
    #[test]
    fn nonce_changes_commitment(price in any::<u128>(), amount in any::<u128>(), nonce in 0u128..u128::MAX) {
        prop_assert_ne!(commit(price, amount, nonce), commit(price, amount, nonce + 1));
    }

    /// Property: the decimal form parses back to the same commitment
    #[test]
    fn commitment_decimal_parses(price in any::<u128>(), amount in any::<u128>(), nonce in any::<u128>()) {
        let c = commit(price, amount, nonce);
        prop_assert_eq!(c.to_string().parse::<Commitment>().unwrap(), c);
    }
}

// =============================================================================
// WITNESS PROPERTIES
// =============================================================================

proptest! {
    /// Property: the pre-proving check accepts exactly offers at or above the limits
    #[test]
    fn witness_check_matches_limits(
        price in any::<u128>(),
        amount in any::<u128>(),
        offered_price in any::<u128>(),
        offered_amount in any::<u128>(),
    ) {
        let secrets = SecretParameters::new(price, amount, 5);
        let offer = OfferValues::new(offered_price, offered_amount);
        let result = check_witness(&secrets, &secrets.commitment(), &offer);

        let expected = if offered_price < price {
            Err(ZkError::PriceConstraintViolated)
        } else if offered_amount < amount {
            Err(ZkError::AmountConstraintViolated)
        } else {
            Ok(())
        };
        prop_assert_eq!(result, expected);
    }

    /// Property: signals decode only with the validity flag set
    #[test]
    fn signals_need_validity_flag(flag in 2u128.., nonce in any::<u128>()) {
        let signals = PublicSignals::new(commit(1, 1, nonce), nonce, OfferValues::new(3, 4));
        let mut words = signals.to_words();
        prop_assert_eq!(PublicSignals::from_words(&words).unwrap(), signals);

        words[0] = Word::from_u128(flag);
        prop_assert!(PublicSignals::from_words(&words).is_err());
    }
}

// =============================================================================
// PREDICATE PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: arbitrary predicate data never authorizes and never panics
    #[test]
    fn random_predicate_data_is_rejected(bytes in blob_bytes()) {
        prop_assert_eq!(adapter().check_predicate(&bytes), Word::ZERO);
    }
}
