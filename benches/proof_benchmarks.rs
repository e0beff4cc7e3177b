//! Performance Benchmarks for SHADE Proofs
//!
//! Run with: cargo bench

use ark_bn254::Fr;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use light_poseidon::{Poseidon, PoseidonHasher};
use shade::hash::{poseidon_hash3, PoseidonParams};
use shade::predicate::PredicateBlob;
use shade::prelude::*;
use shade::zk::circuit_stats;

const NONCE: u128 = 123456789;

// =============================================================================
// HASH BENCHMARKS
// =============================================================================

fn bench_commit(c: &mut Criterion) {
    c.bench_function("commit", |b| b.iter(|| commit(2000, 10, NONCE)));
}

fn bench_poseidon_params(c: &mut Criterion) {
    let mut group = c.benchmark_group("poseidon_t4");
    let params = PoseidonParams::three_to_one();
    let inputs = [Fr::from(1u64), Fr::from(2u64), Fr::from(3u64)];

    let mut reference = Poseidon::<Fr>::new_circom(3).unwrap();

    group.bench_function("poseidon_hash3", |b| {
        b.iter(|| poseidon_hash3(&inputs[0], &inputs[1], &inputs[2]))
    });
    group.bench_function("native_params", |b| b.iter(|| params.hash(&inputs).unwrap()));
    group.bench_function("light_poseidon", |b| b.iter(|| reference.hash(&inputs).unwrap()));
    group.finish();
}

// =============================================================================
// PROOF BENCHMARKS
// =============================================================================

fn bench_synthesis(c: &mut Criterion) {
    c.bench_function("circuit_synthesis", |b| b.iter(|| circuit_stats().unwrap()));
}

fn bench_prove_verify(c: &mut Criterion) {
    let artifacts = CircuitArtifacts::generate(Some(1)).unwrap();
    let generator = ProofGenerator::new(artifacts.proving.clone());
    let secrets = SecretParameters::new(2000, 10, NONCE);
    let commitment = secrets.commitment();

    let mut group = c.benchmark_group("groth16");
    group.sample_size(10);

    for price in [2000u128, u64::MAX as u128, u128::MAX] {
        let offer = OfferValues::new(price, 50);
        group.bench_with_input(BenchmarkId::new("prove", price), &offer, |b, offer| {
            b.iter(|| generator.prove(&secrets, &commitment, offer).unwrap())
        });
    }

    let offer = OfferValues::new(2100, 50);
    let generated = generator.prove(&secrets, &commitment, &offer).unwrap();
    let calldata = generated.calldata();
    let signals = generated.signal_words();
    group.bench_function("verify", |b| {
        b.iter(|| assert!(verify(&calldata, &signals, &artifacts.verifying)))
    });

    let adapter = PredicateAdapter::new(OnChainVerifier::new(artifacts.verifying.clone()));
    let blob = PredicateBlob::from_generated(commitment, offer, &generated).encode();
    group.bench_function("check_predicate", |b| b.iter(|| adapter.check_predicate(&blob)));
    group.finish();
}

criterion_group!(hash_benches, bench_commit, bench_poseidon_params);
criterion_group!(proof_benches, bench_synthesis, bench_prove_verify);
criterion_main!(hash_benches, proof_benches);
