use criterion::{criterion_group, criterion_main};

criterion_group!(benches, sniff_tests::benches::run);
criterion_main!(benches);
