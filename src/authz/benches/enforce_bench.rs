//! Enforcement benchmarks
//!
//! Compile once, enforce many times: the per-query path is what matters.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use iam_authz::{EngineConfig, EnforcementQuery, Enforcer, PolicyModel};

fn create_policy_document(rule_count: usize) -> String {
    let mut document = String::new();
    for i in 0..rule_count {
        let effect = if i % 10 == 0 { "deny" } else { "allow" };
        document.push_str(&format!(
            "p, hrn:acme::iam-policy/p{}, hrn:acme::invoice/{}*, hrn:acme::invoice$view, {}\n",
            i % 20,
            i,
            effect
        ));
    }
    // a chain of roles: user -> p0 -> p1 -> ... -> p19
    document.push_str("g, hrn:acme::iam-user/alice, hrn:acme::iam-policy/p0\n");
    for i in 0..19 {
        document.push_str(&format!(
            "g, hrn:acme::iam-policy/p{}, hrn:acme::iam-policy/p{}\n",
            i,
            i + 1
        ));
    }
    document
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for rule_count in [10, 100, 1000].iter() {
        let document = create_policy_document(*rule_count);
        group.bench_with_input(BenchmarkId::new("rules", rule_count), &document, |b, document| {
            b.iter(|| PolicyModel::compile(black_box(document)))
        });
    }

    group.finish();
}

fn bench_enforce(c: &mut Criterion) {
    let mut group = c.benchmark_group("enforce");

    for rule_count in [10, 100, 1000].iter() {
        let model = PolicyModel::compile(&create_policy_document(*rule_count)).unwrap();

        for cache_roles in [true, false] {
            let enforcer = Enforcer::with_config(
                model.clone(),
                EngineConfig {
                    cache_roles,
                    ..Default::default()
                },
            );
            let label = if cache_roles { "cached" } else { "uncached" };

            group.bench_with_input(
                BenchmarkId::new(label, rule_count),
                &enforcer,
                |b, enforcer| {
                    b.iter(|| {
                        enforcer.enforce(
                            black_box("hrn:acme::iam-user/alice"),
                            black_box("hrn:acme::invoice/5"),
                            black_box("hrn:acme::invoice$view"),
                        )
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let enforcer = Enforcer::new(PolicyModel::compile(&create_policy_document(100)).unwrap());
    let queries: Vec<EnforcementQuery> = (0..50)
        .map(|i| {
            EnforcementQuery::new(
                "hrn:acme::iam-user/alice",
                format!("hrn:acme::invoice/{}", i),
                "hrn:acme::invoice$view",
            )
        })
        .collect();

    c.bench_function("batch_enforce_50", |b| {
        b.iter(|| enforcer.batch_enforce(black_box(&queries)))
    });
}

criterion_group!(benches, bench_compile, bench_enforce, bench_batch);
criterion_main!(benches);
