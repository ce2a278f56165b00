use agent_wallet_service::models::{ApiKey, ApiKeyLimits, ApiKeyStatus, PendingLine};
use agent_wallet_service::observability::LatencyTimer;
use agent_wallet_service::services::{LedgerEngine, RateLimiter};
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

fn key_with_scopes(scopes: Vec<&str>) -> ApiKey {
    ApiKey {
        id: Uuid::new_v4(),
        key_hash: "hash".to_string(),
        wallet_id: Uuid::new_v4(),
        scopes: sqlx::types::Json(scopes.into_iter().map(String::from).collect()),
        limits: sqlx::types::Json(Some(ApiKeyLimits {
            per_tx_max: Some(Decimal::from(5000)),
            daily_max: Some(Decimal::from(20000)),
            allowed_counterparties: None,
        })),
        status: ApiKeyStatus::Active,
        last_used_at: None,
        created_at: Utc::now(),
    }
}

fn benchmark_scope_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("scope");

    let exact_key = key_with_scopes(vec!["transfer:create", "hold:create"]);
    group.bench_function("exact_match", |b| {
        b.iter(|| black_box(exact_key.has_scope(black_box("transfer:create"))));
    });

    let wildcard_key = key_with_scopes(vec!["admin:*"]);
    group.bench_function("wildcard_match", |b| {
        b.iter(|| black_box(wildcard_key.has_scope(black_box("admin:wallets:freeze"))));
    });

    group.finish();
}

fn benchmark_rate_limiter(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_limiter");

    group.bench_function("check_within_capacity", |b| {
        let limiter = RateLimiter::new(1_000_000.0);
        let key_id = Uuid::new_v4();
        b.iter(|| black_box(limiter.check(black_box(key_id))));
    });

    group.finish();
}

fn benchmark_ledger_line_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_engine");

    // Construction only; `validate_lines` never touches the pool.
    let engine = LedgerEngine::new(PgPool::connect_lazy("postgres://localhost/bench").unwrap());
    let from = Uuid::new_v4();
    let to = Uuid::new_v4();

    group.bench_function("validate_balanced_pair", |b| {
        b.iter(|| {
            let lines = vec![
                PendingLine::debit(from, black_box(Decimal::from(1000)), "USD"),
                PendingLine::credit(to, black_box(Decimal::from(1000)), "USD"),
            ];
            black_box(engine.validate_lines(&lines))
        });
    });

    group.finish();
}

fn benchmark_latency_timer(c: &mut Criterion) {
    let mut group = c.benchmark_group("latency_timer");

    group.bench_function("create_and_elapsed", |b| {
        b.iter(|| {
            let timer = LatencyTimer::new();
            black_box(timer.elapsed_ms())
        });
    });

    group.finish();
}

fn benchmark_decimal_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("decimal");

    let a = Decimal::from(12345);
    let b_val = Decimal::from(67890);

    group.bench_function("addition", |b| {
        b.iter(|| black_box(a + b_val));
    });

    group.bench_function("comparison", |b| {
        b.iter(|| black_box(a < b_val));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_scope_matching,
    benchmark_rate_limiter,
    benchmark_ledger_line_validation,
    benchmark_latency_timer,
    benchmark_decimal_operations,
);

criterion_main!(benches);
