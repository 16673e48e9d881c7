use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use eavpot::construct::Entity;
use eavpot::driver::Driver;
use eavpot::persist::Persistor;
use eavpot::query::{self, Query};
use eavpot::statement::Statement;

// ------------- Fixtures -------------
fn nested_query() -> Query {
    query::greater_than("age", 30)
        .equals("admin", true)
        .or(|q| {
            q.like("name", "o")
                .right_like("name", "Al")
                .and(|q| q.less_than("age", 20).not_equals("city", "Oslo"))
        })
}

fn people(n: i64) -> Vec<Entity> {
    (0..n)
        .map(|i| {
            Entity::new()
                .with_attribute("name", format!("person {}", i))
                .with_attribute("age", i % 90)
                .with_attribute("admin", i % 10 == 0)
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let q = nested_query();
    c.bench_function("compile nested query", |b| b.iter(|| black_box(&q).to_array()));

    let node = q.to_array();
    c.bench_function("serialize compiled query", |b| {
        b.iter(|| serde_json::to_string(black_box(&node)))
    });

    c.bench_function("statement 100 values", |b| {
        b.iter(|| {
            let mut statement = Statement::new();
            for i in 0..100i64 {
                statement.add_text(" , ");
                statement.add_value(black_box(i % 50)).unwrap();
            }
            statement
        })
    });

    let batch = people(100);
    c.bench_function("put 100 entities", |b| {
        let mut store = Persistor::in_memory("").unwrap();
        b.iter(|| store.put("people", black_box(&batch)).unwrap())
    });

    let mut store = Persistor::in_memory("").unwrap();
    store.put("people", &people(1000)).unwrap();
    let older = query::greater_than("age", 60);
    c.bench_function("get 1k by comparison", |b| {
        b.iter(|| store.get("people", black_box(&older), 0, None).unwrap())
    });
    c.bench_function("get 1k nested", |b| {
        b.iter(|| store.get("people", black_box(&q), 0, Some(10)).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
