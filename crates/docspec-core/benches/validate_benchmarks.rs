//! Benchmarks for spec parsing, tree walking and validation
//!
//! These benchmarks cover the synchronous walk on its own and the full
//! validation flow for small documents and large document lists.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docspec_core::{Schema, SchemaMapper, SchemaOptions, SpecNode, TypeRegistry, Value};
use serde_json::json;

fn create_spec() -> serde_json::Value {
    json!({
        "_id": "ObjectId",
        "name": {"$type": "String", "$validate": {"required": true}, "$filter": {"trim": true}},
        "email": {"$type": "String", "$validate": {"email": true}},
        "age": "Number",
        "created": {"$type": "Date", "$filter": {"defaultValue": "now"}},
        "tags": ["String"],
        "address": {
            "street": "String",
            "number": {"$type": "Number", "$validate": {"required": true}},
            "rooms": [{"name": "String", "size": "Number"}]
        }
    })
}

fn create_document(i: usize) -> serde_json::Value {
    json!({
        "name": format!("  Person {} ", i),
        "email": format!("person{}@example.com", i),
        "age": format!("{}", 20 + i % 50),
        "tags": ["a", "b", i],
        "address": {
            "street": "Main Street",
            "number": i.to_string(),
            "rooms": [{"name": "hall", "size": "12"}, {"name": "kitchen", "size": 9}]
        }
    })
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

fn bench_spec_parsing(c: &mut Criterion) {
    let spec = create_spec();
    c.bench_function("spec_from_json", |b| {
        b.iter(|| SpecNode::from_json(black_box(&spec)).unwrap())
    });
}

fn bench_mapping(c: &mut Criterion) {
    let spec = SpecNode::from_json(&create_spec()).unwrap();
    let registry = TypeRegistry::standard();
    let mapper = SchemaMapper::new(&spec, &registry);
    let document = Value::from(create_document(1));

    c.bench_function("map_document", |b| {
        b.iter(|| {
            let mut data = document.clone();
            let mut visited = 0usize;
            mapper
                .map(&mut data, |_| {
                    visited += 1;
                    Ok(())
                })
                .unwrap();
            black_box(visited)
        })
    });
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    let schema = Schema::from_json(&create_spec(), SchemaOptions::default().with_strict(true)).unwrap();

    for count in [1usize, 10, 100] {
        let documents: Vec<serde_json::Value> = (0..count).map(create_document).collect();
        let documents = Value::from(serde_json::Value::from(documents));

        group.bench_with_input(BenchmarkId::new("documents", count), &documents, |b, documents| {
            b.iter(|| {
                let mut data = documents.clone();
                black_box(block_on(schema.validate(&mut data)).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_query_validation(c: &mut Criterion) {
    let schema = Schema::from_json(&create_spec(), SchemaOptions::default()).unwrap();
    let query = Value::from(json!({
        "age": {"$gte": "18", "$lt": "65"},
        "tags": {"$in": ["a", "b", "c"]},
        "$or": [{"name": "Person 1"}, {"address.number": "12"}]
    }));

    c.bench_function("validate_query", |b| {
        b.iter(|| {
            let mut data = query.clone();
            black_box(block_on(schema.validate_query(&mut data)).unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_spec_parsing,
    bench_mapping,
    bench_validation,
    bench_query_validation
);
criterion_main!(benches);
