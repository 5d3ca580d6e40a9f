//! Benchmarks for the session read overlay.
//!
//! Each benchmark reads a whole feature type through a session holding a
//! growing number of pending deltas, against a direct store read as baseline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geodelta_core::schema::FeatureTypeBuilder;
use geodelta_core::{AttributeValues, Crs, DataType, Feature, FeatureId, Geometry, Value};
use geodelta_query::{Filter, Query};
use geodelta_session::Session;
use geodelta_storage::{FeatureStore, MemoryStore};
use std::sync::Arc;

// ============================================================================
// Data Generation Utilities
// ============================================================================

fn create_store(count: usize) -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    let road = FeatureTypeBuilder::new("road")
        .unwrap()
        .add_attribute("status", DataType::String)
        .unwrap()
        .add_attribute("lanes", DataType::Int64)
        .unwrap()
        .add_geometry("geom", Crs::new("EPSG:4326"))
        .unwrap()
        .build()
        .unwrap();
    store.create_type(road).unwrap();
    let features = (0..count)
        .map(|i| {
            Feature::new(FeatureId::new("draft"))
                .with_attribute("status", if i % 2 == 0 { "open" } else { "closed" })
                .with_attribute("lanes", (i % 4) as i64)
                .with_attribute("geom", Geometry::point(i as f64, (i % 100) as f64))
        })
        .collect();
    store.add_features("road", features).unwrap();
    Arc::new(store)
}

/// Session with `deltas` single-feature modifications queued.
fn create_session(store: &Arc<MemoryStore>, deltas: usize) -> Session {
    let mut session = Session::new(store.clone());
    for i in 0..deltas {
        let mut values = AttributeValues::new();
        values.insert("lanes".into(), Value::Int64(8));
        session
            .update_features("road", &Filter::id(format!("road.{}", i + 1).as_str()), &values)
            .unwrap();
    }
    session
}

// ============================================================================
// Overlay Benchmarks
// ============================================================================

fn bench_direct_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("direct_read");

    for size in [100, 1000, 10000].iter() {
        let store = create_store(*size);
        let query = Query::new("road").with_filter(Filter::eq("status", "open"));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(store.reader(&query).unwrap().count()))
        });
    }

    group.finish();
}

fn bench_overlay_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay_read");

    let store = create_store(10000);
    let query = Query::new("road").with_filter(Filter::eq("status", "open"));
    for deltas in [0, 1, 10, 100].iter() {
        let session = create_session(&store, *deltas);
        group.bench_with_input(BenchmarkId::from_parameter(deltas), deltas, |b, _| {
            b.iter(|| black_box(session.reader(&query).unwrap().count()))
        });
    }

    group.finish();
}

fn bench_queue_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_update");

    for size in [100, 1000, 10000].iter() {
        let store = create_store(*size);
        let mut values = AttributeValues::new();
        values.insert("status".into(), Value::from("closed"));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut session = Session::new(store.clone());
                session
                    .update_features("road", &Filter::eq("lanes", 2i64), &values)
                    .unwrap();
                black_box(session.has_pending_changes())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_direct_read, bench_overlay_read, bench_queue_update);

criterion_main!(benches);
