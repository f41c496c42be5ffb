//! Performance benchmarks for lingo-engine

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lingo_engine::{
    FinalizeRequest, GuestFeature, GuestStore, KnowledgePointDraft, LearningSession,
    LocalKnowledgePoint, LocalIdCounter, GuestProfile,
};
use serde_json::json;

fn draft(i: usize) -> KnowledgePointDraft {
    KnowledgePointDraft::from_value(json!({
        "id": format!("uuid-{}", i),
        "category": "grammar",
        "subcategory": "tense",
        "correct_phrase": "went",
        "incorrect_phrase_in_context": "go",
        "user_context_sentence": format!("I go there yesterday ({})", i),
        "key_point_summary": "go -> went",
    }))
    .unwrap()
}

fn populated_store(size: usize) -> GuestStore {
    let mut store = GuestStore::new(Utc.timestamp_opt(1_706_745_600, 0).unwrap());
    for i in 0..size {
        store.save_local_knowledge_point(draft(i));
    }
    store
}

fn bench_store_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_operations");

    group.bench_function("save_local_knowledge_point", |b| {
        let mut store = populated_store(0);
        let mut i = 0usize;

        b.iter(|| {
            i += 1;
            store.save_local_knowledge_point(black_box(draft(i)))
        })
    });

    group.bench_function("save_learning_session", |b| {
        let mut store = populated_store(0);
        let now = Utc.timestamp_opt(1_706_745_600, 0).unwrap();

        b.iter(|| store.save_learning_session(black_box(LearningSession::new(now).with("score", 90))))
    });

    group.bench_function("can_use_daily_practice", |b| {
        let mut store = populated_store(0);
        let now = Utc.timestamp_opt(1_706_745_600, 0).unwrap();
        for _ in 0..50 {
            store.save_learning_session(LearningSession::new(now));
        }

        b.iter(|| store.can_use_feature(black_box(GuestFeature::DailyPractice), &now))
    });

    for size in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("remove_local", size), size, |b, &size| {
            b.iter_batched(
                || populated_store(size),
                |mut store| store.remove_local(black_box(-(size as i64) / 2)),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_migration(c: &mut Criterion) {
    let mut group = c.benchmark_group("migration");

    for size in [100, 500, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("legacy", size), size, |b, &size| {
            let legacy: Vec<LocalKnowledgePoint> = (0..size)
                .map(|i| {
                    serde_json::from_value(json!({
                        "id": format!("uuid-{}", i),
                        "user_context_sentence": "我昨天去了商店",
                        "incorrect_phrase_in_context": "I go to store yesterday",
                        "subcategory": "tense",
                    }))
                    .unwrap()
                })
                .collect();

            b.iter_batched(
                || {
                    GuestStore::from_parts(
                        GuestProfile::default(),
                        legacy.clone(),
                        Vec::new(),
                        LocalIdCounter::new(),
                    )
                },
                |mut store| store.migrate_legacy_records(),
                criterion::BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("already_migrated", size), size, |b, &size| {
            let mut store = populated_store(size);
            b.iter(|| store.migrate_legacy_records())
        });
    }

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");

    for size in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("export_json", size), size, |b, &size| {
            let store = populated_store(size);
            b.iter(|| store.export_state().to_json())
        });
    }

    group.bench_function("finalize_request", |b| {
        let store = populated_store(1);
        let point = &store.local_knowledge_points()[0];

        b.iter(|| serde_json::to_string(&FinalizeRequest::from_local(black_box(point))))
    });

    group.bench_function("point_from_json", |b| {
        let json = r#"{"id":-1,"localId":"uuid-1","isLocal":true,"syncStatus":"pending","category":"grammar","correct_phrase":"went","mastery_level":0.2,"review_count":3}"#;

        b.iter(|| serde_json::from_str::<LocalKnowledgePoint>(black_box(json)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_store_operations,
    bench_migration,
    bench_serialization,
);
criterion_main!(benches);
