use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use transfer_lab::config::ProjectorConfig;
use transfer_lab::dummy::{DEFAULT_SEED, dummy_training_rows, generate_dummy_dataset};
use transfer_lab::position::map_position;
use transfer_lab::projector::project;
use transfer_lab::ratings::{RatingTable, TeamRatingRecord, team_rating_records_from_reader};
use transfer_lab::regression::{ModelKind, fit, predict};
use transfer_lab::PositionGroup;

const RAW_POSITIONS: &[&str] = &[
    "GK", "CB, RCB", "LB", "DMF", "RCMF, DMF", "AMF", "LW", "CF", "Striker", "Defenders", "",
];

fn sample_table() -> RatingTable {
    let mut records = team_rating_records_from_reader(TEAM_RATINGS_CSV.as_bytes()).unwrap();
    records.extend((0..500).map(|i| TeamRatingRecord {
        team: format!("Team {i}"),
        rating: 40.0 + (i % 60) as f64,
        league_id: None,
    }));
    RatingTable::from_records(&records, &ProjectorConfig::default())
}

fn bench_map_position(c: &mut Criterion) {
    c.bench_function("map_position", |b| {
        b.iter(|| {
            for raw in RAW_POSITIONS {
                black_box(map_position(black_box(raw)));
            }
        })
    });
}

fn bench_rating_lookup(c: &mut Criterion) {
    let table = sample_table();
    c.bench_function("rating_lookup", |b| {
        b.iter(|| {
            black_box(table.get_rating(black_box("Team 321")));
            black_box(table.get_rating(black_box("Manchester City")));
            black_box(table.get_rating(black_box("Unknown FC")));
        })
    });
}

fn bench_project(c: &mut Criterion) {
    let cfg = ProjectorConfig::default();
    c.bench_function("project", |b| {
        b.iter(|| {
            let out = project(
                black_box(0.5),
                black_box(70.0),
                black_box(90.0),
                PositionGroup::Forward,
                &cfg,
            )
            .unwrap();
            black_box(out);
        })
    });
}

fn bench_fit(c: &mut Criterion) {
    let rows = dummy_training_rows(&generate_dummy_dataset(2000, DEFAULT_SEED).unwrap());
    c.bench_function("fit_ridge", |b| {
        b.iter(|| {
            let model = fit(black_box(&rows), ModelKind::Ridge).unwrap();
            black_box(predict(&model, 0.4, 25, PositionGroup::Midfielder).unwrap());
        })
    });

    let small = &rows[..400];
    let mut group = c.benchmark_group("fit_gradient_boosted");
    group.sample_size(10);
    group.bench_function("400_rows", |b| {
        b.iter(|| {
            let model = fit(black_box(small), ModelKind::GradientBoosted).unwrap();
            black_box(model.train_samples());
        })
    });
    group.finish();
}

criterion_group!(
    perf,
    bench_map_position,
    bench_rating_lookup,
    bench_project,
    bench_fit
);
criterion_main!(perf);

static TEAM_RATINGS_CSV: &str = include_str!("../tests/fixtures/team_ratings.csv");
