/// Benchmark module for review statistics.
/// Measures collaboration graph construction, highlight ladders and session caching.
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reviewstats::analysis::{CollaborationGraphBuilder, InclusionSet, OverviewMetric, PercentileHighlighter};
use reviewstats::types::{Identity, OverviewRecord, ReviewData, ReviewerEntry};
use reviewstats::{Dashboard, ReviewStatsConfig};

const POPULATION_SIZE: usize = 1000;
const REVIEWERS_PER_CONTRIBUTOR: usize = 12;

fn identity(idx: usize) -> Identity {
    Identity {
        identifier: format!("user{idx}"),
        name: format!("User {idx}"),
        username: format!("user{idx}"),
        email: format!("user{idx}@example.com"),
    }
}

/// Set up a population where every contributor has a handful of random reviewers
///
/// # Returns
/// * `Vec<OverviewRecord>` - Contributors with reviewer lists and random counts
fn setup_population() -> Vec<OverviewRecord> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..POPULATION_SIZE)
        .map(|idx| OverviewRecord {
            identifier: format!("user{idx}"),
            identity: identity(idx),
            commit_count: rng.gen_range(0..500),
            review_count_plus2: rng.gen_range(0..300),
            all_comments_received: rng.gen_range(0..2000),
            received_comment_ratio: rng.gen_range(0.0..10.0),
            my_reviewer_list: (0..REVIEWERS_PER_CONTRIBUTOR)
                .map(|_| {
                    let approvals = rng.gen_range(0..50);
                    ReviewerEntry {
                        identity: identity(rng.gen_range(0..POPULATION_SIZE)),
                        review_data: Some(ReviewData {
                            added_as_reviewer_count: approvals,
                            approval_count: approvals,
                        }),
                        ..Default::default()
                    }
                })
                .collect(),
            ..Default::default()
        })
        .collect()
}

/// Benchmark graph construction for the full population and a half selection
///
/// # Arguments
/// * `c` - Criterion benchmark configuration
fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("collaboration_graph");
    let population = setup_population();
    let everyone = InclusionSet::all_of(&population);
    let half: InclusionSet = population
        .iter()
        .step_by(2)
        .map(|record| record.identifier.clone())
        .collect();
    let builder = CollaborationGraphBuilder::default();

    group.bench_function("build_all_selected", |b| {
        b.iter(|| builder.build(black_box(&population), black_box(&everyone)).unwrap())
    });

    group.bench_function("build_half_selected", |b| {
        b.iter(|| builder.build(black_box(&population), black_box(&half)).unwrap())
    });

    group.finish();
}

/// Benchmark highlight ladder derivation and tier lookups
///
/// # Arguments
/// * `c` - Criterion benchmark configuration
fn bench_highlighting(c: &mut Criterion) {
    let mut group = c.benchmark_group("highlighting");
    let population = setup_population();
    let everyone = InclusionSet::all_of(&population);

    for metric in [
        OverviewMetric::CommitCount,
        OverviewMetric::ReviewCountPlus2,
        OverviewMetric::ReceivedCommentRatio,
    ] {
        group.bench_function(format!("tiers_{}", metric.key()), |b| {
            b.iter(|| {
                PercentileHighlighter::for_table(&population, &everyone, metric, Default::default()).tiers()
            })
        });
    }

    group.finish();
}

/// Benchmark cached graph lookups in a session
///
/// # Arguments
/// * `c` - Criterion benchmark configuration
fn bench_caching(c: &mut Criterion) {
    let mut group = c.benchmark_group("caching");
    let mut dashboard = Dashboard::new(setup_population(), ReviewStatsConfig::default());

    // Pre-populate cache
    dashboard.collaboration_graph().unwrap();

    group.bench_function("graph_cache_lookup", |b| {
        b.iter(|| dashboard.collaboration_graph().unwrap().links.len())
    });

    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_graph, bench_highlighting, bench_caching
);
criterion_main!(benches);
