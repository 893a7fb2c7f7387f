use anyhow::{Result, bail};
use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use screendle_core::{
    AssignmentStore, BatchOptions, CandidateMovie, ClassicAssignment, DateSpan, FallbackLevel, Horizon,
    MemoryStore, OnlineFallback, PoolProvider, SaltTable, ScalesRound, ScheduleError, commit, plan_batch,
    run_batch,
};
use std::collections::{BTreeMap, HashSet};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Catalog with `n` rated movies plus a few unrated ones mixed in.
fn catalog(n: usize) -> Vec<CandidateMovie> {
    let mut out = Vec::new();
    for i in 0..n {
        let rating = 4.0 + ((i * 37) % 55) as f64 / 10.0;
        out.push(
            CandidateMovie::new(1000 + i as i64 * 7, rating)
                .with_catalog_id(i as i64 + 1)
                .with_title(format!("Movie {i}")),
        );
    }
    out.push(CandidateMovie::new(1, 0.0).with_catalog_id(9_001));
    let mut unrated = CandidateMovie::new(2, 1.0).with_catalog_id(9_002);
    unrated.rating = None;
    out.push(unrated);
    out
}

fn options(start: NaiveDate, days: u32, lookback: u32) -> BatchOptions {
    BatchOptions::new(Horizon::new(start).with_days(days).with_lookback(lookback))
}

/// Store whose reads can be made to fail.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_pool: bool,
    fail_classic: bool,
    /// Classic reads touching a day before this date fail.
    fail_classic_before: Option<NaiveDate>,
    fail_writes: bool,
}

impl PoolProvider for FlakyStore {
    fn eligible_pool(&self) -> Result<Vec<CandidateMovie>> {
        if self.fail_pool {
            bail!("catalog offline");
        }
        self.inner.eligible_pool()
    }
}

impl AssignmentStore for FlakyStore {
    fn classic_in(&self, span: DateSpan) -> Result<Vec<ClassicAssignment>> {
        if self.fail_classic || self.fail_classic_before.is_some_and(|cut| span.start < cut) {
            bail!("classic table offline");
        }
        self.inner.classic_in(span)
    }

    fn scales_in(&self, span: DateSpan) -> Result<Vec<ScalesRound>> {
        self.inner.scales_in(span)
    }

    fn insert_classic(&mut self, assignment: ClassicAssignment) -> Result<bool> {
        if self.fail_writes {
            bail!("read-only");
        }
        self.inner.insert_classic(assignment)
    }

    fn insert_scales(&mut self, round: ScalesRound) -> Result<bool> {
        if self.fail_writes {
            bail!("read-only");
        }
        self.inner.insert_scales(round)
    }
}

#[test]
fn test_batch_fills_horizon_and_is_idempotent() {
    let mut store = MemoryStore::new(catalog(300));
    let opts = options(d(2025, 3, 1), 60, 180);

    let (plan, summary) = run_batch(&mut store, &opts).unwrap();
    assert_eq!(plan.eligible, 300);
    assert_eq!(plan.classic.assignments.len(), 60);
    assert_eq!(plan.scales.rounds.len(), 600);
    assert_eq!(summary.classic_written, 60);
    assert_eq!(summary.scales_written, 600);
    assert_eq!(summary.classic_ignored + summary.scales_ignored, 0);

    let snapshot_classic = store.classic.clone();
    let snapshot_scales = store.scales.clone();

    let again = plan_batch(&store, &opts).unwrap();
    assert!(again.is_empty());
    assert_eq!(again.classic.skipped, 60);
    assert_eq!(again.scales.skipped, 60);

    commit(&mut store, &again).unwrap();
    assert_eq!(store.classic, snapshot_classic);
    assert_eq!(store.scales, snapshot_scales);
}

#[test]
fn test_plan_is_deterministic() {
    let store = MemoryStore::new(catalog(120));
    let opts = options(d(2025, 12, 20), 30, 45);
    let a = plan_batch(&store, &opts).unwrap();
    let b = plan_batch(&store, &opts).unwrap();
    assert_eq!(a.classic.assignments, b.classic.assignments);
    assert_eq!(a.scales.rounds, b.scales.rounds);
}

#[test]
fn test_partial_run_is_a_prefix_of_full_run() {
    let full_store = MemoryStore::new(catalog(150));
    let full = plan_batch(&full_store, &options(d(2025, 6, 1), 40, 30)).unwrap();

    // First run covers 15 days and is persisted, then the full horizon.
    let mut store = MemoryStore::new(catalog(150));
    run_batch(&mut store, &options(d(2025, 6, 1), 15, 30)).unwrap();
    let rest = plan_batch(&store, &options(d(2025, 6, 1), 40, 30)).unwrap();
    assert_eq!(rest.classic.assignments.len(), 25);
    commit(&mut store, &rest).unwrap();

    let merged: Vec<_> = store.classic.values().copied().collect();
    assert_eq!(merged, full.classic.assignments);
    let merged_scales: Vec<_> = store.scales.values().copied().collect();
    assert_eq!(merged_scales, full.scales.rounds);
}

#[test]
fn test_no_repeats_across_persisted_history() {
    let lookback = 50;
    let mut store = MemoryStore::new(catalog(80));
    run_batch(&mut store, &options(d(2025, 1, 1), 45, lookback)).unwrap();
    run_batch(&mut store, &options(d(2025, 2, 15), 60, lookback)).unwrap();

    let days: Vec<ClassicAssignment> = store.classic.values().copied().collect();
    assert_eq!(days.len(), 105);
    for (i, a) in days.iter().enumerate() {
        let lo = i.saturating_sub(lookback as usize);
        let recent: HashSet<_> = days[lo..i].iter().map(|p| p.movie).collect();
        assert!(!recent.contains(&a.movie), "{} repeats inside lookback", a.date);
    }
}

#[test]
fn test_gap_fill_avoids_movies_persisted_later() {
    let lookback = 30;
    let start = d(2025, 3, 1);
    let fresh = plan_batch(&MemoryStore::new(catalog(40)), &options(start, 15, lookback)).unwrap();
    let taken = fresh.classic.assignments.iter().find(|a| a.date == d(2025, 3, 8)).unwrap().movie;

    // Hand-scheduled inside the horizon, then just past its end.
    for later in [d(2025, 3, 10), d(2025, 3, 20)] {
        let mut store =
            MemoryStore::new(catalog(40)).with_classic([ClassicAssignment { date: later, movie: taken }]);
        let (plan, _) = run_batch(&mut store, &options(start, 15, lookback)).unwrap();
        assert!(plan.classic.exhausted.is_empty());

        let days: Vec<ClassicAssignment> = store.classic.values().copied().collect();
        let on: Vec<NaiveDate> = days.iter().filter(|a| a.movie == taken).map(|a| a.date).collect();
        assert_eq!(on, vec![later]);
        for (i, a) in days.iter().enumerate() {
            for b in &days[i + 1..] {
                let apart = (b.date - a.date).num_days();
                assert!(apart > lookback as i64 || a.movie != b.movie, "{} and {} share a movie", a.date, b.date);
            }
        }
    }
}

#[test]
fn test_scales_properties_hold_for_every_day() {
    let store = MemoryStore::new(catalog(60));
    let pool = store.eligible_pool().unwrap();
    let rating: BTreeMap<i64, f64> = pool.iter().map(|m| (m.external_id, m.rating_value())).collect();

    let plan = plan_batch(&store, &options(d(2024, 2, 20), 20, 0)).unwrap();
    let mut by_day: BTreeMap<NaiveDate, Vec<ScalesRound>> = BTreeMap::new();
    for r in &plan.scales.rounds {
        by_day.entry(r.date).or_default().push(*r);
    }
    assert_eq!(by_day.len(), 20);
    assert!(by_day.contains_key(&d(2024, 2, 29)));

    for rounds in by_day.values() {
        let numbers: Vec<u8> = rounds.iter().map(|r| r.round).collect();
        assert_eq!(numbers, (1..=10).collect::<Vec<u8>>());
        let gaps: Vec<f64> = rounds
            .iter()
            .map(|r| (rating[&r.movie_a] - rating[&r.movie_b]).abs())
            .collect();
        assert!(gaps.windows(2).all(|w| w[0] >= w[1]), "gaps not descending: {gaps:?}");
    }
}

#[test]
fn test_insufficient_pool_aborts_before_writing() {
    let mut store = MemoryStore::new(catalog(19));
    let err = run_batch(&mut store, &options(d(2025, 3, 1), 10, 5)).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ScheduleError>(),
        Some(&ScheduleError::InsufficientPool { available: 19, required: 20 })
    );
    assert!(store.classic.is_empty());
    assert!(store.scales.is_empty());
}

#[test]
fn test_exhaustion_is_reported_and_limit_enforced() {
    let store = MemoryStore::new(catalog(20));
    let plan = plan_batch(&store, &options(d(2025, 3, 1), 30, 25)).unwrap();
    assert_eq!(plan.classic.assignments.len(), 30);
    assert!(!plan.classic.exhausted.is_empty());

    let mut opts = options(d(2025, 3, 1), 30, 25);
    opts.max_exhausted_days = Some(0);
    let err = plan_batch(&store, &opts).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ScheduleError>(),
        Some(ScheduleError::ExhaustionLimit { limit: 0, .. })
    ));
}

#[test]
fn test_single_day_already_assigned_writes_nothing() {
    let start = d(2025, 3, 7);
    let mut store = MemoryStore::new(catalog(40));
    run_batch(&mut store, &options(start, 1, 0)).unwrap();

    let plan = plan_batch(&store, &options(start, 1, 0)).unwrap();
    assert!(plan.is_empty());
    let summary = commit(&mut store, &plan).unwrap();
    assert_eq!(summary.classic_written + summary.scales_written, 0);
}

#[test]
fn test_bad_inputs_are_rejected() {
    let store = MemoryStore::new(catalog(40));
    let err = plan_batch(&store, &options(d(2025, 3, 7), 0, 10)).unwrap_err();
    assert!(matches!(err.downcast_ref::<ScheduleError>(), Some(ScheduleError::InvalidHorizon(_))));

    let mut opts = options(d(2025, 3, 7), 5, 10);
    opts.salts = SaltTable { scales_round: opts.salts.classic, ..SaltTable::default() };
    let err = plan_batch(&store, &opts).unwrap_err();
    assert!(matches!(err.downcast_ref::<ScheduleError>(), Some(ScheduleError::SaltCollision { .. })));
}

#[test]
fn test_store_failures_are_fatal_for_batch() {
    let mut store = FlakyStore { inner: MemoryStore::new(catalog(40)), fail_classic: true, ..FlakyStore::default() };
    assert!(plan_batch(&store, &options(d(2025, 3, 7), 5, 10)).is_err());

    store.fail_classic = false;
    store.fail_writes = true;
    let err = run_batch(&mut store, &options(d(2025, 3, 7), 5, 10)).unwrap_err();
    assert!(format!("{err:#}").contains("read-only"));
}

#[test]
fn test_fallback_matches_batch() {
    let lookback = 30;
    let salts = SaltTable::default();
    let fallback = OnlineFallback::new(lookback, salts);
    let mut rng = StdRng::seed_from_u64(1);

    // Persist history up to the 20th, then ask for the 21st on demand.
    let mut store = MemoryStore::new(catalog(90));
    run_batch(&mut store, &options(d(2025, 4, 1), 20, lookback)).unwrap();
    let today = d(2025, 4, 21);

    let classic = fallback.classic(&store, today, &mut rng);
    let scales = fallback.scales(&store, today);
    assert_eq!(classic.level, FallbackLevel::Recomputed);
    assert_eq!(scales.level, FallbackLevel::Recomputed);

    let batch = plan_batch(&store, &options(today, 1, lookback)).unwrap();
    assert_eq!(classic.movie, batch.classic.assignments[0].movie);
    assert_eq!(scales.rounds, batch.scales.rounds);

    // Once the batch result is persisted the fallback reads it back.
    commit(&mut store, &batch).unwrap();
    assert_eq!(fallback.classic(&store, today, &mut rng).level, FallbackLevel::Persisted);
    let persisted = fallback.scales(&store, today);
    assert_eq!(persisted.level, FallbackLevel::Persisted);
    assert_eq!(persisted.rounds, batch.scales.rounds);
}

#[test]
fn test_fallback_degrades_step_by_step() {
    let salts = SaltTable::default();
    let fallback = OnlineFallback::new(30, salts);
    let mut rng = StdRng::seed_from_u64(2);
    let today = d(2025, 4, 21);

    // History unreadable but today's own row readable: unconditioned seeded pick.
    let store = FlakyStore {
        inner: MemoryStore::new(catalog(50)),
        fail_classic_before: Some(today),
        ..FlakyStore::default()
    };
    let classic = fallback.classic(&store, today, &mut rng);
    assert_eq!(classic.level, FallbackLevel::RecomputedWithoutHistory);
    let pool = store.inner.eligible_pool().unwrap();
    let expected = screendle_core::ClassicScheduler::new(&pool, &salts)
        .pick_unconditioned(today)
        .unwrap();
    assert_eq!(classic.movie, expected.movie.external_id);

    // Catalog unreadable: curated uniform pick for Classic, curated pairs for Scales.
    let store = FlakyStore { inner: MemoryStore::new(catalog(50)), fail_pool: true, ..FlakyStore::default() };
    let classic = fallback.classic(&store, today, &mut rng);
    assert_eq!(classic.level, FallbackLevel::UniformRandom);
    assert!(screendle_core::fallback::CURATED_FALLBACK.contains(&classic.movie));
    let scales = fallback.scales(&store, today);
    assert_eq!(scales.level, FallbackLevel::Curated);
    assert_eq!(scales.rounds.len(), 10);
}

#[test]
fn test_scales_fallback_with_short_pool() {
    let fallback = OnlineFallback::new(0, SaltTable::default());
    let store = MemoryStore::new(catalog(13));
    let scales = fallback.scales(&store, d(2025, 4, 21));
    assert_eq!(scales.level, FallbackLevel::ShortPool);
    assert_eq!(scales.rounds.len(), 6);
    let numbers: Vec<u8> = scales.rounds.iter().map(|r| r.round).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
}
