use chrono::{Days, NaiveDate};
use stamina::{
    catalog::Catalog,
    db,
    generator::PlanGenerator,
    goal::{GoalProgressEvaluator, GoalStatus, resolved_start_weight},
    metrics::{MetricProvider, SqliteMetrics},
    models::{PlanGoal, UserProfile},
    session::{DEFAULT_REST_SECONDS, LiveSession, SessionState, SnapshotStore, recovery},
    store::PlanStore,
    tracker::{ExecutionTracker, weekly_summary},
    types::{Difficulty, FitnessGoal, MetricKind, PlanStatus, Sex, WorkoutLocation},
};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
}

fn profile() -> UserProfile {
    UserProfile {
        name: "Jo".into(),
        sex: Sex::Unspecified,
        age: 33,
        height_cm: 170.0,
        weight_kg: 72.0,
        experience: Difficulty::Beginner,
        location: WorkoutLocation::Gym,
        equipment: Vec::new(),
        health_conditions: Vec::new(),
    }
}

fn goal() -> PlanGoal {
    PlanGoal {
        goal: FitnessGoal::FatLoss,
        start_weight: 72.0,
        target_weight: 68.0,
        start_date: start(),
        target_date: start().checked_add_days(Days::new(60)),
        professional: false,
    }
}

#[tokio::test]
async fn generate_track_run_and_resume() {
    let dir = tempfile::tempdir().unwrap();
    let pool = db::open(&dir.path().join("stamina.db")).await.unwrap();
    let store = PlanStore::new(pool.clone());
    let metrics = SqliteMetrics::new(pool);
    let snaps = SnapshotStore::new(dir.path());
    let catalog = Catalog::bundled().unwrap();

    // two generations leave exactly one active plan
    for seed in [1, 2] {
        let mut plan = PlanGenerator::seeded(&catalog, seed)
            .generate(&profile(), goal(), 30)
            .unwrap();
        store.set_active_plan(&mut plan).await.unwrap();
    }
    assert_eq!(store.count_by_status(PlanStatus::Active).await.unwrap(), 1);
    assert_eq!(store.count_by_status(PlanStatus::Archived).await.unwrap(), 1);

    let mut plan = store.active_plan().await.unwrap().unwrap();
    let workout_days: Vec<_> = plan.tasks.iter().filter(|t| !t.is_rest_day()).collect();
    assert_eq!(workout_days.len(), 3);

    // skip day 3 through the tracker
    let tracker = ExecutionTracker::new(store.clone());
    let mut day3 = plan.tasks[2].clone();
    assert!(tracker.toggle_skip(&mut day3).await);

    // day 1: run a session, pause it, resume, finish
    let day1 = plan.tasks[0].clone();
    let mut s = LiveSession::new(day1.clone(), store.clone(), snaps.clone(), DEFAULT_REST_SECONDS);
    s.start_workout();
    s.complete_set(0);
    assert!(s.save_state());
    drop(s);

    let mut s = recovery::resume(&store, &snaps, DEFAULT_REST_SECONDS)
        .await
        .unwrap()
        .unwrap();
    assert!(s.current().sets[0].is_completed);
    while s.next_exercise() {}
    let written = s.end_workout().await;
    assert_eq!(written.len(), day1.workouts.len());
    assert_eq!(s.state(), SessionState::Ended);
    assert!(!snaps.exists());

    plan = store.active_plan().await.unwrap().unwrap();
    assert!(plan.tasks[0].is_completed);
    assert!(plan.tasks[2].is_skipped);

    let summary = weekly_summary(&plan, start().checked_add_days(Days::new(4)).unwrap());
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.pending, 1);

    // weight readings drive the goal evaluation
    metrics.record(MetricKind::Weight, start(), 72.0).await.unwrap();
    let today = start().checked_add_days(Days::new(30)).unwrap();
    metrics.record(MetricKind::Weight, today, 70.0).await.unwrap();

    let history = metrics.samples(MetricKind::Weight, start(), today).await.unwrap();
    let baseline = resolved_start_weight(&plan.goal, &history);
    let current = metrics.latest(MetricKind::Weight, today).await.unwrap().map(|s| s.value);

    let eval = GoalProgressEvaluator::default().evaluate(&plan.goal, baseline, current, today);
    assert!((eval.progress - 0.5).abs() < 1e-9);
    assert_eq!(eval.status, GoalStatus::OnTrack);
}

#[tokio::test]
async fn snapshot_for_a_deleted_plan_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let store = PlanStore::new(db::open(&dir.path().join("stamina.db")).await.unwrap());
    let snaps = SnapshotStore::new(dir.path());
    let catalog = Catalog::bundled().unwrap();

    let mut plan = PlanGenerator::seeded(&catalog, 5)
        .generate(&profile(), goal(), 7)
        .unwrap();
    store.set_active_plan(&mut plan).await.unwrap();

    let mut s = LiveSession::new(plan.tasks[0].clone(), store.clone(), snaps.clone(), DEFAULT_REST_SECONDS);
    s.start_workout();
    assert!(s.save_state());
    drop(s);

    store.delete_plan(&plan.id).await.unwrap();
    assert!(recovery::resume(&store, &snaps, DEFAULT_REST_SECONDS).await.unwrap().is_none());
    assert!(!snaps.exists());
}
