use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::{
    models::{DailyTask, MetricSample, Plan},
    store::PlanStore,
    types::MetricKind,
};

/// Minimum week-over-week weight change that produces a trend insight.
pub const TREND_THRESHOLD_KG: f64 = 0.3;
const EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub completed: u32,
    pub pending: u32,
    pub skipped: u32,
    pub rest: u32,
    /// completed / (completed + skipped) over workout days; 0 when none is decided.
    pub completion_rate: f64,
    pub streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tone {
    Info,
    Positive,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestedAction {
    StartWorkout,
    LogWeight,
    ReviewMeals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub tone: Tone,
    pub message: String,
    pub action: Option<SuggestedAction>,
}

impl Insight {
    fn new(tone: Tone, message: impl Into<String>, action: Option<SuggestedAction>) -> Self {
        Self {
            tone,
            message: message.into(),
            action,
        }
    }
}

/// Plan week (7-day block counted from the plan start) containing `today`.
pub fn week_window(plan: &Plan, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = (today - plan.start_date).num_days().max(0) as u64;
    let start = plan.start_date + Days::new(offset / 7 * 7);
    (start, start + Days::new(6))
}

/// Consecutive completed days walking back from `today`.
pub fn streak(plan: &Plan, today: NaiveDate) -> u32 {
    let mut count = 0;
    let mut day = today;
    while let Some(task) = plan.task_on(day) {
        if !task.is_completed || task.is_skipped {
            break;
        }
        count += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    count
}

pub fn weekly_summary(plan: &Plan, today: NaiveDate) -> WeeklySummary {
    let (week_start, week_end) = week_window(plan, today);
    let mut summary = WeeklySummary {
        week_start,
        week_end,
        completed: 0,
        pending: 0,
        skipped: 0,
        rest: 0,
        completion_rate: 0.0,
        streak: streak(plan, today),
    };

    for task in plan
        .tasks
        .iter()
        .filter(|t| t.date >= week_start && t.date <= week_end)
    {
        if task.is_rest_day() {
            summary.rest += 1;
        } else if task.is_completed {
            summary.completed += 1;
        } else if task.is_skipped {
            summary.skipped += 1;
        } else {
            summary.pending += 1;
        }
    }

    let decided = summary.completed + summary.skipped;
    if decided > 0 {
        summary.completion_rate = f64::from(summary.completed) / f64::from(decided);
    }
    summary
}

/// Latest weight minus the most recent weight at least a week older.
pub fn weight_trend(samples: &[MetricSample]) -> Option<f64> {
    let mut weights: Vec<&MetricSample> = samples
        .iter()
        .filter(|s| s.kind == MetricKind::Weight)
        .collect();
    weights.sort_by_key(|s| s.date);

    let latest = weights.last()?;
    let cutoff = latest.date.checked_sub_days(Days::new(7))?;
    let prior = weights.iter().rev().find(|s| s.date <= cutoff)?;
    Some(latest.value - prior.value)
}

/// Advice for the day: task state first, then meals, then weight trend.
pub fn build_insights(today: Option<&DailyTask>, weights: &[MetricSample]) -> Vec<Insight> {
    let mut out = Vec::new();

    match today {
        None => out.push(Insight::new(Tone::Info, "Nothing is scheduled for today.", None)),
        Some(task) if task.is_skipped => out.push(Insight::new(
            Tone::Info,
            "Today is skipped. Recover well and pick it up tomorrow.",
            None,
        )),
        Some(task) if task.is_rest_day() => {
            out.push(Insight::new(Tone::Info, "Rest day: let your muscles recover.", None))
        }
        Some(task) if task.is_completed => {
            out.push(Insight::new(Tone::Positive, "Today's training is done. Nice work!", None))
        }
        Some(task) => {
            let left = task.workouts.iter().filter(|w| !w.is_completed).count();
            out.push(Insight::new(
                Tone::Info,
                format!("{left} of {} workouts left today.", task.workouts.len()),
                Some(SuggestedAction::StartWorkout),
            ));
        }
    }

    if let Some(task) = today.filter(|t| !t.meals.is_empty()) {
        let done = task.meals_done();
        if done == task.meals.len() {
            out.push(Insight::new(Tone::Positive, "All meals logged for today.", None));
        } else {
            out.push(Insight::new(
                Tone::Info,
                format!("{done}/{} meals logged today.", task.meals.len()),
                Some(SuggestedAction::ReviewMeals),
            ));
        }
    }

    if !weights.iter().any(|s| s.kind == MetricKind::Weight) {
        out.push(Insight::new(
            Tone::Info,
            "No weight recorded yet. Log one to track your trend.",
            Some(SuggestedAction::LogWeight),
        ));
    } else if let Some(delta) = weight_trend(weights) {
        if delta >= TREND_THRESHOLD_KG - EPS {
            out.push(Insight::new(
                Tone::Warning,
                format!("Weight is up {delta:.1} kg over the last week. Review your meals."),
                Some(SuggestedAction::ReviewMeals),
            ));
        } else if delta <= -TREND_THRESHOLD_KG + EPS {
            out.push(Insight::new(
                Tone::Positive,
                format!("Weight is down {:.1} kg over the last week.", -delta),
                None,
            ));
        }
    }

    out
}

/// Task mutations that persist through the plan store.
/// A failed save is logged and reported as `false`; the in-memory change stays.
#[derive(Clone)]
pub struct ExecutionTracker {
    store: PlanStore,
}

impl ExecutionTracker {
    pub fn new(store: PlanStore) -> Self {
        Self { store }
    }

    pub async fn mark_task(&self, task: &mut DailyTask, completed: bool) -> bool {
        task.set_completed(completed);
        self.persist(task).await
    }

    pub async fn toggle_skip(&self, task: &mut DailyTask) -> bool {
        task.toggle_skip();
        self.persist(task).await
    }

    pub async fn toggle_workout_completion(&self, task: &mut DailyTask, index: usize) -> bool {
        if task.toggle_workout(index).is_none() {
            return false;
        }
        self.persist(task).await
    }

    pub async fn toggle_meal(&self, task: &mut DailyTask, index: usize) -> bool {
        if task.toggle_meal(index).is_none() {
            return false;
        }
        self.persist(task).await
    }

    async fn persist(&self, task: &DailyTask) -> bool {
        match self.store.save_task(task).await {
            Ok(()) => true,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "failed to save task");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        models::{Meal, PlanGoal, Workout, new_id},
        types::{FitnessGoal, MealKind, PlanStatus, WorkoutType},
    };

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn task(day: u32, workouts: usize) -> DailyTask {
        let mut t = DailyTask::new(d(day));
        for i in 0..workouts {
            t.workouts.push(Workout::new(format!("w{i}"), WorkoutType::Cardio));
        }
        t
    }

    fn plan(tasks: Vec<DailyTask>) -> Plan {
        Plan {
            id: new_id(),
            name: "test".into(),
            goal: PlanGoal {
                goal: FitnessGoal::FatLoss,
                start_weight: 72.0,
                target_weight: 68.0,
                start_date: d(1),
                target_date: None,
                professional: false,
            },
            start_date: d(1),
            duration_days: tasks.len() as u32,
            status: PlanStatus::Active,
            tasks,
        }
    }

    fn weight(day: u32, value: f64) -> MetricSample {
        MetricSample {
            date: d(day),
            kind: MetricKind::Weight,
            value,
        }
    }

    #[test]
    fn summary_counts_workout_days_in_plan_week() {
        let mut tasks: Vec<DailyTask> = (1..=14).map(|day| task(day, if day % 2 == 1 { 1 } else { 0 })).collect();
        tasks[0].set_completed(true); // day 1
        tasks[2].toggle_skip(); // day 3
        tasks[4].set_completed(true); // day 5
        tasks[8].set_completed(true); // day 9, next week
        let p = plan(tasks);

        let s = weekly_summary(&p, d(6));
        assert_eq!((s.week_start, s.week_end), (d(1), d(7)));
        assert_eq!(s.completed, 2);
        assert_eq!(s.skipped, 1);
        assert_eq!(s.pending, 1);
        assert_eq!(s.rest, 3);
        assert!((s.completion_rate - 2.0 / 3.0).abs() < 1e-9);

        assert_eq!(week_window(&p, d(9)), (d(8), d(14)));
        assert_eq!(week_window(&p, d(1) - Days::new(3)), (d(1), d(7)));
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let mut tasks: Vec<DailyTask> = (1..=6).map(|day| task(day, 1)).collect();
        for t in &mut tasks[1..5] {
            t.set_completed(true);
        }
        let p = plan(tasks);

        assert_eq!(streak(&p, d(5)), 4);
        assert_eq!(streak(&p, d(6)), 0);
        assert_eq!(streak(&p, d(3)), 2);
        assert_eq!(weekly_summary(&p, d(5)).streak, 4);
    }

    #[test]
    fn weight_trend_uses_sample_a_week_older() {
        let samples = vec![weight(1, 71.0), weight(3, 70.0), weight(9, 70.3), weight(10, 70.4)];
        // Latest is day 10; most recent at or before day 3 is 70.0.
        let delta = weight_trend(&samples).unwrap();
        assert!((delta - 0.4).abs() < 1e-9);
        assert_eq!(weight_trend(&[weight(5, 70.0), weight(9, 69.0)]), None);
    }

    #[test]
    fn insights_cover_task_meals_and_trend() {
        let mut t = task(10, 2);
        t.meals.push(Meal {
            id: new_id(),
            name: "Lunch".into(),
            kind: MealKind::Lunch,
            calories: 600,
            is_completed: false,
        });
        t.toggle_workout(0);

        let gained = vec![weight(3, 70.0), weight(10, 70.3)];
        let out = build_insights(Some(&t), &gained);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].action, Some(SuggestedAction::StartWorkout));
        assert!(out[0].message.starts_with("1 of 2"));
        assert_eq!(out[1].action, Some(SuggestedAction::ReviewMeals));
        assert_eq!(out[2].tone, Tone::Warning);

        let lost = vec![weight(3, 70.0), weight(10, 69.6)];
        let out = build_insights(None, &lost);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].tone, Tone::Positive);

        let flat = vec![weight(3, 70.0), weight(10, 70.1)];
        assert_eq!(build_insights(None, &flat).len(), 1);

        let out = build_insights(None, &[]);
        assert_eq!(out[1].action, Some(SuggestedAction::LogWeight));
    }

    #[test]
    fn skipped_and_rest_days_get_their_own_message() {
        let mut skipped = task(1, 1);
        skipped.toggle_skip();
        let out = build_insights(Some(&skipped), &[weight(1, 70.0)]);
        assert_eq!(out.len(), 1);
        assert!(out[0].message.contains("skipped"));

        let rest = task(2, 0);
        assert!(build_insights(Some(&rest), &[weight(1, 70.0)])[0].message.starts_with("Rest day"));
    }

    #[tokio::test]
    async fn tracker_persists_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlanStore::new(db::open(&dir.path().join("t.db")).await.unwrap());
        let mut p = plan(vec![task(1, 2), task(2, 0)]);
        store.set_active_plan(&mut p).await.unwrap();

        let tracker = ExecutionTracker::new(store.clone());
        let mut t = p.tasks[0].clone();
        t.workouts[0].is_completed = true;
        t.workouts[1].is_completed = true;

        assert!(tracker.toggle_skip(&mut t).await);
        let loaded = store.find_task(&t.id).await.unwrap().unwrap();
        assert!(loaded.is_skipped && !loaded.is_completed);
        assert!(loaded.workouts.iter().all(|w| !w.is_completed));

        assert!(tracker.toggle_workout_completion(&mut t, 0).await);
        assert!(tracker.toggle_workout_completion(&mut t, 1).await);
        let loaded = store.find_task(&t.id).await.unwrap().unwrap();
        assert!(loaded.is_completed && !loaded.is_skipped);

        assert!(!tracker.toggle_workout_completion(&mut t, 9).await);

        let mut ghost = task(3, 1);
        assert!(!tracker.mark_task(&mut ghost, true).await);
        assert!(ghost.is_completed);
    }
}
