use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    models::{DailyTask, Workout, WorkoutSet},
    store::PlanStore,
    types::WorkoutType,
};

use super::{
    snapshot::{ExerciseProgress, SessionSnapshot, SnapshotStore},
    timer::{Countdown, Stopwatch},
};

pub const DEFAULT_REST_SECONDS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Running,
    Ended,
}

/// Guided execution of one day's workouts.
///
/// Progress lives in memory until `end_workout` writes it back through the
/// plan store. Only exercises the user actually visited are written.
pub struct LiveSession {
    task: DailyTask,
    plans: PlanStore,
    snapshots: SnapshotStore,
    rest_period: u32,

    state: SessionState,
    index: usize,
    current: ExerciseProgress,
    touched: bool,
    progress: BTreeMap<usize, ExerciseProgress>,

    clock: Stopwatch,
    rest: Countdown,
}

impl LiveSession {
    pub fn new(task: DailyTask, plans: PlanStore, snapshots: SnapshotStore, rest_period: u32) -> Self {
        Self {
            task,
            plans,
            snapshots,
            rest_period,
            state: SessionState::NotStarted,
            index: 0,
            current: ExerciseProgress::default(),
            touched: false,
            progress: BTreeMap::new(),
            clock: Stopwatch::default(),
            rest: Countdown::default(),
        }
    }

    /* ───────────────────────────── accessors ──────────────────────────── */

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn task(&self) -> &DailyTask {
        &self.task
    }

    pub fn exercise_index(&self) -> usize {
        self.index
    }

    pub fn current_workout(&self) -> Option<&Workout> {
        self.task.workouts.get(self.index)
    }

    pub fn current(&self) -> &ExerciseProgress {
        &self.current
    }

    pub fn progress(&self) -> &BTreeMap<usize, ExerciseProgress> {
        &self.progress
    }

    /// First set not yet completed, if any.
    pub fn current_set_index(&self) -> Option<usize> {
        self.current.sets.iter().position(|s| !s.is_completed)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.clock.elapsed()
    }

    pub fn rest_remaining(&self) -> u32 {
        self.rest.remaining()
    }

    pub fn is_last_exercise(&self) -> bool {
        self.index + 1 >= self.task.workouts.len()
    }

    /* ───────────────────────────── lifecycle ──────────────────────────── */

    /// Start from the first exercise with a zeroed clock.
    pub fn start_workout(&mut self) {
        self.progress.clear();
        self.index = 0;
        self.load_exercise(0);
        self.rest.cancel();
        self.clock.set_elapsed(0);
        self.clock.start();
        self.state = SessionState::Running;
        info!(task_id = %self.task.id, exercises = self.task.workouts.len(), "session started");
    }

    fn load_exercise(&mut self, index: usize) {
        let sets = match self.task.workouts.get(index) {
            Some(w) if !w.sets.is_empty() => w.sets.clone(),
            Some(w) if w.kind == WorkoutType::Strength => WorkoutSet::default_template(),
            _ => Vec::new(),
        };
        self.current = ExerciseProgress {
            sets,
            ..Default::default()
        };
        self.touched = false;
    }

    fn capture(&mut self) {
        if self.index < self.task.workouts.len() {
            self.progress.insert(self.index, self.current.clone());
        }
    }

    /// Toggle one set of the open exercise. Completing a set starts the rest
    /// countdown; un-completing one cancels it.
    pub fn complete_set(&mut self, set_index: usize) -> Option<bool> {
        let set = self.current.sets.get_mut(set_index)?;
        set.is_completed = !set.is_completed;
        let done = set.is_completed;
        self.touched = true;

        if done {
            self.rest.start(self.rest_period);
        } else {
            self.rest.cancel();
        }
        debug!(set_index, done, "set toggled");
        Some(done)
    }

    pub fn update_set(&mut self, set_index: usize, reps: u32, weight: Option<f64>) -> bool {
        let Some(set) = self.current.sets.get_mut(set_index) else {
            return false;
        };
        set.reps = reps;
        set.weight = weight;
        self.touched = true;
        true
    }

    /// Append a set copying the previous one's reps and weight.
    pub fn add_set(&mut self) -> usize {
        let next = self
            .current
            .sets
            .last()
            .map(|s| WorkoutSet::planned(s.reps, s.weight))
            .unwrap_or_else(|| WorkoutSet::planned(10, Some(0.0)));
        self.current.sets.push(next);
        self.touched = true;
        self.current.sets.len() - 1
    }

    pub fn set_distance(&mut self, km: f64) {
        self.current.distance_km = Some(km);
        self.touched = true;
    }

    pub fn set_duration(&mut self, minutes: u32) {
        self.current.duration_minutes = Some(minutes);
        self.touched = true;
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.current.notes = notes.into();
        self.touched = true;
    }

    /// Record the open exercise and move on. Returns false on the last one;
    /// the session keeps running until `end_workout`.
    pub fn next_exercise(&mut self) -> bool {
        self.capture();
        if self.is_last_exercise() {
            return false;
        }
        self.index += 1;
        self.load_exercise(self.index);
        self.rest.cancel();
        true
    }

    /// Stop the clock and write every visited exercise back as completed.
    ///
    /// On a failed write nothing is lost: in-memory progress stays put and
    /// the caller may call this again.
    pub async fn end_workout(&mut self) -> Vec<Workout> {
        self.clock.stop();
        self.rest.cancel();
        if self.touched {
            self.capture();
        }

        let mut task = self.task.clone();
        let mut updated = Vec::with_capacity(self.progress.len());
        for (&i, p) in &self.progress {
            let Some(w) = task.workouts.get_mut(i) else {
                continue;
            };
            w.is_completed = true;
            w.sets = p.sets.clone();
            if p.distance_km.is_some() {
                w.distance_km = p.distance_km;
            }
            if p.duration_minutes.is_some() {
                w.duration_minutes = p.duration_minutes;
            }
            if !p.notes.is_empty() {
                w.notes = p.notes.clone();
            }
            updated.push(w.clone());
        }

        if task.all_workouts_done() {
            task.set_completed(true);
        }

        if let Err(e) = self.plans.save_task(&task).await {
            warn!(task_id = %task.id, error = %e, "failed to save session results");
            return Vec::new();
        }

        self.task = task;
        self.clear_saved_state();
        self.state = SessionState::Ended;
        info!(
            task_id = %self.task.id,
            workouts = updated.len(),
            elapsed = self.clock.elapsed(),
            "session ended"
        );
        updated
    }

    /* ───────────────────────────── persistence ─────────────────────────── */

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            task_id: self.task.id.clone(),
            exercise_index: self.index,
            elapsed_seconds: self.clock.elapsed(),
            progress: self.progress.clone(),
            current: self.current.clone(),
            current_touched: self.touched,
            saved_at: Utc::now(),
        }
    }

    pub fn save_state(&self) -> bool {
        match self.snapshots.save(&self.snapshot()) {
            Ok(()) => {
                debug!(task_id = %self.task.id, "session snapshot saved");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to save session snapshot");
                false
            }
        }
    }

    pub fn load_saved_state(&self) -> Option<SessionSnapshot> {
        self.snapshots
            .load()
            .inspect_err(|e| warn!(error = %e, "failed to load session snapshot"))
            .ok()
            .flatten()
    }

    /// Reinstate a snapshot and restart the clock from its elapsed time.
    /// The in-flight exercise is taken as saved, not reloaded from the plan.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.index = snapshot.exercise_index.min(self.task.workouts.len().saturating_sub(1));
        self.progress = snapshot.progress;
        self.current = snapshot.current;
        self.touched = snapshot.current_touched;
        self.rest.cancel();
        self.clock.set_elapsed(snapshot.elapsed_seconds);
        self.clock.start();
        self.state = SessionState::Running;
        info!(task_id = %self.task.id, index = self.index, "session restored");
    }

    pub fn clear_saved_state(&self) -> bool {
        match self.snapshots.clear() {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "failed to clear session snapshot");
                false
            }
        }
    }
}
