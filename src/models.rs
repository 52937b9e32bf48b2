use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{
    Difficulty, Equipment, FitnessGoal, MealKind, MetricKind, MuscleGroup, PlanStatus, Sex,
    WorkoutLocation, WorkoutType,
};

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub muscles: Vec<MuscleGroup>,
    pub equipment: Vec<Equipment>,
    pub high_impact: bool,
    pub difficulty: Difficulty,
    pub avoid_for: Vec<String>,
}

impl Exercise {
    pub fn targets(&self, group: MuscleGroup) -> bool {
        self.muscles.contains(&group)
    }

    /// True when the exercise needs nothing beyond bodyweight.
    pub fn needs_no_equipment(&self) -> bool {
        self.equipment.iter().all(|e| *e == Equipment::None)
    }
}

/// The single local user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub sex: Sex,
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub experience: Difficulty,
    pub location: WorkoutLocation,
    /// Empty means "no restriction".
    #[serde(default)]
    pub equipment: Vec<Equipment>,
    #[serde(default)]
    pub health_conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanGoal {
    pub goal: FitnessGoal,
    pub start_weight: f64,
    pub target_weight: f64,
    pub start_date: NaiveDate,
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub professional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub goal: PlanGoal,
    pub start_date: NaiveDate,
    pub duration_days: u32,
    pub status: PlanStatus,
    pub tasks: Vec<DailyTask>,
}

impl Plan {
    pub fn task_on(&self, date: NaiveDate) -> Option<&DailyTask> {
        self.tasks.iter().find(|t| t.date == date)
    }

    pub fn end_date(&self) -> NaiveDate {
        self.start_date + chrono::Days::new(u64::from(self.duration_days.saturating_sub(1)))
    }
}

/// One calendar day of a plan.
///
/// `is_completed` and `is_skipped` are never both set; the mutators below
/// are the only way the tracker and session engine change them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTask {
    pub id: String,
    pub date: NaiveDate,
    pub workouts: Vec<Workout>,
    pub meals: Vec<Meal>,
    pub is_completed: bool,
    pub is_skipped: bool,
}

impl DailyTask {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            id: new_id(),
            date,
            workouts: Vec::new(),
            meals: Vec::new(),
            is_completed: false,
            is_skipped: false,
        }
    }

    pub fn is_rest_day(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn all_workouts_done(&self) -> bool {
        !self.workouts.is_empty() && self.workouts.iter().all(|w| w.is_completed)
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.is_completed = completed;
        if completed {
            self.is_skipped = false;
        }
    }

    /// Skipping a day throws away any partial workout completion.
    pub fn toggle_skip(&mut self) {
        self.is_skipped = !self.is_skipped;
        if self.is_skipped {
            self.is_completed = false;
            for w in &mut self.workouts {
                w.is_completed = false;
            }
        }
    }

    /// Flip one workout and re-derive the day. Returns the workout's new state,
    /// or `None` if `index` is out of range.
    pub fn toggle_workout(&mut self, index: usize) -> Option<bool> {
        let workout = self.workouts.get_mut(index)?;
        workout.is_completed = !workout.is_completed;
        let now_done = workout.is_completed;

        if !now_done {
            self.is_completed = false;
        } else if self.all_workouts_done() {
            self.set_completed(true);
        }
        Some(now_done)
    }

    pub fn toggle_meal(&mut self, index: usize) -> Option<bool> {
        let meal = self.meals.get_mut(index)?;
        meal.is_completed = !meal.is_completed;
        Some(meal.is_completed)
    }

    pub fn meals_done(&self) -> usize {
        self.meals.iter().filter(|m| m.is_completed).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub name: String,
    pub kind: WorkoutType,
    /// Planned sets; only strength workouts carry them.
    pub sets: Vec<WorkoutSet>,
    pub duration_minutes: Option<u32>,
    pub distance_km: Option<f64>,
    pub calories: u32,
    pub is_completed: bool,
    pub notes: String,
}

impl Workout {
    pub fn new(name: impl Into<String>, kind: WorkoutType) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            kind,
            sets: Vec::new(),
            duration_minutes: None,
            distance_km: None,
            calories: 0,
            is_completed: false,
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub reps: u32,
    pub weight: Option<f64>,
    pub is_completed: bool,
}

impl WorkoutSet {
    pub fn planned(reps: u32, weight: Option<f64>) -> Self {
        Self {
            reps,
            weight,
            is_completed: false,
        }
    }

    /// 3×10 at zero weight, used when a strength workout has no plan of its own.
    pub fn default_template() -> Vec<Self> {
        (0..3).map(|_| Self::planned(10, Some(0.0))).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub name: String,
    pub kind: MealKind,
    pub calories: u32,
    pub is_completed: bool,
}

/// One reading from the health metric store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub date: NaiveDate,
    pub kind: MetricKind,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    fn task_with(n: usize) -> DailyTask {
        let mut task = DailyTask::new(day());
        for i in 0..n {
            task.workouts
                .push(Workout::new(format!("w{i}"), WorkoutType::Strength));
        }
        task
    }

    #[test]
    fn completing_every_workout_completes_the_day() {
        let mut task = task_with(3);

        assert_eq!(task.toggle_workout(0), Some(true));
        assert!(!task.is_completed);
        assert_eq!(task.toggle_workout(1), Some(true));
        assert!(!task.is_completed);
        assert_eq!(task.toggle_workout(2), Some(true));
        assert!(task.is_completed);

        assert_eq!(task.toggle_workout(1), Some(false));
        assert!(!task.is_completed);
    }

    #[test]
    fn toggling_twice_restores_state() {
        let mut task = task_with(2);
        task.toggle_workout(0);
        let before = task.clone();

        task.toggle_workout(1);
        task.toggle_workout(1);
        assert_eq!(task, before);

        let mut done = task_with(1);
        done.toggle_workout(0);
        let before = done.clone();
        done.toggle_workout(0);
        done.toggle_workout(0);
        assert_eq!(done, before);
    }

    #[test]
    fn skip_clears_completion_and_workouts() {
        let mut task = task_with(2);
        task.toggle_workout(0);
        task.toggle_workout(1);
        assert!(task.is_completed);

        task.toggle_skip();
        assert!(task.is_skipped);
        assert!(!task.is_completed);
        assert!(task.workouts.iter().all(|w| !w.is_completed));

        task.set_completed(true);
        assert!(task.is_completed && !task.is_skipped);
    }

    #[test]
    fn out_of_range_toggles_are_ignored() {
        let mut task = task_with(1);
        assert_eq!(task.toggle_workout(5), None);
        assert_eq!(task.toggle_meal(0), None);
    }
}
