use std::collections::HashSet;

use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::{
    catalog::Catalog,
    errors::GenerateError,
    models::{DailyTask, Exercise, Meal, Plan, PlanGoal, UserProfile, Workout, WorkoutSet, new_id},
    types::{
        Difficulty, FitnessGoal, MealKind, MuscleGroup, PlanStatus, Sex, WorkoutLocation,
        WorkoutType,
    },
};

/// Workout days inside the 7-day microcycle; the other days are rest.
pub const WORKOUT_OFFSETS: [u32; 3] = [0, 2, 4];

/// Longest plan `generate` accepts.
pub const MAX_PLAN_DAYS: u32 = 366;

const CARDIO_KCAL_PER_MIN: u32 = 8;
const STRENGTH_KCAL_PER_MIN: u32 = 5;
const STRENGTH_MIN_PER_SET: u32 = 3;
const FALLBACK_MINUTES: u32 = 20;
const FALLBACK_KCAL: u32 = 100;

/// Exercise counts (not sets) per workout day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Composition {
    pub strength: usize,
    pub cardio: usize,
}

pub fn composition(goal: FitnessGoal) -> Composition {
    match goal {
        FitnessGoal::FatLoss => Composition { strength: 3, cardio: 2 },
        FitnessGoal::MuscleGain => Composition { strength: 5, cardio: 0 },
        FitnessGoal::HealthImprovement => Composition { strength: 3, cardio: 1 },
    }
}

/// (sets, reps) with reps at the midpoint of the experience's rep range.
pub fn strength_scheme(level: Difficulty) -> (u32, u32) {
    let (sets, lo, hi) = match level {
        Difficulty::Beginner => (3, 12, 15),
        Difficulty::Intermediate => (4, 8, 12),
        Difficulty::Advanced => (5, 6, 10),
    };
    (sets, (lo + hi) / 2)
}

pub fn cardio_minutes(level: Difficulty) -> u32 {
    match level {
        Difficulty::Beginner => 20,
        _ => 30,
    }
}

pub fn is_strength_eligible(ex: &Exercise) -> bool {
    ex.muscles.iter().any(|m| m.is_strength())
}

pub fn is_cardio_eligible(ex: &Exercise) -> bool {
    ex.targets(MuscleGroup::Cardio) || (ex.targets(MuscleGroup::FullBody) && ex.high_impact)
}

/// Location, equipment, health-condition and experience filters, in that order.
pub fn eligible_exercises<'a>(catalog: &'a Catalog, profile: &UserProfile) -> Vec<&'a Exercise> {
    let owned: HashSet<_> = profile.equipment.iter().copied().collect();
    let conditions: HashSet<String> = profile
        .health_conditions
        .iter()
        .map(|c| crate::types::normalize(c))
        .collect();

    catalog
        .exercises()
        .iter()
        .filter(|ex| match profile.location {
            WorkoutLocation::Home => ex.equipment.iter().all(|e| e.is_home_friendly()),
            WorkoutLocation::Gym => true,
        })
        .filter(|ex| {
            owned.is_empty()
                || ex.needs_no_equipment()
                || ex.equipment.iter().all(|e| owned.contains(e))
        })
        .filter(|ex| !ex.avoid_for.iter().any(|c| conditions.contains(c)))
        .filter(|ex| ex.difficulty <= profile.experience)
        .collect()
}

/// Builds plans from the catalog. Production code seeds from entropy; tests pin a seed.
pub struct PlanGenerator<'a> {
    catalog: &'a Catalog,
    rng: ChaCha8Rng,
}

impl<'a> PlanGenerator<'a> {
    pub fn from_entropy(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn seeded(catalog: &'a Catalog, seed: u64) -> Self {
        Self {
            catalog,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn generate(
        &mut self,
        profile: &UserProfile,
        goal: PlanGoal,
        duration_days: u32,
    ) -> Result<Plan, GenerateError> {
        if duration_days == 0 {
            return Err(GenerateError::InvalidDuration);
        }
        if duration_days > MAX_PLAN_DAYS {
            return Err(GenerateError::DurationTooLong { max: MAX_PLAN_DAYS });
        }
        if goal
            .start_date
            .checked_add_days(chrono::Days::new(u64::from(duration_days - 1)))
            .is_none()
        {
            return Err(GenerateError::DateOutOfRange);
        }

        let pool = eligible_exercises(self.catalog, profile);
        let target = composition(goal.goal);

        let strength_pool: Vec<&Exercise> =
            pool.iter().copied().filter(|e| is_strength_eligible(e)).collect();
        let strength: Vec<&Exercise> = strength_pool
            .choose_multiple(&mut self.rng, target.strength)
            .copied()
            .collect();

        // An exercise can qualify for both slots; never schedule it twice.
        let cardio_pool: Vec<&Exercise> = pool
            .iter()
            .copied()
            .filter(|e| is_cardio_eligible(e) && !strength.iter().any(|s| s.name == e.name))
            .collect();
        let cardio: Vec<&Exercise> = cardio_pool
            .choose_multiple(&mut self.rng, target.cardio)
            .copied()
            .collect();

        debug!(
            pool = pool.len(),
            strength = strength.len(),
            cardio = cardio.len(),
            "selected exercises"
        );

        let calories = daily_calories(profile, goal.goal);
        let mut tasks = Vec::with_capacity(duration_days as usize);
        for offset in 0..duration_days {
            let Some(date) = goal.start_date.checked_add_days(chrono::Days::new(u64::from(offset)))
            else {
                return Err(GenerateError::DateOutOfRange);
            };
            let mut task = DailyTask::new(date);
            task.meals = meals_for(calories);

            if WORKOUT_OFFSETS.contains(&offset) {
                task.workouts = strength
                    .iter()
                    .map(|ex| strength_workout(ex, profile.experience))
                    .chain(cardio.iter().map(|ex| cardio_workout(ex, profile.experience)))
                    .collect();

                if task.workouts.is_empty() {
                    if let Some(ex) = pool.choose(&mut self.rng) {
                        debug!(%date, exercise = %ex.name, "inserting fallback workout");
                        task.workouts.push(fallback_workout(ex));
                    }
                }
            }
            tasks.push(task);
        }

        Ok(Plan {
            id: new_id(),
            name: format!("{}的{}计划", profile.name, goal.goal.label()),
            start_date: goal.start_date,
            duration_days,
            status: PlanStatus::Active,
            goal,
            tasks,
        })
    }
}

fn strength_workout(ex: &Exercise, level: Difficulty) -> Workout {
    let (sets, reps) = strength_scheme(level);
    let minutes = sets * STRENGTH_MIN_PER_SET;
    let mut w = Workout::new(&ex.name, WorkoutType::Strength);
    w.sets = (0..sets).map(|_| WorkoutSet::planned(reps, Some(0.0))).collect();
    w.duration_minutes = Some(minutes);
    w.calories = minutes * STRENGTH_KCAL_PER_MIN;
    w
}

fn cardio_workout(ex: &Exercise, level: Difficulty) -> Workout {
    let minutes = cardio_minutes(level);
    let mut w = Workout::new(&ex.name, WorkoutType::Cardio);
    w.duration_minutes = Some(minutes);
    w.calories = minutes * CARDIO_KCAL_PER_MIN;
    w
}

fn fallback_workout(ex: &Exercise) -> Workout {
    let kind = if is_cardio_eligible(ex) {
        WorkoutType::Cardio
    } else if ex.targets(MuscleGroup::Mobility) {
        WorkoutType::Flexibility
    } else if is_strength_eligible(ex) {
        WorkoutType::Strength
    } else {
        WorkoutType::Other
    };
    let mut w = Workout::new(&ex.name, kind);
    w.duration_minutes = Some(FALLBACK_MINUTES);
    w.calories = FALLBACK_KCAL;
    w
}

/// Mifflin-St Jeor BMR with a light-activity multiplier, shifted by goal.
pub fn daily_calories(profile: &UserProfile, goal: FitnessGoal) -> u32 {
    let sex_offset = match profile.sex {
        Sex::Male => 5.0,
        Sex::Female => -161.0,
        Sex::Unspecified => -78.0,
    };
    let bmr = 10.0 * profile.weight_kg + 6.25 * profile.height_cm - 5.0 * f64::from(profile.age)
        + sex_offset;
    let maintenance = bmr * 1.375;
    let adjusted = match goal {
        FitnessGoal::FatLoss => maintenance - 500.0,
        FitnessGoal::MuscleGain => maintenance + 300.0,
        FitnessGoal::HealthImprovement => maintenance,
    };
    adjusted.max(1200.0).round() as u32
}

fn meals_for(daily: u32) -> Vec<Meal> {
    [
        (MealKind::Breakfast, "Breakfast", 0.3),
        (MealKind::Lunch, "Lunch", 0.4),
        (MealKind::Dinner, "Dinner", 0.3),
    ]
    .into_iter()
    .map(|(kind, name, share)| Meal {
        id: new_id(),
        name: name.to_string(),
        kind,
        calories: (f64::from(daily) * share).round() as u32,
        is_completed: false,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Equipment;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    fn profile(level: Difficulty) -> UserProfile {
        UserProfile {
            name: "Lin".into(),
            sex: Sex::Female,
            age: 30,
            height_cm: 165.0,
            weight_kg: 72.0,
            experience: level,
            location: WorkoutLocation::Gym,
            equipment: Vec::new(),
            health_conditions: Vec::new(),
        }
    }

    fn goal(g: FitnessGoal) -> PlanGoal {
        PlanGoal {
            goal: g,
            start_weight: 72.0,
            target_weight: 68.0,
            start_date: start(),
            target_date: None,
            professional: false,
        }
    }

    fn find<'a>(catalog: &'a Catalog, name: &str) -> &'a Exercise {
        catalog.exercises().iter().find(|e| e.name == name).unwrap()
    }

    #[test]
    fn beginner_fat_loss_plan_has_three_workout_days() {
        let catalog = Catalog::bundled().unwrap();
        let plan = PlanGenerator::seeded(&catalog, 7)
            .generate(&profile(Difficulty::Beginner), goal(FitnessGoal::FatLoss), 30)
            .unwrap();

        assert_eq!(plan.tasks.len(), 30);
        assert_eq!(plan.status, PlanStatus::Active);
        assert_eq!(plan.name, "Lin的减脂计划");

        let workout_days: Vec<i64> = plan
            .tasks
            .iter()
            .filter(|t| !t.workouts.is_empty())
            .map(|t| (t.date - start()).num_days())
            .collect();
        assert_eq!(workout_days, vec![0, 2, 4]);

        for task in plan.tasks.iter().filter(|t| !t.is_rest_day()) {
            let strength = task.workouts.iter().filter(|w| w.kind == WorkoutType::Strength).count();
            let cardio = task.workouts.iter().filter(|w| w.kind == WorkoutType::Cardio).count();
            assert!(strength <= 3 && cardio <= 2);
            for w in &task.workouts {
                assert_eq!(find(&catalog, &w.name).difficulty, Difficulty::Beginner);
            }
        }
    }

    #[test]
    fn same_seed_same_plan_shape() {
        let catalog = Catalog::bundled().unwrap();
        let names = |seed| {
            PlanGenerator::seeded(&catalog, seed)
                .generate(&profile(Difficulty::Advanced), goal(FitnessGoal::HealthImprovement), 7)
                .unwrap()
                .tasks[0]
                .workouts
                .iter()
                .map(|w| w.name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(42), names(42));
    }

    #[test]
    fn strength_sets_follow_experience() {
        let catalog = Catalog::bundled().unwrap();
        let plan = PlanGenerator::seeded(&catalog, 1)
            .generate(&profile(Difficulty::Intermediate), goal(FitnessGoal::MuscleGain), 7)
            .unwrap();

        let day0 = &plan.tasks[0];
        assert!(!day0.workouts.is_empty());
        for w in &day0.workouts {
            assert_eq!(w.kind, WorkoutType::Strength);
            assert_eq!(w.sets.len(), 4);
            assert!(w.sets.iter().all(|s| s.reps == 10));
        }
    }

    #[test]
    fn home_and_condition_filters_apply() {
        let catalog = Catalog::bundled().unwrap();
        let mut p = profile(Difficulty::Advanced);
        p.location = WorkoutLocation::Home;
        p.health_conditions = vec!["Knee Injury".into()];

        let pool = eligible_exercises(&catalog, &p);
        assert!(!pool.is_empty());
        for ex in pool {
            assert!(ex.equipment.iter().all(|e| e.is_home_friendly()));
            assert!(!ex.avoid_for.contains(&"knee-injury".to_string()));
        }
    }

    #[test]
    fn owned_equipment_restricts_pool() {
        let catalog = Catalog::bundled().unwrap();
        let mut p = profile(Difficulty::Advanced);
        p.equipment = vec![Equipment::Dumbbells];

        for ex in eligible_exercises(&catalog, &p) {
            assert!(ex.needs_no_equipment() || ex.equipment == vec![Equipment::Dumbbells]);
        }
    }

    #[test]
    fn fallback_fills_empty_workout_day() {
        let catalog = Catalog::parse(
            r#"
            [[exercise]]
            name = "Curl"
            muscles = ["arms"]
            equipment = ["dumbbells"]
            difficulty = "beginner"
            "#,
        )
        .unwrap();
        let plan = PlanGenerator::seeded(&catalog, 3)
            .generate(&profile(Difficulty::Beginner), goal(FitnessGoal::FatLoss), 5)
            .unwrap();

        let day0 = &plan.tasks[0];
        assert_eq!(day0.workouts.len(), 1);
        assert_eq!(day0.workouts[0].duration_minutes, Some(20));
        assert_eq!(day0.workouts[0].calories, 100);
        assert_eq!(day0.workouts[0].kind, WorkoutType::Other);
        assert!(plan.tasks[1].is_rest_day());
    }

    #[test]
    fn fully_filtered_catalog_yields_rest_days() {
        let catalog = Catalog::parse(
            r#"
            [[exercise]]
            name = "Deadlift"
            muscles = ["back"]
            equipment = ["barbell"]
            difficulty = "advanced"
            "#,
        )
        .unwrap();
        let plan = PlanGenerator::seeded(&catalog, 3)
            .generate(&profile(Difficulty::Beginner), goal(FitnessGoal::FatLoss), 7)
            .unwrap();
        assert!(plan.tasks.iter().all(|t| t.is_rest_day()));
        assert!(plan.tasks.iter().all(|t| t.meals.len() == 3));
    }

    #[test]
    fn short_plans_drop_out_of_range_offsets() {
        let catalog = Catalog::bundled().unwrap();
        let plan = PlanGenerator::seeded(&catalog, 9)
            .generate(&profile(Difficulty::Beginner), goal(FitnessGoal::FatLoss), 3)
            .unwrap();
        assert_eq!(plan.tasks.iter().filter(|t| !t.is_rest_day()).count(), 2);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let catalog = Catalog::bundled().unwrap();
        let err = PlanGenerator::seeded(&catalog, 0)
            .generate(&profile(Difficulty::Beginner), goal(FitnessGoal::FatLoss), 0)
            .unwrap_err();
        assert_eq!(err, GenerateError::InvalidDuration);
    }

    #[test]
    fn overlong_duration_is_rejected_up_front() {
        let catalog = Catalog::bundled().unwrap();
        let mut generator = PlanGenerator::seeded(&catalog, 0);
        let level = Difficulty::Beginner;

        let plan = generator
            .generate(&profile(level), goal(FitnessGoal::FatLoss), MAX_PLAN_DAYS)
            .unwrap();
        assert_eq!(plan.tasks.len(), MAX_PLAN_DAYS as usize);

        for days in [MAX_PLAN_DAYS + 1, 40_000, u32::MAX] {
            let err = generator
                .generate(&profile(level), goal(FitnessGoal::FatLoss), days)
                .unwrap_err();
            assert_eq!(err, GenerateError::DurationTooLong { max: MAX_PLAN_DAYS });
        }
    }

    #[test]
    fn plan_past_the_calendar_end_is_rejected() {
        let catalog = Catalog::bundled().unwrap();
        let mut late = goal(FitnessGoal::FatLoss);
        late.start_date = NaiveDate::MAX;
        let err = PlanGenerator::seeded(&catalog, 0)
            .generate(&profile(Difficulty::Beginner), late, 2)
            .unwrap_err();
        assert_eq!(err, GenerateError::DateOutOfRange);
    }

    #[test]
    fn calorie_target_moves_with_goal() {
        let p = profile(Difficulty::Beginner);
        let cut = daily_calories(&p, FitnessGoal::FatLoss);
        let keep = daily_calories(&p, FitnessGoal::HealthImprovement);
        let bulk = daily_calories(&p, FitnessGoal::MuscleGain);
        assert!(cut < keep && keep < bulk);
        assert_eq!(keep - cut, 500);
    }
}
