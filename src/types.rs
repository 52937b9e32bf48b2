use once_cell::sync::Lazy;
use std::{collections::HashMap, fmt::Display};
use strsim::jaro_winkler;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Arms,
    Legs,
    Glutes,
    Core,
    FullBody,
    Cardio,
    Mobility,
}

impl MuscleGroup {
    /// Groups that make an exercise eligible for a strength slot.
    pub fn is_strength(self) -> bool {
        matches!(
            self,
            Self::Chest
                | Self::Back
                | Self::Shoulders
                | Self::Legs
                | Self::Glutes
                | Self::Core
                | Self::FullBody
        )
    }
}

impl Display for MuscleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Chest => "chest",
            Self::Back => "back",
            Self::Shoulders => "shoulders",
            Self::Arms => "arms",
            Self::Legs => "legs",
            Self::Glutes => "glutes",
            Self::Core => "core",
            Self::FullBody => "full-body",
            Self::Cardio => "cardio",
            Self::Mobility => "mobility",
        };

        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Equipment {
    None,
    YogaMat,
    ResistanceBands,
    Dumbbells,
    Kettlebell,
    Barbell,
    Bench,
    PullUpBar,
    Machine,
    Cable,
    Treadmill,
    StationaryBike,
    Rower,
    JumpRope,
}

impl Equipment {
    /// Equipment a typical home setup is assumed to have.
    pub fn is_home_friendly(self) -> bool {
        matches!(
            self,
            Self::None | Self::YogaMat | Self::ResistanceBands | Self::Dumbbells
        )
    }
}

impl Display for Equipment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::YogaMat => "yoga-mat",
            Self::ResistanceBands => "resistance-bands",
            Self::Dumbbells => "dumbbells",
            Self::Kettlebell => "kettlebell",
            Self::Barbell => "barbell",
            Self::Bench => "bench",
            Self::PullUpBar => "pull-up-bar",
            Self::Machine => "machine",
            Self::Cable => "cable",
            Self::Treadmill => "treadmill",
            Self::StationaryBike => "stationary-bike",
            Self::Rower => "rower",
            Self::JumpRope => "jump-rope",
        };

        write!(f, "{}", s)
    }
}

/// Catalog difficulty and user experience share one scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };

        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitnessGoal {
    FatLoss,
    MuscleGain,
    HealthImprovement,
}

impl FitnessGoal {
    /// Label used when naming generated plans.
    pub fn label(self) -> &'static str {
        match self {
            Self::FatLoss => "减脂",
            Self::MuscleGain => "增肌",
            Self::HealthImprovement => "健康改善",
        }
    }
}

impl Display for FitnessGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::FatLoss => "fat-loss",
            Self::MuscleGain => "muscle-gain",
            Self::HealthImprovement => "health-improvement",
        };

        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkoutLocation {
    Home,
    Gym,
}

impl Display for WorkoutLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Home => write!(f, "home"),
            Self::Gym => write!(f, "gym"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sex {
    Male,
    Female,
    Unspecified,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkoutType {
    Strength,
    Cardio,
    Flexibility,
    Other,
}

impl Display for WorkoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Strength => "strength",
            Self::Cardio => "cardio",
            Self::Flexibility => "flexibility",
            Self::Other => "other",
        };

        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanStatus {
    Active,
    Archived,
}

impl Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MealKind {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl Display for MealKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        };

        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricKind {
    Weight,
    BodyFat,
    Waist,
    RestingHeartRate,
    Vo2Max,
}

impl Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Weight => "weight",
            Self::BodyFat => "body-fat",
            Self::Waist => "waist",
            Self::RestingHeartRate => "resting-heart-rate",
            Self::Vo2Max => "vo2max",
        };

        write!(f, "{}", s)
    }
}

/// Round-trips the `Display` spelling of the enums that are stored as text.
pub fn parse_display<T>(raw: &str) -> Option<T>
where
    T: ValueEnum + Display,
{
    T::value_variants()
        .iter()
        .find(|v| v.to_string() == raw)
        .cloned()
}

pub static ALLOWED_MUSCLES: Lazy<HashMap<String, MuscleGroup>> = Lazy::new(|| {
    MuscleGroup::value_variants()
        .iter()
        .map(|m| (m.to_string(), *m))
        .collect()
});

pub static ALLOWED_EQUIPMENT: Lazy<HashMap<String, Equipment>> = Lazy::new(|| {
    Equipment::value_variants()
        .iter()
        .map(|e| (e.to_string(), *e))
        .collect()
});

/// Returns the muscle group for a raw catalog spelling or `None` if not allowed.
pub fn canonical_muscle<S: AsRef<str>>(m: S) -> Option<MuscleGroup> {
    let m = normalize(m.as_ref());
    ALLOWED_MUSCLES.get(m.as_str()).copied()
}

pub fn canonical_equipment<S: AsRef<str>>(e: S) -> Option<Equipment> {
    let e = normalize(e.as_ref());
    ALLOWED_EQUIPMENT.get(e.as_str()).copied()
}

/// Lowercase and kebab-case a free-form name (`"Knee Injury"` → `"knee-injury"`).
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Return the closest allowed name for `input`
/// if similarity ≥ 0.80 *and* clearly better than the runner-up.
/// Otherwise return `None` (no suggestion shown).
pub fn best_suggestion<'a, I>(input: &str, allowed: I) -> Option<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let inp = normalize(input);
    if inp.is_empty() {
        return None;
    }

    let mut scores: Vec<(&String, f64)> = allowed
        .into_iter()
        .map(|m| (m, jaro_winkler(&inp, m)))
        .collect();

    // Highest score first.
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (best, best_score) = *scores.first()?;
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    if best_score >= MIN_SCORE && best_score - second_score >= GAP {
        Some(best.clone())
    } else {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFmt {
    Pretty,
    Json,
}

/// Print `data` as JSON or run the pretty printer.
pub fn emit<T: Serialize>(fmt: OutputFmt, data: &T, pretty: impl FnOnce()) {
    match fmt {
        OutputFmt::Json => match serde_json::to_string_pretty(data) {
            Ok(s) => println!("{}", s),
            Err(e) => tracing::error!(error = %e, "failed to serialize output"),
        },
        OutputFmt::Pretty => pretty(),
    }
}
