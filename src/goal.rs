//! Progress towards a weight goal.
//!
//! Everything here is pure: callers fetch the metric history and pass it in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{MetricSample, PlanGoal};
use crate::types::MetricKind;

pub const DEFAULT_TOLERANCE_KG: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalDirection {
    Lose,
    Gain,
    Maintain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    NotStarted,
    Behind,
    OnTrack,
    Ahead,
}

/// How far progress may drift from the straight-line schedule before the
/// status leaves `OnTrack`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusBands {
    pub ahead_margin: f64,
    pub behind_margin: f64,
}

impl Default for StatusBands {
    fn default() -> Self {
        Self {
            ahead_margin: 0.1,
            behind_margin: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalEvaluation {
    pub progress: f64,
    pub expected: f64,
    pub status: GoalStatus,
    pub direction: GoalDirection,
    /// Weekly change exceeds the safe rate for this goal.
    pub pace_warning: bool,
}

/// Start weight, unless a weight reading exists on or after the goal start;
/// then the earliest such reading wins.
pub fn resolved_start_weight(goal: &PlanGoal, samples: &[MetricSample]) -> f64 {
    samples
        .iter()
        .filter(|s| s.kind == MetricKind::Weight && s.date >= goal.start_date)
        .min_by_key(|s| s.date)
        .map(|s| s.value)
        .unwrap_or(goal.start_weight)
}

/// Linear position of `current` between `baseline` and `target`, clamped to [0, 1].
pub fn progress_fraction(baseline: f64, target: f64, current: f64) -> f64 {
    let span = target - baseline;
    if span == 0.0 {
        return if current == target { 1.0 } else { 0.0 };
    }
    ((current - baseline) / span).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy)]
pub struct GoalProgressEvaluator {
    pub tolerance_kg: f64,
    pub bands: StatusBands,
}

impl Default for GoalProgressEvaluator {
    fn default() -> Self {
        Self {
            tolerance_kg: DEFAULT_TOLERANCE_KG,
            bands: StatusBands::default(),
        }
    }
}

impl GoalProgressEvaluator {
    pub fn new(tolerance_kg: f64, bands: StatusBands) -> Self {
        Self { tolerance_kg, bands }
    }

    pub fn direction(&self, baseline: f64, target: f64) -> GoalDirection {
        let delta = target - baseline;
        if delta.abs() <= self.tolerance_kg {
            GoalDirection::Maintain
        } else if delta < 0.0 {
            GoalDirection::Lose
        } else {
            GoalDirection::Gain
        }
    }

    /// Share of the goal's date range that has elapsed by `today`.
    /// Without a target date there is no schedule, so nothing is expected yet.
    pub fn expected_progress(&self, goal: &PlanGoal, today: NaiveDate) -> f64 {
        let Some(end) = goal.target_date else {
            return 0.0;
        };
        let total = (end - goal.start_date).num_days();
        if total <= 0 {
            return 1.0;
        }
        let elapsed = (today - goal.start_date).num_days();
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn evaluate(
        &self,
        goal: &PlanGoal,
        baseline: f64,
        current: Option<f64>,
        today: NaiveDate,
    ) -> GoalEvaluation {
        let direction = self.direction(baseline, goal.target_weight);
        let expected = self.expected_progress(goal, today);

        let Some(current) = current else {
            return GoalEvaluation {
                progress: 0.0,
                expected,
                status: GoalStatus::NotStarted,
                direction,
                pace_warning: false,
            };
        };

        let progress = progress_fraction(baseline, goal.target_weight, current);
        let status = match direction {
            GoalDirection::Maintain => {
                if (current - goal.target_weight).abs() <= self.tolerance_kg {
                    GoalStatus::OnTrack
                } else {
                    GoalStatus::Behind
                }
            }
            _ => self.band(progress, expected),
        };

        GoalEvaluation {
            progress,
            expected,
            status,
            direction,
            pace_warning: self.pace_exceeded(goal, baseline, current, today),
        }
    }

    fn band(&self, progress: f64, expected: f64) -> GoalStatus {
        if progress >= expected + self.bands.ahead_margin {
            GoalStatus::Ahead
        } else if progress < expected - self.bands.behind_margin {
            GoalStatus::Behind
        } else {
            GoalStatus::OnTrack
        }
    }

    /// Professional mode tolerates a faster weekly change.
    fn pace_exceeded(&self, goal: &PlanGoal, baseline: f64, current: f64, today: NaiveDate) -> bool {
        let days = (today - goal.start_date).num_days();
        if days < 7 || baseline <= 0.0 {
            return false;
        }
        let weekly = (current - baseline).abs() / (days as f64 / 7.0);
        let limit = if goal.professional { 0.015 } else { 0.01 };
        weekly > baseline * limit
    }
}
