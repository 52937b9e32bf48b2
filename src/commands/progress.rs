use anyhow::Result;
use chrono::{Days, NaiveDate};
use colored::Colorize;
use serde::Serialize;
use stamina::{
    goal::{GoalEvaluation, GoalProgressEvaluator, GoalStatus, resolved_start_weight},
    metrics::{MetricProvider, daily_latest},
    tracker::{Tone, build_insights, weekly_summary},
    types::{MetricKind, emit},
};

use super::{Ctx, today};

/// How far back insights look for weight readings.
const INSIGHT_LOOKBACK_DAYS: u64 = 21;

pub async fn week(date: Option<NaiveDate>, ctx: &Ctx) -> Result<()> {
    let plan = ctx.active_plan().await?;
    let day = date.unwrap_or_else(today);
    let s = weekly_summary(&plan, day);

    emit(ctx.fmt, &s, || {
        println!(
            "{} {} → {}",
            "Week:".cyan().bold(),
            s.week_start,
            s.week_end
        );
        println!("  {} completed", s.completed.to_string().green().bold());
        println!("  {} pending", s.pending.to_string().bold());
        println!("  {} skipped", s.skipped.to_string().yellow().bold());
        println!("  {} rest days", s.rest.to_string().dimmed());
        println!(
            "  {} completion · {} day streak",
            format!("{:.0}%", s.completion_rate * 100.0).bold(),
            s.streak.to_string().bold()
        );
    });
    Ok(())
}

pub async fn insights(date: Option<NaiveDate>, ctx: &Ctx) -> Result<()> {
    let plan = ctx.active_plan().await?;
    let day = date.unwrap_or_else(today);
    let from = day
        .checked_sub_days(Days::new(INSIGHT_LOOKBACK_DAYS))
        .unwrap_or(NaiveDate::MIN);
    let weights = ctx.metrics.samples(MetricKind::Weight, from, day).await?;
    let out = build_insights(plan.task_on(day), &weights);

    emit(ctx.fmt, &out, || {
        for i in &out {
            let tag = match i.tone {
                Tone::Info => "info:".blue().bold(),
                Tone::Positive => "ok:".green().bold(),
                Tone::Warning => "warning:".yellow().bold(),
            };
            println!("{} {}", tag, i.message);
        }
    });
    Ok(())
}

#[derive(Serialize)]
struct GoalJson {
    baseline: f64,
    target: f64,
    current: Option<f64>,
    target_date: Option<NaiveDate>,
    #[serde(flatten)]
    evaluation: GoalEvaluation,
    last_week: Vec<(NaiveDate, Option<f64>)>,
}

pub async fn goal(date: Option<NaiveDate>, ctx: &Ctx) -> Result<()> {
    let plan = ctx.active_plan().await?;
    let day = date.unwrap_or_else(today);
    let goal = &plan.goal;

    let history = ctx
        .metrics
        .samples(MetricKind::Weight, goal.start_date.min(day), day)
        .await?;
    let baseline = resolved_start_weight(goal, &history);
    let current = ctx
        .metrics
        .latest(MetricKind::Weight, day)
        .await?
        .map(|s| s.value);

    let evaluator = GoalProgressEvaluator::new(ctx.settings.goal_tolerance_kg, ctx.settings.bands);
    let evaluation = evaluator.evaluate(goal, baseline, current, day);

    let week: Vec<NaiveDate> = (0..7u64)
        .rev()
        .filter_map(|n| day.checked_sub_days(Days::new(n)))
        .collect();
    let last_week = daily_latest(&ctx.metrics, MetricKind::Weight, &week).await?;

    let out = GoalJson {
        baseline,
        target: goal.target_weight,
        current,
        target_date: goal.target_date,
        evaluation,
        last_week,
    };

    emit(ctx.fmt, &out, || {
        let e = &out.evaluation;
        println!(
            "{} {:.1} kg → {:.1} kg{}",
            "Goal:".cyan().bold(),
            out.baseline,
            out.target,
            out.target_date.map(|d| format!(" by {d}")).unwrap_or_default()
        );
        match out.current {
            Some(c) => println!("  now {:.1} kg", c),
            None => println!("  {}", "no weight logged yet".dimmed()),
        }
        let status = match e.status {
            GoalStatus::Ahead => "ahead".green().bold(),
            GoalStatus::OnTrack => "on track".green(),
            GoalStatus::Behind => "behind".yellow().bold(),
            GoalStatus::NotStarted => "not started".dimmed(),
        };
        println!(
            "  {:.0}% done, {:.0}% expected · {}",
            e.progress * 100.0,
            e.expected * 100.0,
            status
        );
        if e.pace_warning {
            println!(
                "{} weight is changing faster than a safe weekly rate",
                "warning:".yellow().bold()
            );
        }
        let trail = out
            .last_week
            .iter()
            .map(|(_, v)| v.map_or("·".to_string(), |v| format!("{v:.1}")))
            .collect::<Vec<_>>()
            .join("  ");
        println!("  {} {}", "last 7 days:".dimmed(), trail);
    });
    Ok(())
}
