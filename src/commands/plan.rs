use anyhow::{Result, bail};
use colored::Colorize;
use serde::Serialize;
use stamina::{
    generator::PlanGenerator,
    models::{DailyTask, Plan, PlanGoal},
    types::{PlanStatus, emit},
};
use tracing::info;

use super::{Ctx, print_aligned, today};
use crate::cli::PlanCmd;

#[derive(Serialize)]
struct PlanJson<'a> {
    id: &'a str,
    name: &'a str,
    goal: String,
    status: String,
    start_date: String,
    end_date: String,
    days: u32,
    workout_days: usize,
}

impl<'a> From<&'a Plan> for PlanJson<'a> {
    fn from(p: &'a Plan) -> Self {
        Self {
            id: &p.id,
            name: &p.name,
            goal: p.goal.goal.to_string(),
            status: p.status.to_string(),
            start_date: p.start_date.to_string(),
            end_date: p.end_date().to_string(),
            days: p.duration_days,
            workout_days: p.tasks.iter().filter(|t| !t.is_rest_day()).count(),
        }
    }
}

pub fn day_marker(task: &DailyTask) -> colored::ColoredString {
    if task.is_completed {
        "✓".green().bold()
    } else if task.is_skipped {
        "–".yellow()
    } else if task.is_rest_day() {
        "·".dimmed()
    } else {
        "○".normal()
    }
}

pub async fn handle(cmd: PlanCmd, ctx: &Ctx) -> Result<()> {
    match cmd {
        PlanCmd::Generate {
            goal,
            target,
            days,
            start,
            by,
            professional,
            seed,
        } => {
            if target <= 0.0 {
                bail!("target weight must be positive");
            }
            let profile = ctx.profile()?;
            let start_date = start.unwrap_or_else(today);
            if by.is_some_and(|d| d <= start_date) {
                bail!("--by must be after the plan start ({start_date})");
            }

            let plan_goal = PlanGoal {
                goal,
                start_weight: profile.weight_kg,
                target_weight: target,
                start_date,
                target_date: by,
                professional,
            };

            let mut generator = match seed {
                Some(s) => PlanGenerator::seeded(&ctx.catalog, s),
                None => PlanGenerator::from_entropy(&ctx.catalog),
            };
            let mut plan = generator.generate(&profile, plan_goal, days)?;
            ctx.store.set_active_plan(&mut plan).await?;
            info!(plan_id = %plan.id, "generated plan");

            let summary = PlanJson::from(&plan);
            emit(ctx.fmt, &summary, || {
                println!(
                    "{} created plan `{}` ({} days, {} with workouts)",
                    "ok:".green().bold(),
                    plan.name.bold(),
                    summary.days,
                    summary.workout_days
                );
                if summary.workout_days == 0 {
                    println!(
                        "{} no exercise fits your profile; check equipment and conditions",
                        "warning:".yellow().bold()
                    );
                }
            });
        }

        PlanCmd::Show { all } => {
            let plan = ctx.active_plan().await?;
            let from = today();

            let shown: Vec<&DailyTask> = if all {
                plan.tasks.iter().collect()
            } else {
                plan.tasks.iter().filter(|t| t.date >= from).take(7).collect()
            };

            emit(ctx.fmt, &plan, || {
                println!(
                    "{} {} → {}",
                    plan.name.cyan().bold(),
                    plan.start_date,
                    plan.end_date()
                );
                if shown.is_empty() {
                    println!("{}", "  (no upcoming days)".dimmed());
                    return;
                }

                let rows = shown
                    .iter()
                    .map(|t| {
                        let what = if t.is_rest_day() {
                            "rest".dimmed().to_string()
                        } else {
                            t.workouts
                                .iter()
                                .map(|w| w.name.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        };
                        let today_mark = if t.date == from { " ←".yellow().to_string() } else { String::new() };
                        let left = format!(" {} {}{}  {}", day_marker(t), t.date, today_mark, what);
                        let kcal: u32 = t.meals.iter().map(|m| m.calories).sum();
                        let right = format!("{}/{} meals · {} kcal", t.meals_done(), t.meals.len(), kcal)
                            .dimmed()
                            .to_string();
                        (left, right)
                    })
                    .collect();
                print_aligned(rows);
            });
        }

        PlanCmd::List { status } => {
            let mut plans = Vec::new();
            for s in status.map_or(vec![PlanStatus::Active, PlanStatus::Archived], |s| vec![s]) {
                plans.extend(ctx.store.plans_by_status(s).await?);
            }
            let rows: Vec<PlanJson> = plans.iter().map(PlanJson::from).collect();

            emit(ctx.fmt, &rows, || {
                println!("{}", "Plans:".cyan().bold());
                if rows.is_empty() {
                    println!("{}", "  (no plans found)".dimmed());
                    return;
                }
                let lines = rows
                    .iter()
                    .map(|p| {
                        let status = match p.status.as_str() {
                            "active" => p.status.green().bold(),
                            _ => p.status.dimmed(),
                        };
                        let left = format!(" {} • {} ({})", status, p.name.bold(), p.goal.yellow());
                        let right = format!("{} → {} · {}", p.start_date, p.end_date, p.id)
                            .dimmed()
                            .to_string();
                        (left, right)
                    })
                    .collect();
                print_aligned(lines);
            });
        }

        PlanCmd::Archive => {
            let count = ctx.store.archive_active_plan().await?;
            if count == 0 {
                println!("{} no active plan to archive", "warning:".yellow().bold());
            } else {
                println!("{} archived the active plan", "ok:".green().bold());
            }
        }

        PlanCmd::Delete { plan } => {
            if ctx.store.delete_plan(&plan).await? {
                println!("{} deleted plan `{}`", "ok:".green().bold(), plan);
            } else {
                println!("{} no such plan `{}`", "error:".red().bold(), plan);
            }
        }
    }
    Ok(())
}
