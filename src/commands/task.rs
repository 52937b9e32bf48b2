use anyhow::{Context, Result};
use chrono::NaiveDate;
use colored::Colorize;
use stamina::{
    models::{DailyTask, Plan},
    tracker::ExecutionTracker,
    types::emit,
};

use super::{Ctx, plan::day_marker, today};
use crate::cli::TaskCmd;

fn task_for(plan: &Plan, date: NaiveDate) -> Result<DailyTask> {
    plan.task_on(date)
        .cloned()
        .with_context(|| format!("{date} is outside the active plan ({} → {})", plan.start_date, plan.end_date()))
}

fn report(saved: bool, what: &str) {
    if saved {
        println!("{} {}", "ok:".green().bold(), what);
    } else {
        println!("{} could not save: {} (see log)", "error:".red().bold(), what);
    }
}

pub fn print_task(task: &DailyTask) {
    println!("{} {}", day_marker(task), task.date.to_string().cyan().bold());
    if task.is_rest_day() {
        println!("  {}", "rest day".dimmed());
    }
    for (i, w) in task.workouts.iter().enumerate() {
        let mark = if w.is_completed { "✓".green().bold() } else { "○".normal() };
        let detail = match (w.sets.len(), w.duration_minutes) {
            (0, Some(m)) => format!("{m} min"),
            (n, _) if n > 0 => format!("{}×{}", n, w.sets[0].reps),
            _ => String::new(),
        };
        println!(
            "  {} {} {} {} {}",
            format!("{:>2}", i + 1).yellow(),
            mark,
            w.name.bold(),
            detail.dimmed(),
            format!("{} kcal", w.calories).dimmed()
        );
        if !w.notes.is_empty() {
            println!("       {}", w.notes.italic());
        }
    }
    for (i, m) in task.meals.iter().enumerate() {
        let mark = if m.is_completed { "✓".green().bold() } else { "○".normal() };
        println!(
            "  {} {} {} {}",
            format!("m{}", i + 1).yellow(),
            mark,
            m.name,
            format!("{} kcal", m.calories).dimmed()
        );
    }
}

pub async fn handle(cmd: TaskCmd, ctx: &Ctx) -> Result<()> {
    let plan = ctx.active_plan().await?;
    let tracker = ExecutionTracker::new(ctx.store.clone());

    match cmd {
        TaskCmd::Show(day) => {
            let task = task_for(&plan, day.date.unwrap_or_else(today))?;
            emit(ctx.fmt, &task, || print_task(&task));
        }

        TaskCmd::Done(day) => {
            let mut task = task_for(&plan, day.date.unwrap_or_else(today))?;
            let saved = tracker.mark_task(&mut task, true).await;
            report(saved, &format!("{} marked done", task.date));
        }

        TaskCmd::Undo(day) => {
            let mut task = task_for(&plan, day.date.unwrap_or_else(today))?;
            let saved = tracker.mark_task(&mut task, false).await;
            report(saved, &format!("{} no longer done", task.date));
        }

        TaskCmd::Skip(day) => {
            let mut task = task_for(&plan, day.date.unwrap_or_else(today))?;
            let saved = tracker.toggle_skip(&mut task).await;
            let what = if task.is_skipped { "skipped" } else { "un-skipped" };
            report(saved, &format!("{} {}", task.date, what));
        }

        TaskCmd::Workout { index, day } => {
            let mut task = task_for(&plan, day.date.unwrap_or_else(today))?;
            let Some(i) = index.checked_sub(1).filter(|i| *i < task.workouts.len()) else {
                println!("{} no workout at index {}", "error:".red().bold(), index);
                return Ok(());
            };
            let saved = tracker.toggle_workout_completion(&mut task, i).await;
            let state = if task.workouts[i].is_completed { "done" } else { "not done" };
            report(saved, &format!("`{}` {}", task.workouts[i].name, state));
            if saved && task.is_completed {
                println!("{} every workout of {} is done", "info:".blue().bold(), task.date);
            }
        }

        TaskCmd::Meal { index, day } => {
            let mut task = task_for(&plan, day.date.unwrap_or_else(today))?;
            let Some(i) = index.checked_sub(1).filter(|i| *i < task.meals.len()) else {
                println!("{} no meal at index {}", "error:".red().bold(), index);
                return Ok(());
            };
            let saved = tracker.toggle_meal(&mut task, i).await;
            let state = if task.meals[i].is_completed { "eaten" } else { "not eaten" };
            report(saved, &format!("{} {}", task.meals[i].name, state));
        }
    }
    Ok(())
}
