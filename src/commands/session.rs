use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde::Serialize;
use stamina::{
    session::{LiveSession, SessionState, recovery},
    types::{WorkoutType, emit},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::{Ctx, today};
use crate::cli::SessionCmd;

const HELP: &str = "\
  done N            toggle set N
  set N REPS [KG]   edit set N
  add               add a set
  distance KM       record distance
  duration MIN      record duration
  note TEXT         attach a note
  next              record this exercise and move on
  status            show where you are
  end               finish and save
  quit              pause; resume later with `stamina session resume`";

#[derive(Serialize)]
struct SnapshotJson {
    pending: bool,
    task_id: Option<String>,
    exercise: Option<usize>,
    elapsed_seconds: Option<u64>,
    saved_at: Option<String>,
}

fn fmt_clock(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

fn print_status(s: &LiveSession) {
    let total = s.task().workouts.len();
    let Some(w) = s.current_workout() else {
        println!("{}", "  (no exercises)".dimmed());
        return;
    };
    println!(
        "{} {} {}",
        format!("[{}/{}]", s.exercise_index() + 1, total).yellow(),
        w.name.bold(),
        fmt_clock(s.elapsed_seconds()).dimmed()
    );

    let cur = s.current();
    for (i, set) in cur.sets.iter().enumerate() {
        let mark = if set.is_completed { "✓".green().bold() } else { "○".normal() };
        let weight = set.weight.map(|kg| format!(" @ {kg} kg")).unwrap_or_default();
        println!("  {} {} {} reps{}", format!("{:>2}", i + 1).yellow(), mark, set.reps, weight);
    }
    if w.kind != WorkoutType::Strength || cur.sets.is_empty() {
        let planned = w.duration_minutes.map(|m| format!("{m} min planned")).unwrap_or_default();
        println!("  {}", planned.dimmed());
    }
    if let Some(km) = cur.distance_km {
        println!("  distance {km} km");
    }
    if let Some(min) = cur.duration_minutes {
        println!("  duration {min} min");
    }
    if !cur.notes.is_empty() {
        println!("  {}", cur.notes.italic());
    }
    if s.rest_remaining() > 0 {
        println!("  {} {}s", "rest".blue(), s.rest_remaining());
    }
}

/// Apply one line of input. Returns true when the loop should stop.
async fn apply(s: &mut LiveSession, line: &str) -> bool {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return false;
    };
    let args: Vec<&str> = words.collect();
    let nth = |i: usize| args.get(i).copied().unwrap_or("");

    match cmd {
        "done" | "d" => match nth(0).parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
            Some(i) => match s.complete_set(i) {
                Some(true) => println!("{} set {} done, rest {}s", "ok:".green().bold(), i + 1, s.rest_remaining()),
                Some(false) => println!("{} set {} undone", "info:".blue().bold(), i + 1),
                None => println!("{} no set {}", "error:".red().bold(), i + 1),
            },
            None => println!("{} usage: done N", "error:".red().bold()),
        },

        "set" => {
            let idx = nth(0).parse::<usize>().ok().and_then(|n| n.checked_sub(1));
            let reps = nth(1).parse::<u32>().ok();
            let weight = match nth(2) {
                "" | "bw" => None,
                raw => match raw.parse::<f64>() {
                    Ok(kg) => Some(kg),
                    Err(_) => {
                        println!("{} bad weight `{}`", "error:".red().bold(), raw);
                        return false;
                    }
                },
            };
            match (idx, reps) {
                (Some(i), Some(r)) => {
                    if s.update_set(i, r, weight) {
                        println!("{} set {} = {} reps", "ok:".green().bold(), i + 1, r);
                    } else {
                        println!("{} no set {}", "error:".red().bold(), i + 1);
                    }
                }
                _ => println!("{} usage: set N REPS [KG]", "error:".red().bold()),
            }
        }

        "add" => {
            let i = s.add_set();
            println!("{} added set {}", "ok:".green().bold(), i + 1);
        }

        "distance" => match nth(0).parse::<f64>() {
            Ok(km) if km >= 0.0 => s.set_distance(km),
            _ => println!("{} usage: distance KM", "error:".red().bold()),
        },

        "duration" => match nth(0).parse::<u32>() {
            Ok(min) => s.set_duration(min),
            Err(_) => println!("{} usage: duration MIN", "error:".red().bold()),
        },

        "note" => s.set_notes(args.join(" ")),

        "next" | "n" => {
            if s.next_exercise() {
                print_status(s);
            } else {
                println!("{} last exercise; type `end` to finish", "info:".blue().bold());
            }
        }

        "status" | "s" => print_status(s),

        "end" => {
            let written = s.end_workout().await;
            if s.state() == SessionState::Ended {
                println!(
                    "{} saved {} workout(s) in {}",
                    "ok:".green().bold(),
                    written.len(),
                    fmt_clock(s.elapsed_seconds())
                );
                if s.task().is_completed {
                    println!("{} day complete", "ok:".green().bold());
                }
                return true;
            }
            println!("{} could not save results; try `end` again", "error:".red().bold());
        }

        "quit" | "q" => {
            pause(s);
            return true;
        }

        "help" | "?" => println!("{HELP}"),

        other => println!("{} unknown command `{}` (try `help`)", "error:".red().bold(), other),
    }
    false
}

fn pause(s: &LiveSession) {
    if s.save_state() {
        println!(
            "{} session paused; resume with `stamina session resume`",
            "info:".blue().bold()
        );
    } else {
        println!("{} could not save the session snapshot", "error:".red().bold());
    }
}

/// Read commands until the session ends, the user quits, or Ctrl-C.
async fn drive(mut s: LiveSession) -> Result<()> {
    print_status(&s);
    println!("{}", "type `help` for commands".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading input")? else {
                    debug!("stdin closed");
                    pause(&s);
                    break;
                };
                if apply(&mut s, line.trim()).await {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                pause(&s);
                break;
            }
        }
    }
    Ok(())
}

pub async fn handle(cmd: SessionCmd, ctx: &Ctx) -> Result<()> {
    let rest = ctx.settings.rest_seconds;
    match cmd {
        SessionCmd::Run(day) => {
            if ctx.snapshots.exists() {
                bail!("a paused session is waiting; `stamina session resume` or `stamina session discard`");
            }
            let plan = ctx.active_plan().await?;
            let date = day.date.unwrap_or_else(today);
            let task = plan
                .task_on(date)
                .cloned()
                .with_context(|| format!("{date} is outside the active plan"))?;
            if task.is_rest_day() {
                println!("{} {} is a rest day", "info:".blue().bold(), date);
                return Ok(());
            }

            let mut s = LiveSession::new(task, ctx.store.clone(), ctx.snapshots.clone(), rest);
            s.start_workout();
            drive(s).await?;
        }

        SessionCmd::Resume => match recovery::resume(&ctx.store, &ctx.snapshots, rest).await? {
            Some(s) => drive(s).await?,
            None => println!("{} nothing to resume", "info:".blue().bold()),
        },

        SessionCmd::Discard => {
            if recovery::discard(&ctx.snapshots)? {
                println!("{} discarded the paused session", "ok:".green().bold());
            } else {
                println!("{} nothing to discard", "info:".blue().bold());
            }
        }

        SessionCmd::Status => {
            let snap = ctx.snapshots.load()?;
            let out = SnapshotJson {
                pending: snap.is_some(),
                task_id: snap.as_ref().map(|s| s.task_id.clone()),
                exercise: snap.as_ref().map(|s| s.exercise_index + 1),
                elapsed_seconds: snap.as_ref().map(|s| s.elapsed_seconds),
                saved_at: snap.as_ref().map(|s| s.saved_at.to_rfc3339()),
            };
            emit(ctx.fmt, &out, || match &snap {
                Some(s) => println!(
                    "{} paused at exercise {} after {} (saved {})",
                    "info:".blue().bold(),
                    s.exercise_index + 1,
                    fmt_clock(s.elapsed_seconds),
                    s.saved_at.format("%Y-%m-%d %H:%M")
                ),
                None => println!("{} no paused session", "info:".blue().bold()),
            });
        }
    }
    Ok(())
}
