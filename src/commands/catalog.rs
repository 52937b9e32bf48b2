use anyhow::Result;
use colored::Colorize;
use itertools::Itertools;
use serde::Serialize;
use stamina::types::{ALLOWED_MUSCLES, best_suggestion, canonical_muscle, emit};

use super::{Ctx, print_aligned};
use crate::cli::CatalogCmd;

#[derive(Serialize)]
struct ExJson<'a> {
    idx: usize,
    name: &'a str,
    muscles: String,
    equipment: String,
    difficulty: String,
    high_impact: bool,
    avoid_for: &'a [String],
}

pub fn handle(cmd: CatalogCmd, ctx: &Ctx) -> Result<()> {
    match cmd {
        CatalogCmd::List { muscle } => {
            let filter = match muscle {
                Some(raw) => match canonical_muscle(&raw) {
                    Some(m) => Some(m),
                    None => {
                        let hint = best_suggestion(&raw, ALLOWED_MUSCLES.keys())
                            .map(|s| format!(" (did you mean `{}`?)", s.green()))
                            .unwrap_or_default();
                        println!("{} unknown muscle group `{}`{}", "error:".red().bold(), raw, hint);
                        let allowed = ALLOWED_MUSCLES.keys().sorted().join(", ");
                        println!("{} {}", "Allowed muscles:".cyan().bold(), allowed);
                        return Ok(());
                    }
                },
                None => None,
            };

            let rows: Vec<ExJson> = ctx
                .catalog
                .exercises()
                .iter()
                .filter(|e| filter.is_none_or(|m| e.targets(m)))
                .enumerate()
                .map(|(i, e)| ExJson {
                    idx: i + 1,
                    name: &e.name,
                    muscles: e.muscles.iter().join(", "),
                    equipment: e.equipment.iter().join(", "),
                    difficulty: e.difficulty.to_string(),
                    high_impact: e.high_impact,
                    avoid_for: &e.avoid_for,
                })
                .collect();

            emit(ctx.fmt, &rows, || {
                println!("{}", "Exercises:".cyan().bold());
                if rows.is_empty() {
                    println!("{}", "  (no exercises found)".dimmed());
                    return;
                }

                let idx_w = rows.len().to_string().len();
                let lines = rows
                    .iter()
                    .map(|ex| {
                        let impact = if ex.high_impact { " !".red().to_string() } else { String::new() };
                        let left = format!(
                            " {} • {} ({}){}",
                            format!("{:>idx_w$}", ex.idx).yellow(),
                            ex.name.bold(),
                            ex.muscles.yellow(),
                            impact
                        );
                        let right = format!("{} · {}", ex.difficulty, ex.equipment)
                            .dimmed()
                            .to_string();
                        (left, right)
                    })
                    .collect();
                print_aligned(lines);
            });
        }
    }
    Ok(())
}
