use anyhow::{Result, bail};
use chrono::{Days, NaiveDate};
use colored::Colorize;
use stamina::{metrics::daily_latest, types::emit};

use super::{Ctx, today};
use crate::cli::MetricCmd;

pub async fn handle(cmd: MetricCmd, ctx: &Ctx) -> Result<()> {
    match cmd {
        MetricCmd::Log { kind, value, date } => {
            if !value.is_finite() || value <= 0.0 {
                bail!("{kind} must be a positive number");
            }
            let date = date.unwrap_or_else(today);
            ctx.metrics.record(kind, date, value).await?;
            println!("{} {} {} on {}", "ok:".green().bold(), kind, value, date);
        }

        MetricCmd::List { kind, days } => {
            let end = today();
            let span: Vec<NaiveDate> = (0..u64::from(days.max(1)))
                .rev()
                .filter_map(|n| end.checked_sub_days(Days::new(n)))
                .collect();
            let series = daily_latest(&ctx.metrics, kind, &span).await?;

            emit(ctx.fmt, &series, || {
                println!("{} {}", "Readings:".cyan().bold(), kind.to_string().yellow());
                let logged: Vec<_> = series.iter().filter_map(|(d, v)| v.map(|v| (d, v))).collect();
                if logged.is_empty() {
                    println!("{}", "  (nothing logged)".dimmed());
                }
                for (d, v) in logged {
                    println!("  {} {}", d.to_string().dimmed(), format!("{v:.1}").bold());
                }
            });
        }
    }
    Ok(())
}
