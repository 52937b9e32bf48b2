use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use stamina::{
    config::{Config, Settings},
    logging,
    types::OutputFmt,
};

mod cli;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let fmt = if cli.json { OutputFmt::Json } else { OutputFmt::Pretty };

    let config_path = Config::default_path()?;
    let cfg = Config::load(&config_path)?;

    // config edits must work even when a stored value is broken
    let cmd = match cli.cmd {
        Commands::Config(cmd) => return commands::config::handle(cmd, cfg, &config_path, fmt),
        other => other,
    };

    let settings = Settings::from_config(&cfg)?;
    let level = match cli.verbose {
        0 => settings.log_level.clone(),
        1 => "info".to_string(),
        _ => "debug".to_string(),
    };
    logging::init(&level);

    let ctx = commands::Ctx::open(settings, fmt).await?;

    match cmd {
        Commands::Plan(cmd) => commands::plan::handle(cmd, &ctx).await?,
        Commands::Task(cmd) => commands::task::handle(cmd, &ctx).await?,
        Commands::Week(arg) => commands::progress::week(arg.date, &ctx).await?,
        Commands::Insights(arg) => commands::progress::insights(arg.date, &ctx).await?,
        Commands::Goal(arg) => commands::progress::goal(arg.date, &ctx).await?,
        Commands::Metric(cmd) => commands::metric::handle(cmd, &ctx).await?,
        Commands::Session(cmd) => commands::session::handle(cmd, &ctx).await?,
        Commands::Catalog(cmd) => commands::catalog::handle(cmd, &ctx)?,
        Commands::Profile(cmd) => commands::profile::handle(cmd, &ctx)?,
        Commands::Config(_) => {}
    }

    Ok(())
}
