use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use colored::Colorize;
use stamina::{
    catalog::Catalog,
    config::Settings,
    db,
    metrics::SqliteMetrics,
    models::{Plan, UserProfile},
    session::SnapshotStore,
    store::PlanStore,
    types::OutputFmt,
};

pub mod catalog;
pub mod config;
pub mod metric;
pub mod plan;
pub mod profile;
pub mod progress;
pub mod session;
pub mod task;

/// Everything a command handler needs, opened once per invocation.
pub struct Ctx {
    pub settings: Settings,
    pub store: PlanStore,
    pub metrics: SqliteMetrics,
    pub snapshots: SnapshotStore,
    pub catalog: Catalog,
    pub fmt: OutputFmt,
}

impl Ctx {
    pub async fn open(settings: Settings, fmt: OutputFmt) -> Result<Self> {
        let catalog = match &settings.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::bundled()?,
        };
        let pool = db::open(&settings.db_path).await?;
        Ok(Self {
            store: PlanStore::new(pool.clone()),
            metrics: SqliteMetrics::new(pool),
            snapshots: SnapshotStore::new(&settings.data_dir),
            catalog,
            settings,
            fmt,
        })
    }

    pub fn profile(&self) -> Result<UserProfile> {
        stamina::profile::load(&self.settings.profile_path())?
            .context("no profile yet; create one with `stamina profile set`")
    }

    pub async fn active_plan(&self) -> Result<Plan> {
        self.store
            .active_plan()
            .await?
            .context("no active plan; create one with `stamina plan generate`")
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Printable width of a string that may carry ANSI color codes.
pub fn plain_len(s: &str) -> usize {
    let mut n = 0;
    let mut esc = false;
    for c in s.chars() {
        match (esc, c) {
            (true, 'm') => esc = false,
            (true, _) => {}
            (false, '\u{1b}') => esc = true,
            (false, _) => n += 1,
        }
    }
    n
}

/// Print `left | right` rows with the bars lined up.
pub fn print_aligned(rows: Vec<(String, String)>) {
    let pad_plain = rows.iter().map(|(l, _)| plain_len(l)).max().unwrap_or(0);
    for (l, r) in rows {
        if r.is_empty() {
            println!("{}", l);
        } else {
            let pad = pad_plain + (l.len() - plain_len(&l));
            println!("{:<pad$} {} {}", l, "|".blue(), r, pad = pad);
        }
    }
}

#[cfg(test)]
mod tests {
    use stamina::config::Config;

    use super::*;

    fn settings(dir: &std::path::Path) -> Settings {
        let mut cfg = Config::default();
        cfg.map.insert("data_dir".into(), dir.display().to_string());
        Settings::from_config(&cfg).unwrap()
    }

    #[tokio::test]
    async fn open_loads_the_bundled_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Ctx::open(settings(dir.path()), OutputFmt::Pretty).await.unwrap();
        assert!(!ctx.catalog.exercises().is_empty());
    }

    #[tokio::test]
    async fn open_fails_on_a_broken_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exercises.toml");
        std::fs::write(&path, "[[exercise]]\nname = ").unwrap();

        let mut s = settings(dir.path());
        s.catalog_path = Some(path);
        assert!(Ctx::open(s, OutputFmt::Pretty).await.is_err());

        let mut s = settings(dir.path());
        s.catalog_path = Some(dir.path().join("missing.toml"));
        assert!(Ctx::open(s, OutputFmt::Pretty).await.is_err());
    }
}
