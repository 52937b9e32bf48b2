use std::path::Path;

use anyhow::{Context, Result};
use sqlx::{
    Executor, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub type DB = SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS plans (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    goal            TEXT NOT NULL,
    start_weight    REAL NOT NULL,
    target_weight   REAL NOT NULL,
    goal_start      TEXT NOT NULL,
    target_date     TEXT,
    professional    INTEGER NOT NULL DEFAULT 0,
    start_date      TEXT NOT NULL,
    duration_days   INTEGER NOT NULL,
    status          TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS daily_tasks (
    id              TEXT PRIMARY KEY,
    plan_id         TEXT NOT NULL REFERENCES plans(id) ON DELETE CASCADE,
    date            TEXT NOT NULL,
    is_completed    INTEGER NOT NULL DEFAULT 0,
    is_skipped      INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS daily_tasks_plan_date ON daily_tasks(plan_id, date);

CREATE TABLE IF NOT EXISTS workouts (
    id              TEXT PRIMARY KEY,
    task_id         TEXT NOT NULL REFERENCES daily_tasks(id) ON DELETE CASCADE,
    order_index     INTEGER NOT NULL,
    name            TEXT NOT NULL,
    kind            TEXT NOT NULL,
    duration_min    INTEGER,
    distance_km     REAL,
    calories        INTEGER NOT NULL DEFAULT 0,
    is_completed    INTEGER NOT NULL DEFAULT 0,
    notes           TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS workout_sets (
    workout_id      TEXT NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
    order_index     INTEGER NOT NULL,
    reps            INTEGER NOT NULL,
    weight          REAL,
    is_completed    INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (workout_id, order_index)
);

CREATE TABLE IF NOT EXISTS meals (
    id              TEXT PRIMARY KEY,
    task_id         TEXT NOT NULL REFERENCES daily_tasks(id) ON DELETE CASCADE,
    order_index     INTEGER NOT NULL,
    name            TEXT NOT NULL,
    kind            TEXT NOT NULL,
    calories        INTEGER NOT NULL,
    is_completed    INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS metrics (
    id              TEXT PRIMARY KEY,
    kind            TEXT NOT NULL,
    recorded_on     TEXT NOT NULL,
    value           REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS metrics_kind_date ON metrics(kind, recorded_on);
"#;

pub async fn open(path: &Path) -> Result<DB> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))?;

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &DB) -> Result<()> {
    pool.execute(SCHEMA).await.context("Failed to create schema")?;
    Ok(())
}
