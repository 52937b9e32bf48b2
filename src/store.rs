use std::collections::HashMap;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use itertools::Itertools;
use sqlx::{Row, Sqlite, Transaction, sqlite::SqliteRow};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::{
    db::DB,
    models::{DailyTask, Meal, Plan, PlanGoal, Workout, WorkoutSet},
    types::{PlanStatus, parse_display},
};

const DATE_FMT: &str = "%Y-%m-%d";

/// Ids bound per `IN (...)` list; SQLite caps host parameters per statement.
const BIND_CHUNK: usize = 500;

/// Broadcast after every mutation. Nothing in the engine depends on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanChange {
    PlanActivated { plan_id: String },
    PlansArchived { count: u64 },
    TaskUpdated { task_id: String },
    PlanDeleted { plan_id: String },
}

/// Single source of truth for plans and everything they own.
#[derive(Clone)]
pub struct PlanStore {
    pool: DB,
    events: broadcast::Sender<PlanChange>,
}

pub fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).with_context(|| format!("invalid date `{s}`"))
}

fn parse_enum<T>(raw: &str, what: &str) -> Result<T>
where
    T: clap::ValueEnum + std::fmt::Display,
{
    parse_display(raw).ok_or_else(|| anyhow!("unknown {what} `{raw}` in database"))
}

fn q_marks(n: usize) -> String {
    std::iter::repeat("?").take(n).collect::<Vec<_>>().join(",")
}

impl PlanStore {
    pub fn new(pool: DB) -> Self {
        let (events, _) = broadcast::channel(32);
        Self { pool, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlanChange> {
        self.events.subscribe()
    }

    fn notify(&self, change: PlanChange) {
        if self.events.send(change).is_err() {
            debug!("plan change dropped, no subscribers");
        }
    }

    /* ───────────────────────────── lifecycle ──────────────────────────── */

    /// Flip every active plan to archived. Returns how many were flipped.
    pub async fn archive_active_plan(&self) -> Result<u64> {
        let res = sqlx::query("UPDATE plans SET status = ? WHERE status = ?")
            .bind(PlanStatus::Archived.to_string())
            .bind(PlanStatus::Active.to_string())
            .execute(&self.pool)
            .await?;

        let count = res.rows_affected();
        if count > 0 {
            info!(count, "archived active plans");
            self.notify(PlanChange::PlansArchived { count });
        }
        Ok(count)
    }

    /// Archive whatever is active, then insert `plan` as the new active plan.
    ///
    /// The two steps are sequenced but not one transaction: if the insert
    /// fails after the archive succeeded, no plan is active until a retry.
    pub async fn set_active_plan(&self, plan: &mut Plan) -> Result<()> {
        self.archive_active_plan().await?;

        plan.status = PlanStatus::Active;
        self.insert_plan(plan).await?;

        info!(plan_id = %plan.id, name = %plan.name, "activated plan");
        self.notify(PlanChange::PlanActivated {
            plan_id: plan.id.clone(),
        });
        Ok(())
    }

    /// Insert a whole plan tree in one transaction.
    pub async fn insert_plan(&self, plan: &Plan) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let goal = &plan.goal;
        sqlx::query(
            r#"INSERT INTO plans
                 (id,name,goal,start_weight,target_weight,goal_start,target_date,
                  professional,start_date,duration_days,status,created_at)
               VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,datetime('now'))"#,
        )
        .bind(&plan.id)
        .bind(&plan.name)
        .bind(goal.goal.to_string())
        .bind(goal.start_weight)
        .bind(goal.target_weight)
        .bind(fmt_date(goal.start_date))
        .bind(goal.target_date.map(fmt_date))
        .bind(goal.professional)
        .bind(fmt_date(plan.start_date))
        .bind(plan.duration_days)
        .bind(plan.status.to_string())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("inserting plan `{}`", plan.name))?;

        for task in &plan.tasks {
            sqlx::query(
                r#"INSERT INTO daily_tasks (id,plan_id,date,is_completed,is_skipped)
                   VALUES (?1,?2,?3,?4,?5)"#,
            )
            .bind(&task.id)
            .bind(&plan.id)
            .bind(fmt_date(task.date))
            .bind(task.is_completed)
            .bind(task.is_skipped)
            .execute(&mut *tx)
            .await?;

            for (order_idx, w) in task.workouts.iter().enumerate() {
                sqlx::query(
                    r#"INSERT INTO workouts
                         (id,task_id,order_index,name,kind,duration_min,distance_km,
                          calories,is_completed,notes)
                       VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)"#,
                )
                .bind(&w.id)
                .bind(&task.id)
                .bind(order_idx as i64)
                .bind(&w.name)
                .bind(w.kind.to_string())
                .bind(w.duration_minutes)
                .bind(w.distance_km)
                .bind(w.calories)
                .bind(w.is_completed)
                .bind(&w.notes)
                .execute(&mut *tx)
                .await?;

                insert_sets(&mut tx, &w.id, &w.sets).await?;
            }

            for (order_idx, m) in task.meals.iter().enumerate() {
                sqlx::query(
                    r#"INSERT INTO meals (id,task_id,order_index,name,kind,calories,is_completed)
                       VALUES (?1,?2,?3,?4,?5,?6,?7)"#,
                )
                .bind(&m.id)
                .bind(&task.id)
                .bind(order_idx as i64)
                .bind(&m.name)
                .bind(m.kind.to_string())
                .bind(m.calories)
                .bind(m.is_completed)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_plan(&self, plan_id: &str) -> Result<bool> {
        let res = sqlx::query("DELETE FROM plans WHERE id = ?")
            .bind(plan_id)
            .execute(&self.pool)
            .await?;

        let deleted = res.rows_affected() > 0;
        if deleted {
            self.notify(PlanChange::PlanDeleted {
                plan_id: plan_id.to_string(),
            });
        }
        Ok(deleted)
    }

    /* ────────────────────────────── queries ───────────────────────────── */

    pub async fn active_plan(&self) -> Result<Option<Plan>> {
        let id: Option<String> =
            sqlx::query_scalar("SELECT id FROM plans WHERE status = ? ORDER BY created_at DESC LIMIT 1")
                .bind(PlanStatus::Active.to_string())
                .fetch_optional(&self.pool)
                .await?;

        match id {
            Some(id) => self.find_plan(&id).await,
            None => Ok(None),
        }
    }

    pub async fn plans_by_status(&self, status: PlanStatus) -> Result<Vec<Plan>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM plans WHERE status = ? ORDER BY created_at, name")
                .bind(status.to_string())
                .fetch_all(&self.pool)
                .await?;

        let mut plans = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(plan) = self.find_plan(&id).await? {
                plans.push(plan);
            }
        }
        Ok(plans)
    }

    pub async fn count_by_status(&self, status: PlanStatus) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT count(*) FROM plans WHERE status = ?")
            .bind(status.to_string())
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn find_plan(&self, plan_id: &str) -> Result<Option<Plan>> {
        let row = sqlx::query("SELECT * FROM plans WHERE id = ?")
            .bind(plan_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let goal = PlanGoal {
            goal: parse_enum(row.get::<&str, _>("goal"), "goal")?,
            start_weight: row.get("start_weight"),
            target_weight: row.get("target_weight"),
            start_date: parse_date(row.get("goal_start"))?,
            target_date: row
                .get::<Option<&str>, _>("target_date")
                .map(parse_date)
                .transpose()?,
            professional: row.get("professional"),
        };

        let task_rows = sqlx::query("SELECT * FROM daily_tasks WHERE plan_id = ? ORDER BY date")
            .bind(plan_id)
            .fetch_all(&self.pool)
            .await?;
        let tasks = self.hydrate(task_rows).await?;

        Ok(Some(Plan {
            id: row.get("id"),
            name: row.get("name"),
            goal,
            start_date: parse_date(row.get("start_date"))?,
            duration_days: row.get("duration_days"),
            status: parse_enum(row.get::<&str, _>("status"), "plan status")?,
            tasks,
        }))
    }

    pub async fn find_task(&self, task_id: &str) -> Result<Option<DailyTask>> {
        let rows = sqlx::query("SELECT * FROM daily_tasks WHERE id = ?")
            .bind(task_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(self.hydrate(rows).await?.pop())
    }

    /// Tasks of one plan with `from <= date <= to`.
    pub async fn tasks_in_range(
        &self,
        plan_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyTask>> {
        let rows = sqlx::query(
            "SELECT * FROM daily_tasks WHERE plan_id = ? AND date >= ? AND date <= ? ORDER BY date",
        )
        .bind(plan_id)
        .bind(fmt_date(from))
        .bind(fmt_date(to))
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    /// Write a task's flags and its workouts' actuals back.
    /// Planned fields that the session never touches are left as stored.
    pub async fn save_task(&self, task: &DailyTask) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let res = sqlx::query("UPDATE daily_tasks SET is_completed = ?, is_skipped = ? WHERE id = ?")
            .bind(task.is_completed)
            .bind(task.is_skipped)
            .bind(&task.id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            bail!("task `{}` no longer exists", task.id);
        }

        for w in &task.workouts {
            sqlx::query(
                r#"UPDATE workouts
                   SET duration_min = ?, distance_km = ?, is_completed = ?, notes = ?
                   WHERE id = ? AND task_id = ?"#,
            )
            .bind(w.duration_minutes)
            .bind(w.distance_km)
            .bind(w.is_completed)
            .bind(&w.notes)
            .bind(&w.id)
            .bind(&task.id)
            .execute(&mut *tx)
            .await?;

            sqlx::query("DELETE FROM workout_sets WHERE workout_id = ?")
                .bind(&w.id)
                .execute(&mut *tx)
                .await?;
            insert_sets(&mut tx, &w.id, &w.sets).await?;
        }

        for m in &task.meals {
            sqlx::query("UPDATE meals SET is_completed = ? WHERE id = ? AND task_id = ?")
                .bind(m.is_completed)
                .bind(&m.id)
                .bind(&task.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(task_id = %task.id, "saved task");
        self.notify(PlanChange::TaskUpdated {
            task_id: task.id.clone(),
        });
        Ok(())
    }

    /* ───────────────────────────── hydration ──────────────────────────── */

    /// Attach workouts, sets and meals to bare task rows.
    async fn hydrate(&self, task_rows: Vec<SqliteRow>) -> Result<Vec<DailyTask>> {
        if task_rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut tasks = task_rows
            .iter()
            .map(|r| {
                Ok(DailyTask {
                    id: r.get("id"),
                    date: parse_date(r.get("date"))?,
                    workouts: Vec::new(),
                    meals: Vec::new(),
                    is_completed: r.get("is_completed"),
                    is_skipped: r.get("is_skipped"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let task_ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        let workout_rows = self.rows_in("workouts", "task_id", &task_ids).await?;

        let mut workouts_by_task: HashMap<String, Vec<Workout>> = workout_rows
            .iter()
            .map(|r| {
                let w = Workout {
                    id: r.get("id"),
                    name: r.get("name"),
                    kind: parse_enum(r.get::<&str, _>("kind"), "workout type")?,
                    sets: Vec::new(),
                    duration_minutes: r.get("duration_min"),
                    distance_km: r.get("distance_km"),
                    calories: r.get("calories"),
                    is_completed: r.get("is_completed"),
                    notes: r.get("notes"),
                };
                Ok((r.get::<String, _>("task_id"), w))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .into_group_map();

        let workout_ids: Vec<String> = workouts_by_task
            .values()
            .flatten()
            .map(|w| w.id.clone())
            .collect();
        if !workout_ids.is_empty() {
            let ids: Vec<&str> = workout_ids.iter().map(String::as_str).collect();
            let mut sets_by_workout: HashMap<String, Vec<WorkoutSet>> = self
                .rows_in("workout_sets", "workout_id", &ids)
                .await?
                .iter()
                .map(|r| {
                    (
                        r.get::<String, _>("workout_id"),
                        WorkoutSet {
                            reps: r.get("reps"),
                            weight: r.get("weight"),
                            is_completed: r.get("is_completed"),
                        },
                    )
                })
                .into_group_map();

            for w in workouts_by_task.values_mut().flatten() {
                w.sets = sets_by_workout.remove(&w.id).unwrap_or_default();
            }
        }

        let mut meals_by_task: HashMap<String, Vec<Meal>> = self
            .rows_in("meals", "task_id", &task_ids)
            .await?
            .iter()
            .map(|r| {
                let m = Meal {
                    id: r.get("id"),
                    name: r.get("name"),
                    kind: parse_enum(r.get::<&str, _>("kind"), "meal kind")?,
                    calories: r.get("calories"),
                    is_completed: r.get("is_completed"),
                };
                Ok((r.get::<String, _>("task_id"), m))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .into_group_map();

        for task in &mut tasks {
            task.workouts = workouts_by_task.remove(&task.id).unwrap_or_default();
            task.meals = meals_by_task.remove(&task.id).unwrap_or_default();
        }
        Ok(tasks)
    }

    /// Rows of a child table whose `column` is one of `ids`, in `order_index`
    /// order per parent. Long id lists are split across several queries.
    async fn rows_in(&self, table: &str, column: &str, ids: &[&str]) -> Result<Vec<SqliteRow>> {
        let mut rows = Vec::new();
        for chunk in ids.chunks(BIND_CHUNK) {
            let sql = format!(
                "SELECT * FROM {table} WHERE {column} IN ({}) ORDER BY {column}, order_index",
                q_marks(chunk.len())
            );
            let mut q = sqlx::query(&sql);
            for id in chunk {
                q = q.bind(*id);
            }
            rows.extend(q.fetch_all(&self.pool).await?);
        }
        Ok(rows)
    }
}

async fn insert_sets(tx: &mut Transaction<'_, Sqlite>, workout_id: &str, sets: &[WorkoutSet]) -> Result<()> {
    for (order_idx, s) in sets.iter().enumerate() {
        sqlx::query(
            r#"INSERT INTO workout_sets (workout_id,order_index,reps,weight,is_completed)
               VALUES (?1,?2,?3,?4,?5)"#,
        )
        .bind(workout_id)
        .bind(order_idx as i64)
        .bind(s.reps)
        .bind(s.weight)
        .bind(s.is_completed)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
