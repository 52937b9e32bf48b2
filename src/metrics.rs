use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::try_join_all;
use sqlx::Row;

use crate::{
    db::DB,
    models::{MetricSample, new_id},
    store::{fmt_date, parse_date},
    types::{MetricKind, parse_display},
};

/// Read access to the health metric time series.
#[async_trait]
pub trait MetricProvider: Send + Sync {
    /// Samples of `kind` with `from <= date <= to`, oldest first.
    async fn samples(&self, kind: MetricKind, from: NaiveDate, to: NaiveDate) -> Result<Vec<MetricSample>>;

    async fn latest(&self, kind: MetricKind, on_or_before: NaiveDate) -> Result<Option<MetricSample>> {
        let all = self.samples(kind, NaiveDate::MIN, on_or_before).await?;
        Ok(all.into_iter().last())
    }
}

/// Metrics kept in the local database next to the plans.
#[derive(Clone)]
pub struct SqliteMetrics {
    pool: DB,
}

impl SqliteMetrics {
    pub fn new(pool: DB) -> Self {
        Self { pool }
    }

    pub async fn record(&self, kind: MetricKind, date: NaiveDate, value: f64) -> Result<()> {
        sqlx::query("INSERT INTO metrics (id, kind, recorded_on, value) VALUES (?1, ?2, ?3, ?4)")
            .bind(new_id())
            .bind(kind.to_string())
            .bind(fmt_date(date))
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MetricProvider for SqliteMetrics {
    async fn samples(&self, kind: MetricKind, from: NaiveDate, to: NaiveDate) -> Result<Vec<MetricSample>> {
        let rows = sqlx::query(
            r#"
            SELECT kind, recorded_on, value
            FROM   metrics
            WHERE  kind = ? AND recorded_on >= ? AND recorded_on <= ?
            ORDER  BY recorded_on, rowid
            "#,
        )
        .bind(kind.to_string())
        .bind(fmt_date(from))
        .bind(fmt_date(to))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                let raw: &str = r.get("kind");
                Ok(MetricSample {
                    date: parse_date(r.get("recorded_on"))?,
                    kind: parse_display(raw).unwrap_or(kind),
                    value: r.get("value"),
                })
            })
            .collect()
    }
}

/// Latest reading per day over `days`, one query per day run concurrently.
pub async fn daily_latest<P: MetricProvider + ?Sized>(
    provider: &P,
    kind: MetricKind,
    days: &[NaiveDate],
) -> Result<Vec<(NaiveDate, Option<f64>)>> {
    let per_day = days.iter().map(|&day| async move {
        let samples = provider.samples(kind, day, day).await?;
        Ok::<_, anyhow::Error>((day, samples.last().map(|s| s.value)))
    });
    try_join_all(per_day).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[tokio::test]
    async fn records_and_queries_by_range() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = SqliteMetrics::new(db::open(&dir.path().join("m.db")).await.unwrap());

        metrics.record(MetricKind::Weight, d(1), 72.0).await.unwrap();
        metrics.record(MetricKind::Weight, d(5), 71.2).await.unwrap();
        metrics.record(MetricKind::Weight, d(5), 71.0).await.unwrap();
        metrics.record(MetricKind::BodyFat, d(5), 22.0).await.unwrap();

        let weights = metrics.samples(MetricKind::Weight, d(1), d(10)).await.unwrap();
        assert_eq!(weights.len(), 3);
        assert!(weights.iter().all(|s| s.kind == MetricKind::Weight));

        let latest = metrics.latest(MetricKind::Weight, d(10)).await.unwrap().unwrap();
        assert_eq!(latest.value, 71.0);
        assert!(metrics.latest(MetricKind::Waist, d(10)).await.unwrap().is_none());

        let series = daily_latest(&metrics, MetricKind::Weight, &[d(1), d(2), d(5)]).await.unwrap();
        assert_eq!(series, vec![(d(1), Some(72.0)), (d(2), None), (d(5), Some(71.0))]);
    }
}
