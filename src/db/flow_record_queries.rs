use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::error;

use crate::models::{DailyRecord, WindowAggregate};

/// Appends every record in one transaction. Rows are never merged, so
/// appending the same day twice leaves duplicates behind.
pub async fn append(pool: &SqlitePool, records: &[DailyRecord]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await.map_err(|e| {
        error!("Failed to begin append transaction: {}", e);
        e
    })?;

    for (i, r) in records.iter().enumerate() {
        if let Err(e) = sqlx::query(
            r#"
            INSERT INTO flow_records (code, name, net, val, date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&r.code)
        .bind(&r.name)
        .bind(r.net)
        .bind(r.val)
        .bind(r.date)
        .execute(&mut *tx)
        .await
        {
            error!(
                "Failed to append flow record {} (code: {}, date: {}): {}",
                i, r.code, r.date, e
            );
            return Err(e);
        }
    }

    tx.commit().await.map_err(|e| {
        error!("Failed to commit append transaction: {}", e);
        e
    })?;
    Ok(())
}

/// The `n` most recent distinct trading dates in the store, newest first.
pub async fn distinct_recent_dates(pool: &SqlitePool, n: u32) -> Result<Vec<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT DISTINCT date
        FROM flow_records
        ORDER BY date DESC
        LIMIT ?
        "#,
    )
    .bind(i64::from(n))
    .fetch_all(pool)
    .await
}

/// Per-code totals over the given dates, ordered by code.
pub async fn aggregate_over_dates(
    pool: &SqlitePool,
    dates: &[NaiveDate],
) -> Result<Vec<WindowAggregate>, sqlx::Error> {
    if dates.is_empty() {
        return Ok(Vec::new());
    }

    let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT code, MAX(name) AS name, \
         CAST(SUM(net) AS REAL) AS total_net, \
         CAST(SUM(val) AS REAL) AS total_val \
         FROM flow_records WHERE date IN (",
    );

    let mut separated = query_builder.separated(", ");
    for date in dates {
        separated.push_bind(*date);
    }
    separated.push_unseparated(") GROUP BY code ORDER BY code");

    query_builder
        .build_query_as::<WindowAggregate>()
        .fetch_all(pool)
        .await
}

pub async fn has_records_for_date(pool: &SqlitePool, date: NaiveDate) -> Result<bool, sqlx::Error> {
    let found: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM flow_records WHERE date = ?)",
    )
    .bind(date)
    .fetch_one(pool)
    .await?;

    Ok(found != 0)
}
