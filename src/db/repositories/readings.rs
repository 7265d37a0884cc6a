use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, to_i64},
    models::GlucoseReading,
};

fn row_to_reading(row: &Row) -> Result<GlucoseReading> {
    let recorded_at: String = row.get("recorded_at")?;

    Ok(GlucoseReading {
        id: row.get("id")?,
        value: row.get("value")?,
        timestamp: parse_datetime(&recorded_at, "recorded_at")?,
        source: row.get("source")?,
    })
}

impl Database {
    /// Insert a batch of readings in one transaction. Readings whose
    /// timestamp is already stored are skipped; returns how many were new.
    pub async fn insert_readings(&self, readings: &[GlucoseReading]) -> Result<usize> {
        if readings.is_empty() {
            return Ok(0);
        }

        let records = readings.to_vec();
        self.execute(move |conn| {
            let now = format_datetime(&Utc::now());
            let tx = conn.transaction()?;
            let mut inserted = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO readings (id, value, recorded_at, source, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for record in &records {
                    inserted += stmt.execute(params![
                        record.id,
                        record.value,
                        format_datetime(&record.timestamp),
                        record.source,
                        now,
                    ])?;
                }
            }
            tx.commit().context("failed to commit readings batch")?;
            Ok(inserted)
        })
        .await
    }

    /// Newest readings first.
    pub async fn latest_readings(&self, limit: u64) -> Result<Vec<GlucoseReading>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, value, recorded_at, source
                 FROM readings
                 ORDER BY recorded_at DESC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![to_i64(limit)?])?;
            let mut readings = Vec::new();
            while let Some(row) = rows.next()? {
                readings.push(row_to_reading(row)?);
            }

            Ok(readings)
        })
        .await
    }

    pub async fn latest_reading(&self) -> Result<Option<GlucoseReading>> {
        Ok(self.latest_readings(1).await?.into_iter().next())
    }

    /// Readings in `[from, to]`, oldest first.
    pub async fn readings_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<GlucoseReading>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, value, recorded_at, source
                 FROM readings
                 WHERE recorded_at >= ?1 AND recorded_at <= ?2
                 ORDER BY recorded_at ASC",
            )?;

            let mut rows = stmt.query(params![format_datetime(&from), format_datetime(&to)])?;
            let mut readings = Vec::new();
            while let Some(row) = rows.next()? {
                readings.push(row_to_reading(row)?);
            }

            Ok(readings)
        })
        .await
    }

    pub async fn clear_readings(&self) -> Result<usize> {
        self.execute(|conn| {
            let removed = conn
                .execute("DELETE FROM readings", [])
                .context("failed to clear readings")?;
            Ok(removed)
        })
        .await
    }
}
