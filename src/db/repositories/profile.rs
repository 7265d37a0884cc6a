use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, to_u32},
    models::UserProfile,
};

fn row_to_profile(row: &Row) -> Result<UserProfile> {
    let age: Option<i64> = row.get("age")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(UserProfile {
        name: row.get("name")?,
        age: age.map(|value| to_u32(value, "age")).transpose()?,
        gender: row.get("gender")?,
        medical_history: row.get("medical_history")?,
        updated_at: Some(parse_datetime(&updated_at, "updated_at")?),
    })
}

impl Database {
    /// Stored profile, or an empty one when nothing has been saved yet.
    pub async fn load_profile(&self) -> Result<UserProfile> {
        self.execute(|conn| {
            let profile = conn
                .query_row(
                    "SELECT name, age, gender, medical_history, updated_at
                     FROM profile
                     WHERE id = 1",
                    [],
                    |row| Ok(row_to_profile(row)),
                )
                .optional()
                .context("failed to load profile")?
                .transpose()?;

            Ok(profile.unwrap_or_default())
        })
        .await
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        let record = profile.clone();
        self.execute(move |conn| {
            let updated_at = record.updated_at.unwrap_or_else(chrono::Utc::now);
            conn.execute(
                "INSERT INTO profile (id, name, age, gender, medical_history, updated_at)
                 VALUES (1, ?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     age = excluded.age,
                     gender = excluded.gender,
                     medical_history = excluded.medical_history,
                     updated_at = excluded.updated_at",
                params![
                    record.name,
                    record.age.map(i64::from),
                    record.gender,
                    record.medical_history,
                    format_datetime(&updated_at),
                ],
            )
            .with_context(|| "failed to save profile")?;
            Ok(())
        })
        .await
    }
}
