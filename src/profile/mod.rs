//! Profile editing: raw form input and its validation into a storable
//! [`UserProfile`].

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::UserProfile;

const MAX_NAME_CHARS: usize = 100;
const MAX_GENDER_CHARS: usize = 50;
const MAX_HISTORY_CHARS: usize = 5_000;
const MAX_AGE: u32 = 130;

/// Profile form as typed by the user. Age arrives as text from a numeric
/// keyboard and may be blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileInput {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub medical_history: String,
}

impl From<&UserProfile> for ProfileInput {
    fn from(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            age: profile.age.map(|age| age.to_string()).unwrap_or_default(),
            gender: profile.gender.clone(),
            medical_history: profile.medical_history.clone(),
        }
    }
}

impl ProfileInput {
    pub fn into_profile(self) -> Result<UserProfile> {
        let name = bounded(&self.name, "name", MAX_NAME_CHARS)?;
        let gender = bounded(&self.gender, "gender", MAX_GENDER_CHARS)?;
        let medical_history =
            bounded(&self.medical_history, "medical history", MAX_HISTORY_CHARS)?;
        let age = parse_age(&self.age)?;

        Ok(UserProfile {
            name,
            age,
            gender,
            medical_history,
            updated_at: Some(Utc::now()),
        })
    }
}

fn bounded(value: &str, field: &str, max_chars: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.chars().count() > max_chars {
        bail!("{field} is too long (max {max_chars} characters)");
    }
    Ok(trimmed.to_string())
}

fn parse_age(raw: &str) -> Result<Option<u32>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let age: u32 = raw
        .parse()
        .map_err(|_| anyhow!("age must be a whole number, got '{raw}'"))?;
    if age > MAX_AGE {
        bail!("age must be between 0 and {MAX_AGE}");
    }
    Ok(Some(age))
}
