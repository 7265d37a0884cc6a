//! User profile data model.
//!
//! Holds the fields edited on the profile screen. There is exactly one
//! profile per local store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub age: Option<u32>,
    pub gender: String,
    pub medical_history: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            age: None,
            gender: String::new(),
            medical_history: String::new(),
            updated_at: None,
        }
    }
}

impl UserProfile {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.age.is_none()
            && self.gender.is_empty()
            && self.medical_history.is_empty()
    }
}
