//! Glucose reading data model.
//!
//! A reading is one timestamped concentration from a telemetry feed. The
//! store keeps at most one reading per timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlucoseReading {
    pub id: String,
    /// Concentration in mg/dL.
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

impl GlucoseReading {
    pub fn new(value: f64, timestamp: DateTime<Utc>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            value,
            timestamp,
            source: source.into(),
        }
    }
}

/// Most recent reading of a feed, regardless of the feed's order.
pub fn latest(readings: &[GlucoseReading]) -> Option<&GlucoseReading> {
    readings.iter().max_by_key(|reading| reading.timestamp)
}
