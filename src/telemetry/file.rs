use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::TelemetrySource;
use crate::db::GlucoseReading;

pub const FILE_SOURCE_NAME: &str = "file";

#[derive(Debug, Deserialize)]
struct FeedEntry {
    value: f64,
    timestamp: DateTime<Utc>,
}

/// Exported sensor feed: a JSON array of `{ "value": .., "timestamp": .. }`.
pub struct FileTelemetrySource {
    path: PathBuf,
}

impl FileTelemetrySource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn parse(contents: &str) -> Result<Vec<GlucoseReading>> {
        let entries: Vec<FeedEntry> =
            serde_json::from_str(contents).context("invalid telemetry feed JSON")?;

        let mut readings: Vec<GlucoseReading> = entries
            .into_iter()
            .map(|entry| GlucoseReading::new(entry.value, entry.timestamp, FILE_SOURCE_NAME))
            .collect();
        readings.sort_by_key(|reading| reading.timestamp);
        Ok(readings)
    }
}

impl TelemetrySource for FileTelemetrySource {
    fn name(&self) -> &str {
        FILE_SOURCE_NAME
    }

    fn fetch_readings(&self) -> Result<Vec<GlucoseReading>> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read telemetry feed {}", self.path.display()))?;
        Self::parse(&contents)
    }
}
