//! Command surface consumed by the display layer.
//!
//! Every command takes the shared [`AppState`] and returns
//! `Result<T, String>` so a UI shell can forward errors as plain text.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    db::{GlucoseReading, UserProfile},
    glucose::{classify, AfterMealBand, BeforeMealBand, Classification, Trend},
    monitor::{perform_refresh, RefreshOutcome},
    profile::ProfileInput,
    settings::{MonitorSettings, SensorSettings, SensorStatus, SourceKind},
    telemetry::{MockRanges, MockTelemetrySource},
    AppState,
};

const ENABLE_LOGS: bool = false;

use crate::log_debug;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationView {
    pub value: f64,
    pub before_meal: BeforeMealBand,
    pub after_meal: AfterMealBand,
    pub before_meal_label: String,
    pub after_meal_label: String,
    pub summary: String,
}

impl ClassificationView {
    fn new(value: f64, classification: Classification) -> Self {
        Self {
            value,
            before_meal: classification.before_meal,
            after_meal: classification.after_meal,
            before_meal_label: classification.before_meal.label().to_string(),
            after_meal_label: classification.after_meal.label().to_string(),
            summary: classification.summary().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub latest: Option<GlucoseReading>,
    pub classification: Option<ClassificationView>,
    pub trend: Option<Trend>,
    pub trend_arrow: Option<String>,
    /// Oldest first, ready for charting.
    pub recent: Vec<GlucoseReading>,
    pub sensor: SensorStatus,
}

pub fn classify_glucose(value: f64) -> Result<ClassificationView, String> {
    classify(value)
        .map(|classification| ClassificationView::new(value, classification))
        .map_err(|e| e.to_string())
}

/// Quick check against a random placeholder value, before any sensor data.
pub fn spot_check(state: &AppState) -> Result<ClassificationView, String> {
    let ranges = state.settings.mock().map_err(|e| e.to_string())?;
    let source = MockTelemetrySource::new(ranges).map_err(|e| e.to_string())?;
    let level = source.random_level().map_err(|e| e.to_string())?;
    classify_glucose(f64::from(level))
}

pub async fn get_dashboard(state: &AppState, limit: u64) -> Result<DashboardView, String> {
    let mut recent = state
        .db
        .latest_readings(limit.max(2))
        .await
        .map_err(|e| e.to_string())?;
    recent.reverse();

    let trend = Trend::of_feed(&recent);
    let latest = recent.last().cloned();
    if recent.len() as u64 > limit {
        recent.drain(..recent.len() - limit as usize);
    }

    // No reading yet means nothing to classify.
    let classification = match &latest {
        Some(reading) => Some(classify_glucose(reading.value)?),
        None => None,
    };

    let sensor = get_sensor_status(state)?;
    log_debug!(
        "dashboard: {} recent readings, trend {:?}",
        recent.len(),
        trend
    );

    Ok(DashboardView {
        latest,
        classification,
        trend,
        trend_arrow: trend.map(|t| t.arrow().to_string()),
        recent,
        sensor,
    })
}

pub async fn refresh_readings(state: &AppState) -> Result<RefreshOutcome, String> {
    let source = state.telemetry_source().map_err(|e| e.to_string())?;
    perform_refresh(source, &state.db)
        .await
        .map_err(|e| format!("{e:#}"))
}

pub async fn list_readings(state: &AppState, limit: u64) -> Result<Vec<GlucoseReading>, String> {
    state
        .db
        .latest_readings(limit)
        .await
        .map_err(|e| e.to_string())
}

pub async fn list_readings_between(
    state: &AppState,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<GlucoseReading>, String> {
    if from > to {
        return Err("range start must not be after range end".into());
    }
    state
        .db
        .readings_between(from, to)
        .await
        .map_err(|e| e.to_string())
}

pub async fn clear_readings(state: &AppState) -> Result<usize, String> {
    state.db.clear_readings().await.map_err(|e| e.to_string())
}

pub async fn get_profile(state: &AppState) -> Result<UserProfile, String> {
    state.db.load_profile().await.map_err(|e| e.to_string())
}

pub async fn save_profile(state: &AppState, input: ProfileInput) -> Result<UserProfile, String> {
    let profile = input.into_profile().map_err(|e| e.to_string())?;
    state
        .db
        .save_profile(&profile)
        .await
        .map_err(|e| e.to_string())?;
    Ok(profile)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub monitor: MonitorSettings,
    pub mock: MockRanges,
    pub sensor: SensorSettings,
}

pub fn get_settings(state: &AppState) -> Result<SettingsView, String> {
    let settings = &state.settings;
    Ok(SettingsView {
        monitor: settings.monitor().map_err(|e| e.to_string())?,
        mock: settings.mock().map_err(|e| e.to_string())?,
        sensor: settings.sensor().map_err(|e| e.to_string())?,
    })
}

pub fn update_monitor_settings(
    state: &AppState,
    refresh_interval_secs: Option<u64>,
    source: Option<SourceKind>,
    feed_path: Option<PathBuf>,
) -> Result<MonitorSettings, String> {
    let mut monitor = state.settings.monitor().map_err(|e| e.to_string())?;
    if let Some(secs) = refresh_interval_secs {
        monitor.refresh_interval_secs = secs;
    }
    if let Some(source) = source {
        monitor.source = source;
    }
    if feed_path.is_some() {
        monitor.feed_path = feed_path;
    }

    state
        .settings
        .update_monitor(monitor.clone())
        .map_err(|e| e.to_string())?;
    Ok(monitor)
}

pub fn update_mock_ranges(state: &AppState, ranges: MockRanges) -> Result<MockRanges, String> {
    state
        .settings
        .update_mock(ranges.clone())
        .map_err(|e| e.to_string())?;
    Ok(ranges)
}

pub fn start_sensor(
    state: &AppState,
    started_at: Option<DateTime<Utc>>,
    lifetime_days: Option<u32>,
) -> Result<SensorStatus, String> {
    let mut sensor = state.settings.sensor().map_err(|e| e.to_string())?;
    sensor.started_at = Some(started_at.unwrap_or_else(Utc::now));
    if let Some(days) = lifetime_days {
        sensor.lifetime_days = days;
    }

    state
        .settings
        .update_sensor(sensor)
        .map_err(|e| e.to_string())?;
    get_sensor_status(state)
}

pub fn get_sensor_status(state: &AppState) -> Result<SensorStatus, String> {
    let sensor = state.settings.sensor().map_err(|e| e.to_string())?;
    Ok(sensor.status_at(Utc::now()))
}

pub async fn start_monitor(state: &AppState) -> Result<(), String> {
    let source = state.telemetry_source().map_err(|e| e.to_string())?;
    let interval = Duration::from_secs(state.refresh_interval_secs().map_err(|e| e.to_string())?);
    state
        .monitor
        .lock()
        .await
        .start(source, state.db.clone(), interval)
        .map_err(|e| e.to_string())
}

pub async fn stop_monitor(state: &AppState) -> Result<(), String> {
    state
        .monitor
        .lock()
        .await
        .stop()
        .await
        .map_err(|e| e.to_string())
}

pub async fn is_monitor_running(state: &AppState) -> bool {
    state.monitor.lock().await.is_running()
}
