use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::telemetry::MockRanges;

pub const DEFAULT_SENSOR_LIFETIME_DAYS: u32 = 14;
pub const MAX_SENSOR_LIFETIME_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    Mock,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSettings {
    pub refresh_interval_secs: u64,
    pub source: SourceKind,
    pub feed_path: Option<PathBuf>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 300,
            source: SourceKind::Mock,
            feed_path: None,
        }
    }
}

impl MonitorSettings {
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs == 0 {
            bail!("refresh interval must be at least 1 second");
        }
        if self.source == SourceKind::File && self.feed_path.is_none() {
            bail!("file source requires a feed path");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorSettings {
    pub started_at: Option<DateTime<Utc>>,
    pub lifetime_days: u32,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            started_at: None,
            lifetime_days: DEFAULT_SENSOR_LIFETIME_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorStatus {
    pub started_at: Option<DateTime<Utc>>,
    pub lifetime_days: u32,
    pub days_remaining: Option<i64>,
    pub expired: bool,
}

impl SensorSettings {
    pub fn status_at(&self, now: DateTime<Utc>) -> SensorStatus {
        let days_remaining = self.started_at.map(|started| {
            // Past the representable range the sensor simply never ends.
            let ends_at = started
                .checked_add_signed(Duration::days(i64::from(self.lifetime_days)))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            let remaining = ends_at - now;
            // A partial day still counts as a day left.
            let days = remaining.num_days();
            let partial = remaining > Duration::days(days);
            (days + i64::from(partial)).max(0)
        });

        SensorStatus {
            started_at: self.started_at,
            lifetime_days: self.lifetime_days,
            days_remaining,
            expired: days_remaining == Some(0),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    monitor: MonitorSettings,
    mock: MockRanges,
    sensor: SensorSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring malformed settings at {}: {err}",
                    path.display()
                );
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn monitor(&self) -> Result<MonitorSettings> {
        Ok(self.read()?.monitor.clone())
    }

    pub fn mock(&self) -> Result<MockRanges> {
        Ok(self.read()?.mock.clone())
    }

    pub fn sensor(&self) -> Result<SensorSettings> {
        Ok(self.read()?.sensor.clone())
    }

    pub fn update_monitor(&self, settings: MonitorSettings) -> Result<()> {
        settings.validate()?;
        self.update(|data| data.monitor = settings)
    }

    pub fn update_mock(&self, ranges: MockRanges) -> Result<()> {
        ranges.validate()?;
        self.update(|data| data.mock = ranges)
    }

    pub fn update_sensor(&self, settings: SensorSettings) -> Result<()> {
        if !(1..=MAX_SENSOR_LIFETIME_DAYS).contains(&settings.lifetime_days) {
            bail!(
                "sensor lifetime must be between 1 and {MAX_SENSOR_LIFETIME_DAYS} days, got {}",
                settings.lifetime_days
            );
        }
        self.update(|data| data.sensor = settings)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, UserSettings>> {
        self.data
            .read()
            .map_err(|_| anyhow!("settings lock poisoned"))
    }

    fn update(&self, apply: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        let mut next = guard.clone();
        apply(&mut next);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.monitor().unwrap(), MonitorSettings::default());
        assert_eq!(store.mock().unwrap(), MockRanges::default());
        assert_eq!(store.sensor().unwrap().lifetime_days, 14);
    }

    #[test]
    fn updates_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update_monitor(MonitorSettings {
                refresh_interval_secs: 60,
                ..MonitorSettings::default()
            })
            .unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.monitor().unwrap().refresh_interval_secs, 60);
    }

    #[test]
    fn invalid_update_leaves_settings_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let bad = MonitorSettings {
            source: SourceKind::File,
            feed_path: None,
            ..MonitorSettings::default()
        };
        assert!(store.update_monitor(bad).is_err());
        assert_eq!(store.monitor().unwrap().source, SourceKind::Mock);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.monitor().unwrap(), MonitorSettings::default());
    }

    #[test]
    fn partial_file_fills_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "sensor": { "startedAt": null, "lifetimeDays": 10 } }"#).unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.sensor().unwrap().lifetime_days, 10);
        assert_eq!(store.mock().unwrap(), MockRanges::default());
    }

    #[test]
    fn sensor_days_remaining() {
        let started = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let sensor = SensorSettings {
            started_at: Some(started),
            lifetime_days: 14,
        };

        let fresh = sensor.status_at(started);
        assert_eq!(fresh.days_remaining, Some(14));
        assert!(!fresh.expired);

        let midway = sensor.status_at(started + Duration::days(3) + Duration::hours(2));
        assert_eq!(midway.days_remaining, Some(11));

        let done = sensor.status_at(started + Duration::days(20));
        assert_eq!(done.days_remaining, Some(0));
        assert!(done.expired);

        let unset = SensorSettings::default().status_at(started);
        assert_eq!(unset.days_remaining, None);
        assert!(!unset.expired);
    }

    #[test]
    fn sensor_lifetime_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let started = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        for days in [0, MAX_SENSOR_LIFETIME_DAYS + 1, u32::MAX] {
            let sensor = SensorSettings {
                started_at: Some(started),
                lifetime_days: days,
            };
            assert!(store.update_sensor(sensor).is_err(), "accepted {days} days");
        }
        assert_eq!(store.sensor().unwrap(), SensorSettings::default());

        let longest = SensorSettings {
            started_at: Some(started),
            lifetime_days: MAX_SENSOR_LIFETIME_DAYS,
        };
        store.update_sensor(longest).unwrap();
        assert_eq!(
            store.sensor().unwrap().status_at(started).days_remaining,
            Some(i64::from(MAX_SENSOR_LIFETIME_DAYS))
        );
    }

    #[test]
    fn sensor_status_never_overflows() {
        // Values that only a hand-edited settings file could carry.
        let huge = SensorSettings {
            started_at: Some(Utc::now()),
            lifetime_days: u32::MAX,
        };
        let status = huge.status_at(Utc::now());
        assert!(status.days_remaining.unwrap() > 0);
        assert!(!status.expired);

        let far_future = SensorSettings {
            started_at: Some(DateTime::<Utc>::MAX_UTC - Duration::days(1)),
            lifetime_days: MAX_SENSOR_LIFETIME_DAYS,
        };
        assert!(!far_future.status_at(Utc::now()).expired);
    }
}
