use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::TelemetrySource;
use crate::db::GlucoseReading;

pub const MOCK_SOURCE_NAME: &str = "mock";
/// One day of readings at the default spacing.
pub const MAX_SERIES_LEN: usize = 288;
pub const MAX_SPACING_MINUTES: i64 = 24 * 60;

/// Value ranges for placeholder data, inclusive, in mg/dL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MockRanges {
    pub series_min: u32,
    pub series_max: u32,
    pub series_len: usize,
    pub spot_min: u32,
    pub spot_max: u32,
    pub spacing_minutes: i64,
}

impl Default for MockRanges {
    fn default() -> Self {
        Self {
            series_min: 70,
            series_max: 169,
            series_len: 12,
            spot_min: 90,
            spot_max: 130,
            spacing_minutes: 5,
        }
    }
}

impl MockRanges {
    pub fn validate(&self) -> Result<()> {
        if self.series_min >= self.series_max {
            bail!(
                "series range is empty ({}..={})",
                self.series_min,
                self.series_max
            );
        }
        if self.spot_min >= self.spot_max {
            bail!("spot range is empty ({}..={})", self.spot_min, self.spot_max);
        }
        if !(1..=MAX_SERIES_LEN).contains(&self.series_len) {
            bail!(
                "series length must be between 1 and {MAX_SERIES_LEN}, got {}",
                self.series_len
            );
        }
        if !(1..=MAX_SPACING_MINUTES).contains(&self.spacing_minutes) {
            bail!(
                "spacing must be between 1 and {MAX_SPACING_MINUTES} minutes, got {}",
                self.spacing_minutes
            );
        }
        Ok(())
    }

    fn spacing(&self) -> Result<TimeDelta> {
        TimeDelta::try_minutes(self.spacing_minutes)
            .ok_or_else(|| anyhow!("spacing of {} minutes is out of range", self.spacing_minutes))
    }
}

/// Random placeholder feed used before a real sensor is connected.
pub struct MockTelemetrySource {
    ranges: MockRanges,
    rng: Mutex<StdRng>,
}

impl MockTelemetrySource {
    pub fn new(ranges: MockRanges) -> Result<Self> {
        ranges.validate()?;
        Ok(Self {
            ranges,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    pub fn with_seed(ranges: MockRanges, seed: u64) -> Result<Self> {
        ranges.validate()?;
        Ok(Self {
            ranges,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }

    pub fn ranges(&self) -> &MockRanges {
        &self.ranges
    }

    /// A single spot value, as shown by the quick-check screen.
    pub fn random_level(&self) -> Result<u32> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow!("mock telemetry rng poisoned"))?;
        Ok(rng.gen_range(self.ranges.spot_min..=self.ranges.spot_max))
    }

    /// Latest point on the spacing grid at or before `now`. Series that end
    /// on the grid overlap on identical timestamps, so the store drops the
    /// repeats.
    pub fn aligned_end(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        now.duration_trunc(self.ranges.spacing()?)
            .with_context(|| format!("cannot align {now} to the mock spacing grid"))
    }

    /// `series_len` readings spaced evenly and ending at `end`.
    pub fn series_ending_at(&self, end: DateTime<Utc>) -> Result<Vec<GlucoseReading>> {
        let spacing = self.ranges.spacing()?;
        let len = self.ranges.series_len;
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow!("mock telemetry rng poisoned"))?;

        (0..len)
            .map(|index| -> Result<GlucoseReading> {
                let steps_back = i32::try_from(len - 1 - index)?;
                let timestamp = spacing
                    .checked_mul(steps_back)
                    .and_then(|offset| end.checked_sub_signed(offset))
                    .ok_or_else(|| anyhow!("mock series runs out of the supported time range"))?;
                let value = rng.gen_range(self.ranges.series_min..=self.ranges.series_max);
                Ok(GlucoseReading::new(f64::from(value), timestamp, MOCK_SOURCE_NAME))
            })
            .collect()
    }
}

impl TelemetrySource for MockTelemetrySource {
    fn name(&self) -> &str {
        MOCK_SOURCE_NAME
    }

    fn fetch_readings(&self) -> Result<Vec<GlucoseReading>> {
        self.series_ending_at(self.aligned_end(Utc::now())?)
    }
}
