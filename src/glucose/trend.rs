use serde::{Deserialize, Serialize};

use crate::db::models::GlucoseReading;

/// Rates are in mg/dL per minute.
const STEADY_RATE_BELOW: f64 = 1.0;
const FAST_RATE_FROM: f64 = 2.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Trend {
    RisingFast,
    Rising,
    Steady,
    Falling,
    FallingFast,
}

impl Trend {
    /// Direction of change between two readings. `None` when the pair
    /// carries no usable rate (same instant, out of order, non-finite).
    pub fn between(previous: &GlucoseReading, latest: &GlucoseReading) -> Option<Trend> {
        if !previous.value.is_finite() || !latest.value.is_finite() {
            return None;
        }

        let elapsed_ms = (latest.timestamp - previous.timestamp).num_milliseconds();
        if elapsed_ms <= 0 {
            return None;
        }

        let minutes = elapsed_ms as f64 / 60_000.0;
        Some(Self::from_rate((latest.value - previous.value) / minutes))
    }

    /// Trend across the two newest readings of an unordered feed.
    pub fn of_feed(readings: &[GlucoseReading]) -> Option<Trend> {
        let mut sorted: Vec<&GlucoseReading> = readings.iter().collect();
        sorted.sort_by_key(|reading| reading.timestamp);
        match sorted.as_slice() {
            [.., previous, latest] => Self::between(previous, latest),
            _ => None,
        }
    }

    pub fn from_rate(rate: f64) -> Trend {
        let magnitude = rate.abs();
        if magnitude < STEADY_RATE_BELOW {
            Trend::Steady
        } else if rate > 0.0 {
            if magnitude >= FAST_RATE_FROM {
                Trend::RisingFast
            } else {
                Trend::Rising
            }
        } else if magnitude >= FAST_RATE_FROM {
            Trend::FallingFast
        } else {
            Trend::Falling
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::RisingFast => "↑",
            Trend::Rising => "↗",
            Trend::Steady => "→",
            Trend::Falling => "↘",
            Trend::FallingFast => "↓",
        }
    }
}
