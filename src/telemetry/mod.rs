//! Telemetry sources feeding glucose readings into the app.
//!
//! A source hands back an ordered feed of timestamped readings. Fetching is
//! blocking and the source owns its own failure and retry behavior; callers
//! run it on a blocking thread and treat an empty feed as "no data yet".

mod file;
mod mock;

use anyhow::Result;

use crate::db::GlucoseReading;

pub use file::FileTelemetrySource;
pub use mock::{MockRanges, MockTelemetrySource};

pub trait TelemetrySource: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Readings ordered by ascending timestamp.
    fn fetch_readings(&self) -> Result<Vec<GlucoseReading>>;
}
