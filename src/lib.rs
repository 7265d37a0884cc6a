pub mod commands;
pub mod db;
pub mod glucose;
pub mod monitor;
pub mod profile;
pub mod settings;
pub mod telemetry;
mod utils;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use db::Database;
use monitor::MonitorController;
use settings::{SettingsStore, SourceKind};
use telemetry::{FileTelemetrySource, MockTelemetrySource, TelemetrySource};

pub use glucose::{classify, Classification, ClassifyError};

const DB_FILE_NAME: &str = "sugarcheck.sqlite3";
const SETTINGS_FILE_NAME: &str = "settings.json";
const DEBUG_REFRESH_INTERVAL_SECS: u64 = 5;

pub struct AppState {
    pub db: Database,
    pub settings: SettingsStore,
    pub(crate) monitor: tokio::sync::Mutex<MonitorController>,
    data_dir: PathBuf,
    debug_mode: bool,
}

impl AppState {
    pub fn open(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir).with_context(|| {
            format!("failed to create data directory {}", data_dir.display())
        })?;

        let database = Database::new(data_dir.join(DB_FILE_NAME))?;
        let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE_NAME))?;

        let debug_mode = std::env::var("SUGARCHECK_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            db: database,
            settings,
            monitor: tokio::sync::Mutex::new(MonitorController::new()),
            data_dir,
            debug_mode,
        })
    }

    pub fn data_dir(&self) -> &std::path::Path {
        &self.data_dir
    }

    /// Source selected in the monitor settings.
    pub fn telemetry_source(&self) -> Result<Arc<dyn TelemetrySource>> {
        let monitor = self.settings.monitor()?;
        let source: Arc<dyn TelemetrySource> = match monitor.source {
            SourceKind::Mock => Arc::new(MockTelemetrySource::new(self.settings.mock()?)?),
            SourceKind::File => {
                let path = monitor
                    .feed_path
                    .ok_or_else(|| anyhow!("file source selected but no feed path configured"))?;
                Arc::new(FileTelemetrySource::new(path))
            }
        };
        Ok(source)
    }

    pub fn refresh_interval_secs(&self) -> Result<u64> {
        if self.debug_mode {
            return Ok(DEBUG_REFRESH_INTERVAL_SECS);
        }
        Ok(self.settings.monitor()?.refresh_interval_secs)
    }
}

/// Default data directory: `$SUGARCHECK_DATA_DIR`, else the platform data dir.
pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("SUGARCHECK_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join("sugarcheck"))
        .ok_or_else(|| anyhow!("could not determine a data directory; pass --data-dir"))
}

pub fn init_logging() {
    // Reads RUST_LOG on top of the info default.
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
