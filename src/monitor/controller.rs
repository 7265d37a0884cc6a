use anyhow::{bail, Context, Result};
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::Database;
use crate::telemetry::TelemetrySource;

use super::loop_worker::monitor_loop;

pub struct MonitorController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl MonitorController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(
        &mut self,
        source: Arc<dyn TelemetrySource>,
        db: Database,
        interval: Duration,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("monitor already running");
        }
        if interval.is_zero() {
            bail!("monitor interval must be positive");
        }

        info!(
            "Starting glucose monitor on source '{}' every {}s",
            source.name(),
            interval.as_secs_f64()
        );

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(monitor_loop(source, db, interval, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("monitor loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for MonitorController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{MockRanges, MockTelemetrySource};

    #[tokio::test]
    async fn start_twice_fails_and_stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("controller.sqlite3")).unwrap();
        let source: Arc<dyn TelemetrySource> =
            Arc::new(MockTelemetrySource::with_seed(MockRanges::default(), 1).unwrap());

        let mut controller = MonitorController::new();
        controller
            .start(Arc::clone(&source), db.clone(), Duration::from_millis(20))
            .unwrap();
        assert!(controller.is_running());
        assert!(controller
            .start(Arc::clone(&source), db.clone(), Duration::from_millis(20))
            .is_err());

        // First tick fires immediately; give it time to land.
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.stop().await.unwrap();
        assert!(!controller.is_running());
        controller.stop().await.unwrap();

        assert!(db.latest_reading().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("controller.sqlite3")).unwrap();
        let source: Arc<dyn TelemetrySource> =
            Arc::new(MockTelemetrySource::with_seed(MockRanges::default(), 1).unwrap());
        let mut controller = MonitorController::new();
        assert!(controller.start(source, db, Duration::ZERO).is_err());
    }
}
