use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    db::{Database, GlucoseReading},
    glucose::{classify, Classification},
    telemetry::TelemetrySource,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub source: String,
    pub fetched: usize,
    pub inserted: usize,
    pub latest: Option<GlucoseReading>,
    pub classification: Option<Classification>,
}

pub async fn monitor_loop(
    source: Arc<dyn TelemetrySource>,
    db: Database,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let fut = perform_refresh(Arc::clone(&source), &db);

                match tokio::time::timeout(Duration::from_secs(FETCH_TIMEOUT_SECS), fut).await {
                    Ok(Ok(outcome)) => log_outcome(&outcome),
                    Ok(Err(err)) => log_error!("refresh from {} failed: {err:?}", source.name()),
                    Err(_) => log_warn!("refresh from {} timed out (> {}s)", source.name(), FETCH_TIMEOUT_SECS),
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("monitor loop shutting down");
                break;
            }
        }
    }
}

/// One fetch-store-classify pass. The classification always describes the
/// newest stored reading, which may predate this fetch.
pub async fn perform_refresh(
    source: Arc<dyn TelemetrySource>,
    db: &Database,
) -> Result<RefreshOutcome> {
    let source_name = source.name().to_string();
    let feed = tokio::task::spawn_blocking(move || source.fetch_readings())
        .await
        .context("telemetry worker join failed")?
        .with_context(|| format!("telemetry fetch from {source_name} failed"))?;

    let inserted = db
        .insert_readings(&feed)
        .await
        .context("failed to persist readings")?;

    let latest = db.latest_reading().await?;
    let classification = latest
        .as_ref()
        .map(|reading| classify(reading.value))
        .transpose()?;

    Ok(RefreshOutcome {
        source: source_name,
        fetched: feed.len(),
        inserted,
        latest,
        classification,
    })
}

fn log_outcome(outcome: &RefreshOutcome) {
    match (&outcome.latest, &outcome.classification) {
        (Some(reading), Some(classification)) => log_info!(
            "refresh from {}: {} fetched, {} new, latest {} mg/dL ({} fasting / {} after meal)",
            outcome.source,
            outcome.fetched,
            outcome.inserted,
            reading.value,
            classification.before_meal.label(),
            classification.after_meal.label()
        ),
        _ => log_info!("refresh from {}: no readings available yet", outcome.source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{MockRanges, MockTelemetrySource};
    use anyhow::bail;

    struct FailingSource;

    impl TelemetrySource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        fn fetch_readings(&self) -> Result<Vec<GlucoseReading>> {
            bail!("sensor offline")
        }
    }

    struct EmptySource;

    impl TelemetrySource for EmptySource {
        fn name(&self) -> &str {
            "empty"
        }

        fn fetch_readings(&self) -> Result<Vec<GlucoseReading>> {
            Ok(Vec::new())
        }
    }

    fn open() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("monitor.sqlite3")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn refresh_stores_and_classifies_latest() {
        let (_dir, db) = open();
        let source = Arc::new(MockTelemetrySource::with_seed(MockRanges::default(), 11).unwrap());

        let outcome = perform_refresh(source, &db).await.unwrap();
        assert_eq!(outcome.fetched, 12);
        assert_eq!(outcome.inserted, 12);

        let latest = outcome.latest.unwrap();
        let expected = classify(latest.value).unwrap();
        assert_eq!(outcome.classification, Some(expected));
    }

    #[tokio::test]
    async fn empty_feed_yields_no_classification() {
        let (_dir, db) = open();
        let outcome = perform_refresh(Arc::new(EmptySource), &db).await.unwrap();
        assert_eq!(outcome.fetched, 0);
        assert!(outcome.latest.is_none());
        assert!(outcome.classification.is_none());
    }

    #[tokio::test]
    async fn fetch_errors_propagate() {
        let (_dir, db) = open();
        let err = perform_refresh(Arc::new(FailingSource), &db).await.unwrap_err();
        assert!(format!("{err:#}").contains("sensor offline"));
    }

    #[tokio::test]
    async fn loop_stops_on_cancel() {
        let (_dir, db) = open();
        let token = CancellationToken::new();
        let handle = tokio::spawn(monitor_loop(
            Arc::new(EmptySource),
            db,
            Duration::from_millis(10),
            token.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(30)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
