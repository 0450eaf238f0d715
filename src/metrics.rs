//! Optional metrics hook for import stages.
//!
//! Nothing is recorded unless a recorder is installed with
//! [`set_import_metrics`].
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use ingest::IngestError;

use crate::report::ImportOutcome;
use crate::store::StoreErrorKind;

/// Metrics observer for import stages.
pub trait ImportMetrics: Send + Sync {
    /// File parsing, successful or not.
    fn record_parse(&self, latency: Duration, result: Result<(), IngestError>);
    /// One store call: a single `create_lead` or a whole `create_bulk`.
    fn record_submission(&self, latency: Duration, result: Result<(), StoreErrorKind>);
    /// A finished import, from normalization to the final report.
    fn record_import(&self, latency: Duration, outcome: ImportOutcome);
}

/// Install or clear the global import metrics recorder.
pub fn set_import_metrics(recorder: Option<Arc<dyn ImportMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn ImportMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn ImportMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn ImportMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn ImportMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_parse(self, result: Result<(), IngestError>) {
        self.recorder.record_parse(self.start.elapsed(), result);
    }

    pub(crate) fn record_submission(self, result: Result<(), StoreErrorKind>) {
        self.recorder.record_submission(self.start.elapsed(), result);
    }

    pub(crate) fn record_import(self, outcome: ImportOutcome) {
        self.recorder.record_import(self.start.elapsed(), outcome);
    }
}
