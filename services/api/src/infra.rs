use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

use invoice_readiness::workflows::readiness::{
    NotifyError, Report, ReportId, ReportNotifier, ReportStore, StoreError, Upload, UploadId,
    UploadStore,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryUploadStore {
    uploads: Arc<Mutex<HashMap<UploadId, Upload>>>,
}

impl UploadStore for InMemoryUploadStore {
    fn insert(&self, upload: Upload) -> Result<Upload, StoreError> {
        let mut guard = self.uploads.lock().map_err(poisoned)?;
        if guard.contains_key(&upload.upload_id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(upload.upload_id.clone(), upload.clone());
        Ok(upload)
    }

    fn fetch(&self, id: &UploadId) -> Result<Option<Upload>, StoreError> {
        let guard = self.uploads.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }
}

/// Reports kept in insertion order so `recent` can walk backwards.
#[derive(Default, Clone)]
pub(crate) struct InMemoryReportStore {
    reports: Arc<Mutex<Vec<Report>>>,
}

impl ReportStore for InMemoryReportStore {
    fn insert(&self, report: Report) -> Result<(), StoreError> {
        let mut guard = self.reports.lock().map_err(poisoned)?;
        if guard.iter().any(|stored| stored.report_id == report.report_id) {
            return Err(StoreError::Conflict);
        }
        guard.push(report);
        Ok(())
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<Report>, StoreError> {
        let guard = self.reports.lock().map_err(poisoned)?;
        Ok(guard.iter().find(|report| &report.report_id == id).cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<Report>, StoreError> {
        let guard = self.reports.lock().map_err(poisoned)?;
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

/// Records report links in the service log instead of sending mail.
#[derive(Debug, Clone, Default)]
pub(crate) struct LoggingNotifier {
    from: Option<String>,
}

impl LoggingNotifier {
    pub(crate) fn new(from: Option<String>) -> Self {
        Self { from }
    }
}

impl ReportNotifier for LoggingNotifier {
    fn send_report_link(&self, email: &str, report_url: &str) -> Result<(), NotifyError> {
        let Some(from) = self.from.as_deref() else {
            return Err(NotifyError::Transport(
                "EMAIL_FROM is not configured".to_string(),
            ));
        };
        if !email.contains('@') {
            return Err(NotifyError::Rejected(email.to_string()));
        }

        info!(from, to = email, report_url, "report link ready for delivery");
        Ok(())
    }
}
