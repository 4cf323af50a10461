use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Value};

use crate::config::IntakeConfig;
use crate::workflows::readiness::domain::{ReportId, Upload, UploadId};
use crate::workflows::readiness::report::Report;
use crate::workflows::readiness::repository::{
    NotifyError, ReportNotifier, ReportStore, StoreError, UploadStore,
};
use crate::workflows::readiness::{readiness_router, ReadinessService, UploadRequest};

pub(super) const SHARE_BASE: &str = "https://reports.example.test";

pub(super) fn uae_invoice() -> Value {
    json!({
        "invoice_number": "INV-1001",
        "date": "2024-01-15",
        "currency": "AED",
        "buyer_trn": "100000000000003",
        "seller_trn": "100000000000004",
        "total_excl_vat": 100,
        "vat_amount": 5,
        "total_incl_vat": 105,
        "lines": [
            { "description": "Consulting", "qty": 2, "unit_price": 50, "line_total": 100 }
        ]
    })
}

pub(super) fn usd_invoice() -> Value {
    let mut invoice = uae_invoice();
    invoice["currency"] = json!("USD");
    invoice
}

pub(super) fn json_upload(payload: &Value) -> UploadRequest {
    UploadRequest {
        body: serde_json::to_vec(payload).expect("serialize payload"),
        content_type: Some("application/json".to_string()),
        filename: Some("invoices.json".to_string()),
    }
}

pub(super) fn intake() -> IntakeConfig {
    IntakeConfig {
        max_upload_bytes: 4 * 1024,
        default_country: "GLOBAL".to_string(),
    }
}

pub(super) type MemoryService = ReadinessService<MemoryUploads, MemoryReports, RecordingNotifier>;

pub(super) fn build_service() -> (
    MemoryService,
    Arc<MemoryUploads>,
    Arc<MemoryReports>,
    Arc<RecordingNotifier>,
) {
    let uploads = Arc::new(MemoryUploads::default());
    let reports = Arc::new(MemoryReports::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = ReadinessService::new(
        uploads.clone(),
        reports.clone(),
        notifier.clone(),
        intake(),
        SHARE_BASE,
    );
    (service, uploads, reports, notifier)
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    readiness_router(Arc::new(service))
}

#[derive(Default)]
pub(super) struct MemoryUploads {
    entries: Mutex<HashMap<UploadId, Upload>>,
}

impl MemoryUploads {
    pub(super) fn count(&self) -> usize {
        self.entries.lock().expect("upload mutex poisoned").len()
    }
}

impl UploadStore for MemoryUploads {
    fn insert(&self, upload: Upload) -> Result<Upload, StoreError> {
        let mut guard = self.entries.lock().expect("upload mutex poisoned");
        if guard.contains_key(&upload.upload_id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(upload.upload_id.clone(), upload.clone());
        Ok(upload)
    }

    fn fetch(&self, id: &UploadId) -> Result<Option<Upload>, StoreError> {
        let guard = self.entries.lock().expect("upload mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryReports {
    entries: Mutex<Vec<Report>>,
}

impl MemoryReports {
    pub(super) fn count(&self) -> usize {
        self.entries.lock().expect("report mutex poisoned").len()
    }
}

impl ReportStore for MemoryReports {
    fn insert(&self, report: Report) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().expect("report mutex poisoned");
        if guard.iter().any(|stored| stored.report_id == report.report_id) {
            return Err(StoreError::Conflict);
        }
        guard.push(report);
        Ok(())
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<Report>, StoreError> {
        let guard = self.entries.lock().expect("report mutex poisoned");
        Ok(guard.iter().find(|report| &report.report_id == id).cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<Report>, StoreError> {
        let guard = self.entries.lock().expect("report mutex poisoned");
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

pub(super) struct UnavailableReports;

impl ReportStore for UnavailableReports {
    fn insert(&self, _report: Report) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ReportId) -> Result<Option<Report>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<Report>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub(super) fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl ReportNotifier for RecordingNotifier {
    fn send_report_link(&self, email: &str, report_url: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push((email.to_string(), report_url.to_string()));
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl ReportNotifier for FailingNotifier {
    fn send_report_link(&self, _email: &str, _report_url: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay down".to_string()))
    }
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = read_body(response).await;
    serde_json::from_slice(&body).expect("json payload")
}
