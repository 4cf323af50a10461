use super::domain::{ReportId, Upload, UploadId};
use super::report::Report;

/// Storage for raw uploads. Retention is the implementation's concern.
pub trait UploadStore: Send + Sync {
    fn insert(&self, upload: Upload) -> Result<Upload, StoreError>;
    fn fetch(&self, id: &UploadId) -> Result<Option<Upload>, StoreError>;
}

/// Storage for finished reports, keyed by report id.
pub trait ReportStore: Send + Sync {
    fn insert(&self, report: Report) -> Result<(), StoreError>;
    fn fetch(&self, id: &ReportId) -> Result<Option<Report>, StoreError>;
    /// Most recent first.
    fn recent(&self, limit: usize) -> Result<Vec<Report>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook that tells a requester where their report lives.
pub trait ReportNotifier: Send + Sync {
    fn send_report_link(&self, email: &str, report_url: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("recipient rejected: {0}")]
    Rejected(String),
}
