use std::sync::Arc;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::analysis::{AnalysisError, ReadinessAnalyzer};
use super::countries::CountryProfile;
use super::domain::{ReportId, SourceFormat, Upload, UploadId};
use super::intake::classify_upload;
use super::report::{Report, ReportSummary};
use super::repository::{ReportNotifier, ReportStore, StoreError, UploadStore};
use crate::config::IntakeConfig;

const MAX_RECENT_REPORTS: usize = 100;

/// Service composing the stores, the analyzer, and the notifier.
pub struct ReadinessService<U, R, N> {
    analyzer: Arc<ReadinessAnalyzer>,
    uploads: Arc<U>,
    reports: Arc<R>,
    notifier: Arc<N>,
    intake: IntakeConfig,
    share_base_url: String,
}

/// Raw upload as received from a transport.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub upload_id: UploadId,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_opt_in: bool,
}

impl<U, R, N> ReadinessService<U, R, N>
where
    U: UploadStore + 'static,
    R: ReportStore + 'static,
    N: ReportNotifier + 'static,
{
    pub fn new(
        uploads: Arc<U>,
        reports: Arc<R>,
        notifier: Arc<N>,
        intake: IntakeConfig,
        share_base_url: impl Into<String>,
    ) -> Self {
        Self::with_analyzer(
            ReadinessAnalyzer::default(),
            uploads,
            reports,
            notifier,
            intake,
            share_base_url,
        )
    }

    pub fn with_analyzer(
        analyzer: ReadinessAnalyzer,
        uploads: Arc<U>,
        reports: Arc<R>,
        notifier: Arc<N>,
        intake: IntakeConfig,
        share_base_url: impl Into<String>,
    ) -> Self {
        let share_base_url = share_base_url.into().trim_end_matches('/').to_string();

        Self {
            analyzer: Arc::new(analyzer),
            uploads,
            reports,
            notifier,
            intake,
            share_base_url,
        }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.intake.max_upload_bytes
    }

    pub fn countries(&self) -> &[CountryProfile] {
        self.analyzer.registry().profiles()
    }

    pub fn share_url(&self, report_id: &ReportId) -> String {
        format!("{}/share/{}", self.share_base_url, report_id)
    }

    /// Store uploaded CSV/JSON text as an immutable upload.
    pub fn ingest(&self, request: UploadRequest) -> Result<UploadReceipt, ReadinessServiceError> {
        let UploadRequest {
            body,
            content_type,
            filename,
        } = request;

        let kind = classify_upload(content_type.as_deref(), filename.as_deref())
            .ok_or(ReadinessServiceError::UnsupportedUploadType)?;

        if body.len() as u64 > self.intake.max_upload_bytes {
            return Err(ReadinessServiceError::UploadTooLarge {
                limit: self.intake.max_upload_bytes,
            });
        }

        let raw_data = String::from_utf8(body).map_err(|_| ReadinessServiceError::InvalidEncoding)?;
        if raw_data.trim().is_empty() {
            return Err(ReadinessServiceError::EmptyUpload);
        }

        let stored = self
            .uploads
            .insert(Upload::new(raw_data, kind.declared_format()))?;
        info!(
            upload_id = %stored.upload_id,
            bytes = stored.raw_data.len(),
            declared = stored.declared_format.map(SourceFormat::label).unwrap_or("none"),
            "invoice upload stored"
        );

        Ok(UploadReceipt {
            upload_id: stored.upload_id,
            message: "File uploaded successfully".to_string(),
        })
    }

    /// Analyze a stored upload, persist the report, then notify on request.
    pub fn analyze(&self, request: AnalyzeRequest) -> Result<Report, ReadinessServiceError> {
        let upload_id = request
            .upload_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| UploadId(id.to_string()))
            .ok_or(ReadinessServiceError::MissingUploadId)?;

        let country = request
            .country
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .unwrap_or(self.intake.default_country.as_str())
            .to_string();

        self.analyzer.profile(&country)?;

        let upload = self
            .uploads
            .fetch(&upload_id)?
            .ok_or_else(|| ReadinessServiceError::UploadNotFound(upload_id.clone()))?;

        let report = self.analyzer.analyze_upload(&upload, &country)?;
        if report.meta.format_mismatch() {
            warn!(
                upload_id = %report.upload_id,
                declared = report.meta.declared_format.map(SourceFormat::label).unwrap_or("none"),
                parsed = report.meta.source_format.map(SourceFormat::label).unwrap_or("none"),
                "upload content does not match its declared format"
            );
        }

        self.reports
            .insert(report.clone())
            .map_err(|source| ReadinessServiceError::ReportNotPersisted {
                report_id: report.report_id.clone(),
                source,
            })?;

        info!(
            report_id = %report.report_id,
            upload_id = %report.upload_id,
            country = %report.country_code,
            overall = report.scores.overall,
            gaps = report.gaps.len(),
            "readiness report stored"
        );

        if request.email_opt_in {
            if let Some(email) = request.email.as_deref().map(str::trim) {
                if !email.is_empty() {
                    self.notify(email, &report.report_id);
                }
            }
        }

        Ok(report)
    }

    pub fn report(&self, report_id: &ReportId) -> Result<Report, ReadinessServiceError> {
        self.reports
            .fetch(report_id)?
            .ok_or_else(|| ReadinessServiceError::ReportNotFound(report_id.clone()))
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<ReportSummary>, ReadinessServiceError> {
        let limit = limit.clamp(1, MAX_RECENT_REPORTS);
        Ok(self
            .reports
            .recent(limit)?
            .iter()
            .map(Report::summary)
            .collect())
    }

    pub fn mapping_csv(&self, report_id: &ReportId) -> Result<String, ReadinessServiceError> {
        let report = self.report(report_id)?;
        Ok(report.mapping_skeleton.to_csv()?)
    }

    fn notify(&self, email: &str, report_id: &ReportId) {
        let url = self.share_url(report_id);
        match self.notifier.send_report_link(email, &url) {
            Ok(()) => info!(report_id = %report_id, "report link sent"),
            Err(err) => warn!(
                report_id = %report_id,
                error = %err,
                "failed to send report link; continuing"
            ),
        }
    }
}

/// Error raised by the readiness service.
#[derive(Debug, thiserror::Error)]
pub enum ReadinessServiceError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("invalid request body: {0}")]
    InvalidRequest(String),
    #[error("uploadId required")]
    MissingUploadId,
    #[error("upload not found: {0}")]
    UploadNotFound(UploadId),
    #[error("report not found: {0}")]
    ReportNotFound(ReportId),
    #[error("file or text required")]
    EmptyUpload,
    #[error("upload exceeds the {limit} byte limit")]
    UploadTooLarge { limit: u64 },
    #[error("invalid file type: only CSV and JSON are allowed")]
    UnsupportedUploadType,
    #[error("uploaded data must be UTF-8 text")]
    InvalidEncoding,
    #[error("report {report_id} was produced but could not be stored: {source}")]
    ReportNotPersisted {
        report_id: ReportId,
        source: StoreError,
    },
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("mapping export failed: {0}")]
    Export(#[from] csv::Error),
}

impl ReadinessServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Analysis(_)
            | Self::InvalidRequest(_)
            | Self::MissingUploadId
            | Self::EmptyUpload
            | Self::InvalidEncoding => StatusCode::BAD_REQUEST,
            Self::UploadNotFound(_) | Self::ReportNotFound(_) => StatusCode::NOT_FOUND,
            Self::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedUploadType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::ReportNotPersisted { .. } | Self::Storage(_) | Self::Export(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
