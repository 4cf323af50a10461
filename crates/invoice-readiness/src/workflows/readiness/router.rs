use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::ReportId;
use super::repository::{ReportNotifier, ReportStore, UploadStore};
use super::service::{AnalyzeRequest, ReadinessService, ReadinessServiceError, UploadRequest};

const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadParams {
    #[serde(default)]
    pub(crate) filename: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecentParams {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

/// Router builder exposing upload, analysis, and report endpoints.
pub fn readiness_router<U, R, N>(service: Arc<ReadinessService<U, R, N>>) -> Router
where
    U: UploadStore + 'static,
    R: ReportStore + 'static,
    N: ReportNotifier + 'static,
{
    // Leave headroom so the service, not the extractor, reports oversize bodies.
    let body_limit = usize::try_from(service.max_upload_bytes())
        .unwrap_or(usize::MAX)
        .saturating_mul(2);

    Router::new()
        .route("/api/v1/uploads", post(upload_handler::<U, R, N>))
        .route("/api/v1/analyze", post(analyze_handler::<U, R, N>))
        .route("/api/v1/countries", get(countries_handler::<U, R, N>))
        .route("/api/v1/reports", get(recent_handler::<U, R, N>))
        .route("/api/v1/reports/:report_id", get(report_handler::<U, R, N>))
        .route(
            "/api/v1/reports/:report_id/mapping.csv",
            get(mapping_handler::<U, R, N>),
        )
        .route("/share/:report_id", get(share_handler::<U, R, N>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

pub(crate) async fn upload_handler<U, R, N>(
    State(service): State<Arc<ReadinessService<U, R, N>>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    U: UploadStore + 'static,
    R: ReportStore + 'static,
    N: ReportNotifier + 'static,
{
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let request = UploadRequest {
        body: body.to_vec(),
        content_type,
        filename: params.filename,
    };

    match service.ingest(request) {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn analyze_handler<U, R, N>(
    State(service): State<Arc<ReadinessService<U, R, N>>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response
where
    U: UploadStore + 'static,
    R: ReportStore + 'static,
    N: ReportNotifier + 'static,
{
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return error_response(ReadinessServiceError::InvalidRequest(rejection.body_text()));
        }
    };

    match service.analyze(request) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn countries_handler<U, R, N>(
    State(service): State<Arc<ReadinessService<U, R, N>>>,
) -> Response
where
    U: UploadStore + 'static,
    R: ReportStore + 'static,
    N: ReportNotifier + 'static,
{
    (StatusCode::OK, Json(service.countries())).into_response()
}

pub(crate) async fn recent_handler<U, R, N>(
    State(service): State<Arc<ReadinessService<U, R, N>>>,
    Query(params): Query<RecentParams>,
) -> Response
where
    U: UploadStore + 'static,
    R: ReportStore + 'static,
    N: ReportNotifier + 'static,
{
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    match service.recent(limit) {
        Ok(summaries) => (StatusCode::OK, Json(summaries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<U, R, N>(
    State(service): State<Arc<ReadinessService<U, R, N>>>,
    Path(report_id): Path<String>,
) -> Response
where
    U: UploadStore + 'static,
    R: ReportStore + 'static,
    N: ReportNotifier + 'static,
{
    match service.report(&ReportId(report_id)) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn mapping_handler<U, R, N>(
    State(service): State<Arc<ReadinessService<U, R, N>>>,
    Path(report_id): Path<String>,
) -> Response
where
    U: UploadStore + 'static,
    R: ReportStore + 'static,
    N: ReportNotifier + 'static,
{
    let report_id = ReportId(report_id);
    match service.mapping_csv(&report_id) {
        Ok(csv) => {
            let disposition = format!("attachment; filename=\"mapping-{report_id}.csv\"");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                csv,
            )
                .into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn share_handler<U, R, N>(
    State(service): State<Arc<ReadinessService<U, R, N>>>,
    Path(report_id): Path<String>,
) -> Response
where
    U: UploadStore + 'static,
    R: ReportStore + 'static,
    N: ReportNotifier + 'static,
{
    let report = match service.report(&ReportId(report_id)) {
        Ok(report) => report,
        Err(ReadinessServiceError::ReportNotFound(_)) => {
            return (
                StatusCode::NOT_FOUND,
                Html("<h1>Report not found</h1>".to_string()),
            )
                .into_response();
        }
        Err(error) => return error_response(error),
    };

    let pretty = serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string());
    let page = format!(
        "<html>\n<head><title>Shared Report</title></head>\n<body>\n\
<h1>Readiness Report: {id}</h1>\n\
<p>Overall score: {overall} ({country})</p>\n\
<pre>{body}</pre>\n</body>\n</html>\n",
        id = escape_html(report.report_id.as_str()),
        overall = report.scores.overall,
        country = escape_html(&report.country_label),
        body = escape_html(&pretty),
    );

    (StatusCode::OK, Html(page)).into_response()
}

fn error_response(error: ReadinessServiceError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (error.status_code(), Json(payload)).into_response()
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
