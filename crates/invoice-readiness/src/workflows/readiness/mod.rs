//! E-invoicing readiness analysis: intake of CSV/JSON invoice exports,
//! country-aware rule checks, scoring, field-mapping suggestions, and
//! persisted shareable reports.

pub mod analysis;
pub mod countries;
pub mod domain;
pub mod intake;
pub mod mapping;
pub mod parser;
pub mod report;
pub mod repository;
pub(crate) mod resolver;
pub mod router;
pub mod rules;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use analysis::{first_record, AnalysisError, ReadinessAnalyzer};
pub use countries::{CountryProfile, CountryRegistry, GLOBAL_COUNTRY_CODE};
pub use domain::{InvoiceRecord, ReportId, SourceFormat, Upload, UploadId};
pub use intake::{classify_upload, UploadKind};
pub use mapping::{suggest_mapping, MappingSkeleton, CANONICAL_FIELDS};
pub use parser::{parse_records, ParseError, ParsedRecords, MAX_TABULAR_ROWS};
pub use report::{ConformanceBundle, Report, ReportMeta, ReportSummary};
pub use repository::{NotifyError, ReportNotifier, ReportStore, StoreError, UploadStore};
pub use resolver::resolve;
pub use router::readiness_router;
pub use rules::{evaluate, RuleFinding, RuleId};
pub use scoring::{score, ScoreSet};
pub use service::{
    AnalyzeRequest, ReadinessService, ReadinessServiceError, UploadReceipt, UploadRequest,
};
