use super::countries::{CountryProfile, CountryRegistry};
use super::domain::{InvoiceRecord, SourceFormat, Upload, UploadId};
use super::mapping::suggest_mapping;
use super::parser::{parse_records, ParseError};
use super::report::{assemble, Report, ReportMeta, ReportSource};
use super::rules;
use super::scoring::score;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("no invoice data available for analysis")]
    NoData,
    #[error("invalid invoice data format: the first record must be an object")]
    InvalidFormat,
    #[error("invalid country code '{0}'")]
    UnknownCountry(String),
}

/// Stateless analyzer over an explicit country registry.
#[derive(Debug, Clone, Default)]
pub struct ReadinessAnalyzer {
    registry: CountryRegistry,
}

impl ReadinessAnalyzer {
    pub fn new(registry: CountryRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CountryRegistry {
        &self.registry
    }

    pub fn profile(&self, country_code: &str) -> Result<&CountryProfile, AnalysisError> {
        self.registry.lookup(country_code)
    }

    /// Analyze a single record. The upload id is taken from the record's
    /// `id` field when present.
    pub fn analyze(
        &self,
        record: &InvoiceRecord,
        country_code: &str,
    ) -> Result<Report, AnalysisError> {
        let profile = self.registry.lookup(country_code)?;
        let upload_id = match record.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => UploadId(id.clone()),
            Some(Value::Number(id)) => UploadId(id.to_string()),
            _ => UploadId("unknown".to_string()),
        };
        let source = ReportSource {
            upload_id,
            meta: ReportMeta {
                rows_parsed: 1,
                source_format: None,
                truncated: false,
                declared_format: None,
            },
        };

        Ok(self.build_report(profile, record.clone(), source))
    }

    /// Analyze the first of several parsed records.
    pub fn analyze_records(
        &self,
        records: &[Value],
        country_code: &str,
        source: ReportSource,
    ) -> Result<Report, AnalysisError> {
        let profile = self.registry.lookup(country_code)?;
        let record = first_record(records)?;
        Ok(self.build_report(profile, record, source))
    }

    /// Parse raw uploaded text and analyze its first record.
    pub fn analyze_text(
        &self,
        raw: &str,
        country_code: &str,
        upload_id: UploadId,
    ) -> Result<Report, AnalysisError> {
        self.analyze_source(raw, country_code, upload_id, None)
    }

    /// Analyze a stored upload, carrying its declared format into the report.
    pub fn analyze_upload(
        &self,
        upload: &Upload,
        country_code: &str,
    ) -> Result<Report, AnalysisError> {
        self.analyze_source(
            &upload.raw_data,
            country_code,
            upload.upload_id.clone(),
            upload.declared_format,
        )
    }

    fn analyze_source(
        &self,
        raw: &str,
        country_code: &str,
        upload_id: UploadId,
        declared_format: Option<SourceFormat>,
    ) -> Result<Report, AnalysisError> {
        self.registry.lookup(country_code)?;
        let parsed = parse_records(raw)?;
        let source = ReportSource {
            upload_id,
            meta: ReportMeta {
                rows_parsed: parsed.records.len(),
                source_format: Some(parsed.format),
                truncated: parsed.truncated,
                declared_format,
            },
        };

        self.analyze_records(&parsed.records, country_code, source)
    }

    fn build_report(
        &self,
        profile: &CountryProfile,
        record: InvoiceRecord,
        source: ReportSource,
    ) -> Report {
        let findings = rules::evaluate(&record, profile);
        let scores = score(&findings);
        let mapping = suggest_mapping(&record);
        assemble(profile, record, findings, scores, mapping, source)
    }
}

/// Only the first record of a batch is analyzed.
pub fn first_record(records: &[Value]) -> Result<InvoiceRecord, AnalysisError> {
    let first = records.first().ok_or(AnalysisError::NoData)?;
    InvoiceRecord::from_value(first.clone()).ok_or(AnalysisError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_batch_has_no_data() {
        assert!(matches!(first_record(&[]), Err(AnalysisError::NoData)));
    }

    #[test]
    fn scalar_first_record_is_invalid() {
        let records = vec![json!("invoice"), json!({"currency": "AED"})];
        assert!(matches!(
            first_record(&records),
            Err(AnalysisError::InvalidFormat)
        ));
    }

    #[test]
    fn analyze_uses_record_id_as_upload_reference() {
        let analyzer = ReadinessAnalyzer::default();
        let record = InvoiceRecord::from_value(json!({"id": "INV-7"})).expect("object");
        let report = analyzer.analyze(&record, "GLOBAL").expect("report");
        assert_eq!(report.upload_id.as_str(), "INV-7");

        let anonymous = InvoiceRecord::default();
        let report = analyzer.analyze(&anonymous, "GLOBAL").expect("report");
        assert_eq!(report.upload_id.as_str(), "unknown");
    }

    #[test]
    fn country_is_checked_before_parsing() {
        let analyzer = ReadinessAnalyzer::default();
        let error = analyzer
            .analyze_text("{broken", "ZZ", UploadId("u_1".to_string()))
            .expect_err("unknown country");
        assert!(matches!(error, AnalysisError::UnknownCountry(code) if code == "ZZ"));
    }

    #[test]
    fn analyze_text_records_parse_metadata() {
        let analyzer = ReadinessAnalyzer::default();
        let report = analyzer
            .analyze_text(
                "date,currency\n2024-01-15,USD\n2024-01-16,AED\n",
                "GLOBAL",
                UploadId("u_2".to_string()),
            )
            .expect("report");

        assert_eq!(report.meta.rows_parsed, 2);
        assert_eq!(report.meta.source_format, Some(SourceFormat::Csv));
        assert_eq!(report.raw_record_echo.get("currency"), Some(&json!("USD")));
    }

    #[test]
    fn analyze_upload_flags_declared_format_mismatch() {
        let analyzer = ReadinessAnalyzer::default();
        let upload = Upload::new(
            "currency\nAED\n".to_string(),
            Some(SourceFormat::Json),
        );

        let report = analyzer.analyze_upload(&upload, "GLOBAL").expect("report");

        assert_eq!(report.upload_id, upload.upload_id);
        assert_eq!(report.meta.declared_format, Some(SourceFormat::Json));
        assert_eq!(report.meta.source_format, Some(SourceFormat::Csv));
        assert!(report.meta.format_mismatch());

        let honest = Upload::new("currency\nAED\n".to_string(), Some(SourceFormat::Csv));
        let report = analyzer.analyze_upload(&honest, "GLOBAL").expect("report");
        assert!(!report.meta.format_mismatch());
    }

    #[test]
    fn malformed_text_surfaces_parse_error() {
        let analyzer = ReadinessAnalyzer::default();
        let error = analyzer
            .analyze_text("[1,", "GLOBAL", UploadId("u_3".to_string()))
            .expect_err("parse error");
        assert!(matches!(error, AnalysisError::Parse(ParseError::Json(_))));
        assert!(error.to_string().starts_with("parse error:"));
    }
}
