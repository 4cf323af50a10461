use super::countries::CountryProfile;
use super::domain::{InvoiceRecord, ReportId, SourceFormat, UploadId};
use super::mapping::MappingSkeleton;
use super::rules::RuleFinding;
use super::scoring::ScoreSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Readiness report for one analyzed record. Built once and never mutated;
/// stores hand out clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_id: ReportId,
    pub upload_id: UploadId,
    pub created_at: DateTime<Utc>,
    pub country_code: String,
    pub country_label: String,
    pub scores: ScoreSet,
    pub findings: Vec<RuleFinding>,
    pub gaps: Vec<String>,
    pub mapping_skeleton: MappingSkeleton,
    pub raw_record_echo: InvoiceRecord,
    pub conformance_bundle: ConformanceBundle,
    pub meta: ReportMeta,
}

impl Report {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            report_id: self.report_id.clone(),
            upload_id: self.upload_id.clone(),
            created_at: self.created_at,
            overall: self.scores.overall,
        }
    }
}

/// Everything a downstream conformance tool needs, in one payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConformanceBundle {
    pub record: InvoiceRecord,
    pub mapping: MappingSkeleton,
    pub country: String,
    pub findings: Vec<RuleFinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub rows_parsed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_format: Option<SourceFormat>,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_format: Option<SourceFormat>,
}

impl ReportMeta {
    /// True when the uploader's declared format disagrees with what was parsed.
    pub fn format_mismatch(&self) -> bool {
        matches!(
            (self.declared_format, self.source_format),
            (Some(declared), Some(parsed)) if declared != parsed
        )
    }
}

/// Listing entry for recent reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub report_id: ReportId,
    pub upload_id: UploadId,
    pub created_at: DateTime<Utc>,
    pub overall: u8,
}

/// Where the analyzed record came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSource {
    pub upload_id: UploadId,
    pub meta: ReportMeta,
}

/// `"Failed <RULE_ID>"` for each failing finding, in finding order.
pub fn gaps_for(findings: &[RuleFinding]) -> Vec<String> {
    findings
        .iter()
        .filter(|finding| !finding.passed)
        .map(|finding| format!("Failed {}", finding.rule_id))
        .collect()
}

pub fn assemble(
    profile: &CountryProfile,
    record: InvoiceRecord,
    findings: Vec<RuleFinding>,
    scores: ScoreSet,
    mapping: MappingSkeleton,
    source: ReportSource,
) -> Report {
    let gaps = gaps_for(&findings);
    let conformance_bundle = ConformanceBundle {
        record: record.clone(),
        mapping: mapping.clone(),
        country: profile.code.to_string(),
        findings: findings.clone(),
    };

    Report {
        report_id: ReportId::generate(),
        upload_id: source.upload_id,
        created_at: Utc::now(),
        country_code: profile.code.to_string(),
        country_label: profile.label.to_string(),
        scores,
        findings,
        gaps,
        mapping_skeleton: mapping,
        raw_record_echo: record,
        conformance_bundle,
        meta: source.meta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::readiness::countries::CountryRegistry;
    use crate::workflows::readiness::rules::RuleId;
    use crate::workflows::readiness::scoring::score;
    use serde_json::json;

    fn finding(rule_id: RuleId, passed: bool) -> RuleFinding {
        RuleFinding {
            rule_id,
            passed,
            value: None,
            example_line_index: None,
            expected_value: None,
            actual_value: None,
            remediation_tip: (!passed).then(|| "fix it".to_string()),
        }
    }

    fn source() -> ReportSource {
        ReportSource {
            upload_id: UploadId("u_test".to_string()),
            meta: ReportMeta {
                rows_parsed: 3,
                source_format: Some(SourceFormat::Csv),
                truncated: false,
                declared_format: None,
            },
        }
    }

    #[test]
    fn gaps_follow_finding_order() {
        let findings = vec![
            finding(RuleId::TotalsBalance, true),
            finding(RuleId::DateIso, false),
            finding(RuleId::TrnPresent, false),
        ];
        assert_eq!(
            gaps_for(&findings),
            vec!["Failed DATE_ISO".to_string(), "Failed TRN_PRESENT".to_string()]
        );
    }

    #[test]
    fn assembled_reports_get_fresh_ids() {
        let registry = CountryRegistry::standard();
        let profile = registry.lookup("KSA").expect("ksa");
        let record = InvoiceRecord::from_value(json!({"currency": "SAR"})).expect("object");
        let findings = vec![finding(RuleId::CurrencyAllowed, true)];

        let first = assemble(
            profile,
            record.clone(),
            findings.clone(),
            score(&findings),
            MappingSkeleton::default(),
            source(),
        );
        let second = assemble(
            profile,
            record,
            findings.clone(),
            score(&findings),
            MappingSkeleton::default(),
            source(),
        );

        assert_ne!(first.report_id, second.report_id);
        assert!(first.report_id.as_str().starts_with("r_"));
        assert_eq!(first.country_label, "Kingdom of Saudi Arabia");
        assert_eq!(first.conformance_bundle.country, "KSA");
        assert_eq!(first.conformance_bundle.findings, findings);
        assert_eq!(first.upload_id.as_str(), "u_test");
    }

    #[test]
    fn report_json_uses_documented_keys() {
        let registry = CountryRegistry::standard();
        let profile = registry.lookup("GLOBAL").expect("global");
        let record = InvoiceRecord::from_value(json!({"date": "2024-01-15"})).expect("object");
        let findings = vec![finding(RuleId::DateIso, true)];
        let report = assemble(
            profile,
            record,
            findings.clone(),
            score(&findings),
            MappingSkeleton::default(),
            source(),
        );

        let payload = serde_json::to_value(&report).expect("serializes");
        for key in [
            "reportId",
            "uploadId",
            "createdAt",
            "countryCode",
            "countryLabel",
            "scores",
            "findings",
            "gaps",
            "mappingSkeleton",
            "rawRecordEcho",
            "meta",
        ] {
            assert!(payload.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(payload["rawRecordEcho"], json!({"date": "2024-01-15"}));
        assert_eq!(payload["meta"]["sourceFormat"], json!("csv"));

        let round_trip: Report = serde_json::from_value(payload).expect("deserializes");
        assert_eq!(round_trip, report);
    }
}
