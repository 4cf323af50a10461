use clap::Args;
use invoice_readiness::error::AppError;
use invoice_readiness::workflows::readiness::{
    CountryProfile, ReadinessAnalyzer, Report, UploadId, GLOBAL_COUNTRY_CODE,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// CSV or JSON invoice export to analyze
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// Country profile code (UAE, KSA, MY, GLOBAL)
    #[arg(long, default_value = GLOBAL_COUNTRY_CODE)]
    pub(crate) country: String,
    /// Print the full report as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let AnalyzeArgs {
        file,
        country,
        json,
    } = args;

    let raw = std::fs::read_to_string(&file)?;
    let analyzer = ReadinessAnalyzer::default();
    let report = analyzer.analyze_text(&raw, &country, UploadId(file.display().to_string()))?;

    if json {
        let payload = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
        println!("{payload}");
    } else {
        println!("{}", render_report(&report));
    }

    Ok(())
}

pub(crate) fn run_countries() {
    let analyzer = ReadinessAnalyzer::default();
    println!("{}", render_countries(analyzer.registry().profiles()));
}

pub(crate) fn render_report(report: &Report) -> String {
    let mut lines = vec![
        format!(
            "Readiness report {} ({} / {})",
            report.report_id, report.country_label, report.country_code
        ),
        format!(
            "- Overall readiness: {} | data {} | coverage {} | rules {} | posture {}",
            report.scores.overall,
            report.scores.data,
            report.scores.coverage,
            report.scores.rules,
            report.scores.posture
        ),
        format!(
            "- Rows parsed: {}{}{}",
            report.meta.rows_parsed,
            report
                .meta
                .source_format
                .map(|format| format!(" from {}", format.label()))
                .unwrap_or_default(),
            if report.meta.truncated {
                " (truncated)"
            } else {
                ""
            }
        ),
        "Rule checks:".to_string(),
    ];

    for finding in &report.findings {
        let verdict = if finding.passed { "pass" } else { "FAIL" };
        let mut line = format!("  - {}: {}", finding.rule_id, verdict);
        if let Some(index) = finding.example_line_index {
            line.push_str(&format!(" (line {index})"));
        }
        if let Some(tip) = &finding.remediation_tip {
            line.push_str(&format!(" -> {tip}"));
        }
        lines.push(line);
    }

    if report.mapping_skeleton.is_empty() {
        lines.push("No field mapping suggestions.".to_string());
    } else {
        lines.push("Suggested field mapping:".to_string());
        for (source, target) in report.mapping_skeleton.iter() {
            lines.push(format!("  - {source} -> {target}"));
        }
    }

    lines.join("\n")
}

pub(crate) fn render_countries(profiles: &[CountryProfile]) -> String {
    profiles
        .iter()
        .map(|profile| {
            let trn = profile
                .required_trn_length
                .map(|length| format!("TRN {length} chars"))
                .unwrap_or_else(|| "TRN length unchecked".to_string());
            format!(
                "{:<7} {} | currencies: {} | {}",
                profile.code,
                profile.label,
                profile.currency_list(),
                trn
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
