use super::rules::RuleFinding;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// Placeholders; only the rules component is measured today.
pub const DATA_SCORE: u8 = 100;
pub const COVERAGE_SCORE: u8 = 100;
pub const POSTURE_SCORE: u8 = 80;

const DATA_WEIGHT: u32 = 25;
const COVERAGE_WEIGHT: u32 = 35;
const RULES_WEIGHT: u32 = 30;
const POSTURE_WEIGHT: u32 = 10;

/// Readiness scores, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub data: u8,
    pub coverage: u8,
    pub rules: u8,
    pub posture: u8,
    pub overall: u8,
}

/// Aggregate findings into a score set. A rule id counts once even if it
/// appears more than once.
pub fn score(findings: &[RuleFinding]) -> ScoreSet {
    let mut seen = HashSet::new();
    let (passed, total) = findings
        .iter()
        .filter(|finding| seen.insert(finding.rule_id))
        .fold((0usize, 0usize), |(passed, total), finding| {
            (passed + usize::from(finding.passed), total + 1)
        });

    let rules = rules_score(passed, total);
    ScoreSet {
        data: DATA_SCORE,
        coverage: COVERAGE_SCORE,
        rules,
        posture: POSTURE_SCORE,
        overall: overall_score(DATA_SCORE, COVERAGE_SCORE, rules, POSTURE_SCORE),
    }
}

/// `round(100 * passed / total)`, half rounding up. No rules scores 100.
pub fn rules_score(passed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let passed = passed.min(total) as u64;
    let total = total as u64;
    ((200 * passed + total) / (2 * total)) as u8
}

/// Weighted composite 0.25/0.35/0.30/0.10, half rounding up.
pub fn overall_score(data: u8, coverage: u8, rules: u8, posture: u8) -> u8 {
    let weighted = DATA_WEIGHT * u32::from(data)
        + COVERAGE_WEIGHT * u32::from(coverage)
        + RULES_WEIGHT * u32::from(rules)
        + POSTURE_WEIGHT * u32::from(posture);
    ((weighted + 50) / 100) as u8
}
