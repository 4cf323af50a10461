use super::countries::CountryProfile;
use super::domain::InvoiceRecord;
use super::resolver::{numeric_value, resolve, text_value};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

/// Absolute tolerance for totals and line arithmetic, in currency units.
pub const BALANCE_TOLERANCE: f64 = 0.01;

// The tolerance is inclusive on the decimal amounts: 105.01 against 105.00
// passes even though the f64 difference is 0.010000000000005116.
const FLOAT_SLACK: f64 = 1e-9;

const DATE_FIELDS: &[&str] = &["date", "issue_date", "invoice.issue_date", "invoice.issuedate"];
const CURRENCY_FIELDS: &[&str] = &["currency", "invoice.currency"];
const BUYER_TRN_FIELDS: &[&str] = &["buyer_trn", "buyer.trn"];
const SELLER_TRN_FIELDS: &[&str] = &["seller_trn", "seller.trn"];

static ISO_DATE: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleId {
    TotalsBalance,
    LineMath,
    DateIso,
    CurrencyAllowed,
    TrnPresent,
    TrnLength,
}

impl RuleId {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::TotalsBalance,
            Self::LineMath,
            Self::DateIso,
            Self::CurrencyAllowed,
            Self::TrnPresent,
            Self::TrnLength,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::TotalsBalance => "TOTALS_BALANCE",
            Self::LineMath => "LINE_MATH",
            Self::DateIso => "DATE_ISO",
            Self::CurrencyAllowed => "CURRENCY_ALLOWED",
            Self::TrnPresent => "TRN_PRESENT",
            Self::TrnLength => "TRN_LENGTH",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of a single rule with its diagnostic payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFinding {
    pub rule_id: RuleId,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_line_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation_tip: Option<String>,
}

struct RuleContext<'a> {
    record: &'a InvoiceRecord,
    profile: &'a CountryProfile,
}

#[derive(Default)]
struct Check {
    passed: bool,
    value: Option<Value>,
    example_line_index: Option<usize>,
    expected_value: Option<f64>,
    actual_value: Option<f64>,
}

impl Check {
    fn verdict(passed: bool) -> Self {
        Self {
            passed,
            ..Self::default()
        }
    }
}

struct RuleDefinition {
    id: RuleId,
    applies: fn(&CountryProfile) -> bool,
    evaluate: fn(&RuleContext<'_>) -> Check,
    tip: fn(&CountryProfile) -> String,
}

const RULES: [RuleDefinition; 6] = [
    RuleDefinition {
        id: RuleId::TotalsBalance,
        applies: always,
        evaluate: totals_balance,
        tip: totals_tip,
    },
    RuleDefinition {
        id: RuleId::LineMath,
        applies: always,
        evaluate: line_math,
        tip: line_math_tip,
    },
    RuleDefinition {
        id: RuleId::DateIso,
        applies: always,
        evaluate: date_iso,
        tip: date_tip,
    },
    RuleDefinition {
        id: RuleId::CurrencyAllowed,
        applies: always,
        evaluate: currency_allowed,
        tip: currency_tip,
    },
    RuleDefinition {
        id: RuleId::TrnPresent,
        applies: always,
        evaluate: trn_present,
        tip: trn_present_tip,
    },
    RuleDefinition {
        id: RuleId::TrnLength,
        applies: has_trn_length,
        evaluate: trn_length,
        tip: trn_length_tip,
    },
];

/// Run every applicable rule in fixed order. No rule short-circuits another.
pub fn evaluate(record: &InvoiceRecord, profile: &CountryProfile) -> Vec<RuleFinding> {
    let context = RuleContext { record, profile };

    RULES
        .iter()
        .filter(|rule| (rule.applies)(profile))
        .map(|rule| {
            let check = (rule.evaluate)(&context);
            RuleFinding {
                rule_id: rule.id,
                passed: check.passed,
                value: check.value,
                example_line_index: check.example_line_index,
                expected_value: check.expected_value,
                actual_value: check.actual_value,
                remediation_tip: (!check.passed).then(|| (rule.tip)(profile)),
            }
        })
        .collect()
}

fn always(_: &CountryProfile) -> bool {
    true
}

fn has_trn_length(profile: &CountryProfile) -> bool {
    profile.required_trn_length.is_some()
}

fn totals_tip(_: &CountryProfile) -> String {
    "total_incl_vat = total_excl_vat + vat_amount".to_string()
}

fn line_math_tip(_: &CountryProfile) -> String {
    "line_total = qty * unit_price".to_string()
}

fn date_tip(_: &CountryProfile) -> String {
    "Use format YYYY-MM-DD".to_string()
}

fn currency_tip(profile: &CountryProfile) -> String {
    format!(
        "Allowed currencies for {}: {}",
        profile.label,
        profile.currency_list()
    )
}

fn trn_present_tip(_: &CountryProfile) -> String {
    "TRN must be non-empty".to_string()
}

fn trn_length_tip(profile: &CountryProfile) -> String {
    match profile.required_trn_length {
        Some(length) => format!(
            "TRN length must be {} characters for {}",
            length, profile.label
        ),
        None => "TRN must match country-specific length requirements".to_string(),
    }
}

fn within_tolerance(expected: f64, actual: f64) -> bool {
    (expected - actual).abs() <= BALANCE_TOLERANCE + FLOAT_SLACK
}

fn field_number(record: &InvoiceRecord, key: &str) -> f64 {
    numeric_value(record.get(key))
}

fn totals_balance(context: &RuleContext<'_>) -> Check {
    let excl = field_number(context.record, "total_excl_vat");
    let vat = field_number(context.record, "vat_amount");
    let incl = field_number(context.record, "total_incl_vat");
    let expected = excl + vat;

    Check {
        passed: within_tolerance(expected, incl),
        expected_value: Some(expected),
        actual_value: Some(incl),
        ..Check::default()
    }
}

fn line_math(context: &RuleContext<'_>) -> Check {
    let Some(lines) = context.record.get("lines").and_then(Value::as_array) else {
        return Check::verdict(true);
    };

    for (index, line) in lines.iter().enumerate() {
        let qty = numeric_value(line.get("qty"));
        let unit_price = numeric_value(line.get("unit_price"));
        let line_total = numeric_value(line.get("line_total"));
        let expected = qty * unit_price;

        if !within_tolerance(expected, line_total) {
            return Check {
                passed: false,
                example_line_index: Some(index + 1),
                expected_value: Some(expected),
                actual_value: Some(line_total),
                ..Check::default()
            };
        }
    }

    Check::verdict(true)
}

fn iso_date() -> &'static Regex {
    ISO_DATE.get_or_init(|| {
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("static date pattern compiles")
    })
}

fn date_iso(context: &RuleContext<'_>) -> Check {
    let value = resolve(context.record, DATE_FIELDS);
    let passed = value
        .and_then(Value::as_str)
        .map(|date| iso_date().is_match(date))
        .unwrap_or(false);

    Check {
        passed,
        value: Some(echo(value)),
        ..Check::default()
    }
}

fn currency_allowed(context: &RuleContext<'_>) -> Check {
    let value = resolve(context.record, CURRENCY_FIELDS);
    let currency = text_value(value);
    let passed = !currency.is_empty() && context.profile.allows_currency(&currency);

    Check {
        passed,
        value: Some(echo(value)),
        ..Check::default()
    }
}

fn trn_values(record: &InvoiceRecord) -> (String, String) {
    (
        text_value(resolve(record, BUYER_TRN_FIELDS)),
        text_value(resolve(record, SELLER_TRN_FIELDS)),
    )
}

fn trn_present(context: &RuleContext<'_>) -> Check {
    let (buyer, seller) = trn_values(context.record);
    Check::verdict(!buyer.trim().is_empty() && !seller.trim().is_empty())
}

fn trn_length(context: &RuleContext<'_>) -> Check {
    let (buyer, seller) = trn_values(context.record);
    let buyer_len = buyer.chars().count();
    let seller_len = seller.chars().count();
    let present = !buyer.trim().is_empty() && !seller.trim().is_empty();
    let passed = match context.profile.required_trn_length {
        Some(required) => present && buyer_len == required && seller_len == required,
        None => present,
    };

    Check {
        passed,
        value: Some(Value::String(format!(
            "Buyer: {buyer_len}, Seller: {seller_len}"
        ))),
        ..Check::default()
    }
}

fn echo(value: Option<&Value>) -> Value {
    value
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()))
}
