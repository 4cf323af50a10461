use super::domain::SourceFormat;
use serde_json::{Map, Value};

/// Data rows read from tabular uploads; anything past this is dropped.
pub const MAX_TABULAR_ROWS: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON invoice data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid CSV invoice data: {0}")]
    Csv(#[from] csv::Error),
}

/// Records recovered from one upload, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecords {
    pub format: SourceFormat,
    pub records: Vec<Value>,
    pub truncated: bool,
}

/// Parse uploaded text as JSON when it opens with `{` or `[`, otherwise as
/// CSV with a header row. A bare JSON object is wrapped into a one-element
/// sequence.
pub fn parse_records(raw: &str) -> Result<ParsedRecords, ParseError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        parse_json(trimmed)
    } else {
        parse_tabular(raw)
    }
}

fn parse_json(text: &str) -> Result<ParsedRecords, ParseError> {
    let records = match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items,
        other => vec![other],
    };

    Ok(ParsedRecords {
        format: SourceFormat::Json,
        records,
        truncated: false,
    })
}

fn parse_tabular(text: &str) -> Result<ParsedRecords, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    let mut truncated = false;

    for row in reader.records() {
        let row = row?;
        if is_blank(&row) {
            continue;
        }
        if records.len() == MAX_TABULAR_ROWS {
            truncated = true;
            break;
        }

        let mut fields = Map::with_capacity(headers.len());
        for (header, value) in headers.iter().zip(row.iter()) {
            fields.insert(header.to_string(), Value::String(value.to_string()));
        }
        records.push(Value::Object(fields));
    }

    Ok(ParsedRecords {
        format: SourceFormat::Csv,
        records,
        truncated,
    })
}

fn is_blank(row: &csv::StringRecord) -> bool {
    row.iter().all(|field| field.trim().is_empty())
}
