use super::domain::InvoiceRecord;
use serde_json::Value;

const PATH_SEPARATOR: char = '.';

/// Return the first candidate present in the record. A candidate is tried
/// as a literal key first; dotted candidates then walk nested objects (and
/// array indices), giving up on the first missing segment.
pub fn resolve<'a>(record: &'a InvoiceRecord, candidates: &[&str]) -> Option<&'a Value> {
    candidates.iter().find_map(|candidate| {
        record.get(candidate).or_else(|| {
            if candidate.contains(PATH_SEPARATOR) {
                walk_path(record, candidate)
            } else {
                None
            }
        })
    })
}

fn walk_path<'a>(record: &'a InvoiceRecord, path: &str) -> Option<&'a Value> {
    let mut segments = path.split(PATH_SEPARATOR);
    let mut current = record.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Value::Object(fields) => fields.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Text view of a resolved value: strings verbatim, numbers in their JSON
/// rendering, everything else empty.
pub fn text_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Numeric view used by the arithmetic checks. Numeric strings are coerced;
/// absent, null, non-numeric or non-finite values count as zero.
pub fn numeric_value(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    number.filter(|n| n.is_finite()).unwrap_or(0.0)
}
