use super::domain::InvoiceRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical invoice fields that source columns are matched against.
pub const CANONICAL_FIELDS: [&str; 8] = [
    "date",
    "currency",
    "total_excl_vat",
    "vat_amount",
    "total_incl_vat",
    "buyer_trn",
    "seller_trn",
    "lines",
];

/// Suggested source field -> canonical field correspondence, kept in the
/// order the source fields appear in the record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingSkeleton(Map<String, Value>);

impl MappingSkeleton {
    pub fn get(&self, source_field: &str) -> Option<&str> {
        self.0.get(source_field).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter_map(|(source, target)| Some((source.as_str(), target.as_str()?)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Two-column CSV (`source_field,canonical_field`) for download.
    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["source_field", "canonical_field"])?;
        for (source, target) in self.iter() {
            writer.write_record([source, target])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|err| csv::Error::from(err.into_error()))?;
        String::from_utf8(bytes).map_err(|err| {
            csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
        })
    }
}

/// Match every source field against the canonical list by normalized
/// substring containment in either direction. When several canonical fields
/// match, the last one in `CANONICAL_FIELDS` order is kept.
pub fn suggest_mapping(record: &InvoiceRecord) -> MappingSkeleton {
    let targets: Vec<(&str, String)> = CANONICAL_FIELDS
        .iter()
        .map(|field| (*field, normalize_field_name(field)))
        .collect();

    let mut mapping = Map::new();
    for source in record.field_names() {
        let normalized = normalize_field_name(source);
        for (target, normalized_target) in &targets {
            if normalized.contains(normalized_target.as_str())
                || normalized_target.contains(normalized.as_str())
            {
                mapping.insert(source.to_string(), Value::String((*target).to_string()));
            }
        }
    }

    MappingSkeleton(mapping)
}

pub(crate) fn normalize_field_name(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '\u{feff}' | '\u{200b}' | '_') && !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}
