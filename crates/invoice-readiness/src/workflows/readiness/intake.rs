use super::domain::SourceFormat;
use mime::Mime;

/// Outcome of checking an upload's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Declared(SourceFormat),
    /// Plain text or no declaration; the parser decides.
    Undeclared,
}

impl UploadKind {
    pub fn declared_format(self) -> Option<SourceFormat> {
        match self {
            Self::Declared(format) => Some(format),
            Self::Undeclared => None,
        }
    }
}

/// Accept CSV/JSON by content type or by `.csv`/`.json` file extension.
/// Returns `None` when neither is acceptable.
pub fn classify_upload(content_type: Option<&str>, filename: Option<&str>) -> Option<UploadKind> {
    let declared = content_type.and_then(|raw| raw.trim().parse::<Mime>().ok());
    let guessed = filename.and_then(|name| mime_guess::from_path(name.trim()).first());

    match (declared.as_ref().and_then(format_for), guessed.as_ref()) {
        (Some(format), _) => Some(UploadKind::Declared(format)),
        (None, Some(guess)) if has_known_extension(filename) => {
            format_for(guess).map(UploadKind::Declared)
        }
        _ => match declared {
            None if filename.is_none() => Some(UploadKind::Undeclared),
            Some(mime) if mime.type_() == mime::TEXT && mime.subtype() == mime::PLAIN => {
                Some(UploadKind::Undeclared)
            }
            _ => None,
        },
    }
}

fn has_known_extension(filename: Option<&str>) -> bool {
    filename
        .map(|name| {
            let lower = name.trim().to_ascii_lowercase();
            lower.ends_with(".csv") || lower.ends_with(".json")
        })
        .unwrap_or(false)
}

fn format_for(mime: &Mime) -> Option<SourceFormat> {
    match (mime.type_().as_str(), mime.subtype().as_str()) {
        ("application", "json") => Some(SourceFormat::Json),
        ("text", "csv") | ("application", "csv") => Some(SourceFormat::Csv),
        _ => None,
    }
}
