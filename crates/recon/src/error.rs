use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty delimiter, marker without a dot, etc.).
    ConfigValidation(String),
    /// Template lacks one of the structural sheets (dictionary, terms).
    MissingRequiredSheet { sheet: String },
    /// A record type has no matching template sheet.
    UnknownRecordType(String),
    /// Encoded linking value without the delimiter (strict mode only).
    MalformedLink {
        record_type: String,
        column: String,
        row: usize,
        value: String,
    },
    /// Two extracts carry the same record type (strict mode only).
    DuplicateRecordType {
        record_type: String,
        previous: String,
        source: String,
    },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingRequiredSheet { sheet } => {
                write!(f, "template is missing the required '{sheet}' sheet")
            }
            Self::UnknownRecordType(record_type) => {
                write!(f, "no template sheet for record type '{record_type}'")
            }
            Self::MalformedLink { record_type, column, row, value } => {
                write!(
                    f,
                    "record type '{record_type}', column '{column}', row {row}: \
                     malformed linking value '{value}'"
                )
            }
            Self::DuplicateRecordType { record_type, previous, source } => {
                write!(
                    f,
                    "record type '{record_type}' found in both '{previous}' and '{source}'"
                )
            }
        }
    }
}

impl std::error::Error for ReconError {}
