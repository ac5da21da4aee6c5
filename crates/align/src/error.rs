use std::fmt;

#[derive(Debug)]
pub enum AlignError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, empty field name, etc.).
    ConfigValidation(String),
    /// Payload is not valid JSON, or its top level is not an array.
    Json(String),
    /// A record with a recognized source is missing a usable field.
    MalformedData { index: usize, field: String, reason: String },
}

impl fmt::Display for AlignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Json(msg) => write!(f, "malformed payload: {msg}"),
            Self::MalformedData { index, field, reason } => {
                write!(f, "record {index}: field '{field}' {reason}")
            }
        }
    }
}

impl std::error::Error for AlignError {}

impl AlignError {
    /// True for errors caused by the fetched data rather than the configuration.
    pub fn is_malformed_data(&self) -> bool {
        matches!(self, Self::Json(_) | Self::MalformedData { .. })
    }
}
