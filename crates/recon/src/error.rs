use std::fmt;

use crate::model::Platform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (negative fee, rate above 100%, etc.).
    ConfigValidation(String),
    /// Required column(s) absent from an uploaded platform export.
    /// `missing` lists every absent header, in declaration order.
    Schema {
        platform: Platform,
        source: String,
        missing: Vec<String>,
    },
    /// Required column(s) absent from a persisted summary table.
    SummarySchema { source: String, missing: Vec<String> },
    /// Amount cell that is neither empty nor numeric.
    AmountParse {
        record_id: String,
        column: String,
        value: String,
    },
    /// Row carries amounts but no usable driver name.
    MissingDriver { platform: Platform, record_id: String },
    /// A sum or difference left the `i64` minor-unit range. `record_id` is
    /// the row, driver or total being accumulated.
    AmountOverflow { record_id: String },
    /// No export was supplied for any platform.
    EmptyUpload,
    /// IO / CSV decoding error.
    Io(String),
}

impl ReconError {
    /// True for errors caused by a malformed upload rather than bad numbers.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. } | Self::SummarySchema { .. })
    }

    /// True for cells that should aggregate but cannot.
    pub fn is_computation(&self) -> bool {
        matches!(
            self,
            Self::AmountParse { .. } | Self::MissingDriver { .. } | Self::AmountOverflow { .. }
        )
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Schema { platform, source, missing } => write!(
                f,
                "{} file '{source}' is missing columns: {}",
                platform.key().to_uppercase(),
                missing.join(", ")
            ),
            Self::SummarySchema { source, missing } => {
                write!(f, "summary '{source}' is missing columns: {}", missing.join(", "))
            }
            Self::AmountParse { record_id, column, value } => {
                write!(f, "record '{record_id}': cannot parse amount '{value}' in column '{column}'")
            }
            Self::MissingDriver { platform, record_id } => {
                write!(f, "{platform} record '{record_id}': amounts present but driver name is empty")
            }
            Self::AmountOverflow { record_id } => {
                write!(f, "'{record_id}': amounts exceed the supported range")
            }
            Self::EmptyUpload => write!(f, "no platform export supplied"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
