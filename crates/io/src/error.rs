use std::fmt;

use fleetpay_recon::ReconError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// Week, artifact or driver report absent from the store.
    NotFound { what: String },
    /// Week identifier is not a single safe path component.
    InvalidWeek(String),
    Io(String),
    Xlsx(String),
    Archive(String),
    Json(String),
    /// Persisted summary could not be turned back into settlements.
    Recon(ReconError),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { what } => write!(f, "{what} not found"),
            Self::InvalidWeek(week) => write!(
                f,
                "invalid week '{week}': use letters, digits, '.', '_' or '-', not starting with '.'"
            ),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Xlsx(msg) => write!(f, "spreadsheet error: {msg}"),
            Self::Archive(msg) => write!(f, "archive error: {msg}"),
            Self::Json(msg) => write!(f, "metadata error: {msg}"),
            Self::Recon(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for HistoryError {}

impl From<ReconError> for HistoryError {
    fn from(e: ReconError) -> Self {
        Self::Recon(e)
    }
}

impl From<std::io::Error> for HistoryError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}
