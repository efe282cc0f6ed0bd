use std::path::PathBuf;

use crate::models::TableLocator;

/// Everything that can abort one explorer interaction.
///
/// Fetch failures (`Network`, `HttpStatus`, `PageMissing`) and parse failures
/// (`TableNotFound`, `MissingHeader`) end the current render and are shown to
/// the user. Cells that fail numeric coercion never reach this type; they are
/// kept as missing values in the table.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("no saved page at {}", path.display())]
    PageMissing { path: PathBuf },

    #[error("table {locator} not found in page (layout change or season without data)")]
    TableNotFound { locator: TableLocator },

    #[error("table {locator} has no header row")]
    MissingHeader { locator: TableLocator },

    #[error("table has no '{column}' column")]
    MissingColumn { column: String },

    #[error("season {0} is outside 1950-2023")]
    InvalidSeason(u16),

    #[error("'{0}' is not a season year (expected 1950-2023)")]
    NotASeason(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("unknown position '{0}' (expected C, PF, SF, PG or SG)")]
    UnknownPosition(String),

    #[error("invalid table locator '{0}'")]
    InvalidLocator(String),

    #[error("bad url: {0}")]
    Url(#[from] url::ParseError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExplorerError {
    /// The page could not be fetched.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ExplorerError::Network { .. }
                | ExplorerError::HttpStatus { .. }
                | ExplorerError::PageMissing { .. }
        )
    }

    /// The page was fetched but the expected table was not in it.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            ExplorerError::TableNotFound { .. }
                | ExplorerError::MissingHeader { .. }
                | ExplorerError::MissingColumn { .. }
        )
    }
}

pub type Result<T, E = ExplorerError> = std::result::Result<T, E>;
