//! Application error taxonomy

use thiserror::Error;

/// Errors that abort an export run.
///
/// Two failure classes are deliberately *not* represented here because they
/// are recovered where they occur: a 401 while listing a project's scans
/// (treated as an empty scan list) and connection-level faults while paging
/// results (retried at the same offset).
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigLoadError),

    #[error("Authentication failed with status {status}: {message}")]
    Auth { status: u16, message: String },

    #[error("API request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    UnexpectedBody(String),

    #[error("Transient failures exhausted after {attempts} attempts at offset {offset}")]
    TransientRetriesExhausted { attempts: u32, offset: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ExportError {
    /// Status code carried by an HTTP-level variant, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
