use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the station analyzer.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The input CSV does not exist.
    #[error("Input file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// A required column is absent or a value could not be parsed.
    #[error("Malformed data in {}: {reason}", path.display())]
    MalformedData { path: PathBuf, reason: String },

    /// The render configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The chart backend failed while drawing.
    #[error("Chart rendering failed: {0}")]
    Render(String),

    /// The analysis or a derived row could not be encoded.
    #[error("Serialization failed: {0}")]
    Serialize(String),

    /// An output file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AnalysisError::MalformedData {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Write {
            path: path.into(),
            source,
        }
    }
}

impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for AnalysisError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        AnalysisError::Render(err.to_string())
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Serialize(err.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;
