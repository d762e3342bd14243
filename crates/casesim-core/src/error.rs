//! Errors raised while loading or building a case.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaseError {
    /// The case source is structurally invalid. `field` is the path of the
    /// offending field, e.g. `stages[1].correct`.
    #[error("MALFORMED/{field}: {reason}")]
    MalformedCase { field: String, reason: String },

    #[error("IO/{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PARSE/{format}: {message}")]
    Parse { format: &'static str, message: String },

    #[error("FORMAT/unsupported case file: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

impl CaseError {
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CaseError::MalformedCase {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Field path for `MalformedCase`, `None` for every other kind.
    pub fn field(&self) -> Option<&str> {
        match self {
            CaseError::MalformedCase { field, .. } => Some(field),
            _ => None,
        }
    }
}
