//! Generator-time error types.
//!
//! `DocumentShapeError` is not here: it is raised by generated code and lives
//! in `runtime` next to the helpers that produce it.
use std::path::PathBuf;

use thiserror::Error;

/// A record definition that cannot be mapped at all. Fatal for that record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaAcceptanceError {
    #[error("`{record}` is not a record type: {reason}")]
    NotARecord { record: String, reason: String },

    #[error("`{record}` has no primary constructor: {reason}")]
    NoConstructor { record: String, reason: String },

    #[error("`{record}` cannot be constructed: field `{field}` has unsupported type `{ty}` and no default")]
    UnconstructibleField { record: String, field: String, ty: String },

    #[error("`{record}` declares field `{field}` more than once")]
    DuplicateField { record: String, field: String },

    #[error("`{name}` in `{record}` is not a valid identifier")]
    InvalidIdentifier { record: String, name: String },
}

impl SchemaAcceptanceError {
    pub fn record(&self) -> &str {
        match self {
            SchemaAcceptanceError::NotARecord { record, .. }
            | SchemaAcceptanceError::NoConstructor { record, .. }
            | SchemaAcceptanceError::UnconstructibleField { record, .. }
            | SchemaAcceptanceError::DuplicateField { record, .. }
            | SchemaAcceptanceError::InvalidIdentifier { record, .. } => record,
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            SchemaAcceptanceError::UnconstructibleField { field, .. }
            | SchemaAcceptanceError::DuplicateField { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// A field whose declared type matches no classifier rule. Non-fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported type `{ty}` for field `{field}` of `{record}`; field skipped")]
pub struct UnsupportedFieldError {
    pub record: String,
    pub field: String,
    pub ty: String,
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },

    #[error("invalid schema manifest {path}: at JSON path {json_path} → {message}")]
    Manifest {
        path: PathBuf,
        json_path: String,
        message: String,
    },

    #[error("record `{record}` not found in {path}")]
    RecordNotFound { path: PathBuf, record: String },

    #[error(transparent)]
    Acceptance(#[from] SchemaAcceptanceError),
}
