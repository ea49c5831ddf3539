//! Error types for the proto-field-model crate.

use std::path::PathBuf;

/// Errors raised by the descriptor model and its reference loader.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A scalar-only query was made on a type tag outside the scalar table.
    ///
    /// Callers are expected to check `is_protobuf_scalar_type()` or
    /// `is_scalar_type()` first, so this indicates a usage error.
    #[error("'{type_tag}' is not a scalar type")]
    NotScalar { type_tag: String },

    /// A user-defined type descriptor was attached to a scalar-typed field.
    #[error("field '{field}' has scalar type '{type_tag}' and cannot reference a user-defined type")]
    ScalarTypeDescriptor { field: String, type_tag: String },

    /// The attached descriptor does not name the type the field declares.
    #[error("field '{field}' declares type '{expected}' but was resolved to '{found}'")]
    TypeDescriptorMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// Label text is not one of the three cardinalities.
    #[error("invalid label '{0}' (expected required, optional or repeated)")]
    InvalidLabel(String),

    /// A default literal cannot be read as the field's target type.
    #[error("invalid default '{value}' for field '{field}': {reason}")]
    InvalidDefault {
        field: String,
        value: String,
        reason: String,
    },

    /// The schema document is structurally invalid.
    #[error("schema error: {0}")]
    Schema(String),

    /// Failed to read a file from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON parse error with context.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
