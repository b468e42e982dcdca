//! Error types for the collection schema engine.

use crate::validate::ValidationError;
use crate::warning::Warning;

/// Errors that can occur while loading or planning collection changes.
///
/// Diffing and compiling never fail; these errors only come from the
/// boundaries around them (reading definitions, gating on validation).
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// A collection definition did not pass validation.
    #[error(
        "Collection '{collection}' is invalid:\n{}",
        .errors.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n")
    )]
    Validation {
        /// Name of the offending collection.
        collection: String,
        /// Every problem found, in rule order.
        errors: Vec<ValidationError>,
    },

    /// The planned migration would lose data and was not explicitly allowed.
    #[error(
        "Migration would lose data:\n{}",
        .warnings.iter().map(|w| format!("  - {}", w.message)).collect::<Vec<_>>().join("\n")
    )]
    DataLossRefused {
        /// The `data_loss` warnings that triggered the refusal.
        warnings: Vec<Warning>,
    },

    /// IO error (reading definition files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for collection operations.
pub type Result<T> = std::result::Result<T, CollectionError>;
