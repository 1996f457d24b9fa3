//! Error types for hpreview-core.

use thiserror::Error;

use crate::runner::RunError;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Fatal errors: everything that legitimately unwinds out of the pipeline.
///
/// Per the error taxonomy, only the primary fetch path (`get_manifest`,
/// `dry_run_upgrade`) converts a [`RunError`] into one of these; every other
/// call site (CRD discovery, CR fetch, per-resource server-side dry-run,
/// CRD file parsing) absorbs `RunError` locally instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// The primary manifest fetch or dry-run failed.
    #[error("failed to fetch manifest: {0}")]
    Fetch(#[from] RunError),

    /// A resource document was missing a required field.
    #[error("invalid resource: {0}")]
    InvalidResource(String),

    /// YAML could not be parsed.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON conversion failed (should not happen for well-formed YAML).
    #[error("JSON conversion error: {0}")]
    Json(#[from] serde_json::Error),
}
