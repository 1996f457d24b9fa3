//! CLI error type and exit-code mapping (mirrors `sherpack-cli`'s
//! `error.rs`/`exit_codes.rs` split, narrowed to this binary's taxonomy:
//! only the primary fetch path is fatal — everything else degrades inside
//! `hpreview-core` and shows up as report data, not an error, per §7).

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    /// The primary manifest fetch or dry-run failed, or a resource document
    /// was malformed.
    #[error(transparent)]
    #[diagnostic(code(hpreview::cli::core))]
    Core(#[from] hpreview_core::CoreError),

    /// Bad CLI arguments that slipped past `clap` (e.g. an unparsable
    /// `--crd-policy` value threaded through manually).
    #[error("invalid argument: {0}")]
    #[diagnostic(code(hpreview::cli::usage))]
    Usage(String),

    #[error("{0}")]
    #[diagnostic(code(hpreview::cli::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => exit_codes::USAGE_ERROR,
            CliError::Core(_) | CliError::Io(_) => exit_codes::ISSUES_FOUND,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
