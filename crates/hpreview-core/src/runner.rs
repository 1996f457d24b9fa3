//! The subprocess/cluster-client boundary.
//!
//! Every external call (package manager dry-run, `kubectl get crds`, live
//! object fetch, server-side dry-run) goes through a single [`Runner`] so
//! that callers can inject canned output in tests instead of shelling out.
//! The boundary yields exactly one error shape: [`RunError`].

use std::fmt;

/// The sole error shape crossing the `Runner` boundary.
///
/// Carries only a message: callers on the degradable paths (CRD discovery,
/// CR fetch, per-resource server-side dry-run) don't need to distinguish
/// causes, they just fall back and keep going.
#[derive(Debug, Clone)]
pub struct RunError {
    pub message: String,
}

impl RunError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RunError {}

/// Capability to invoke an external process and capture its stdout.
///
/// Implementations run synchronously: the only suspension points in this
/// system are subprocess calls, and wrapping a CLI tool in an async runtime
/// to await `std::process::Command` buys nothing.
pub trait Runner {
    /// Run `argv[0]` with the remaining arguments, returning captured stdout
    /// as UTF-8 text on success.
    fn run(&self, argv: &[&str]) -> Result<String, RunError>;

    /// Like [`run`](Runner::run), but feeds `input` to the child's stdin.
    /// Only the per-resource server-side dry-run needs this; every other
    /// call site sticks to plain `run`. The default forwards to `run` and
    /// ignores `input`, which is exactly right for [`CannedRunner`].
    fn run_with_input(&self, argv: &[&str], input: &str) -> Result<String, RunError> {
        let _ = input;
        self.run(argv)
    }
}

/// A [`Runner`] that replays pre-recorded outputs, keyed by the full
/// argument vector. Used by the core crate's own tests and available to
/// downstream integration tests exercising the CLI pipeline end to end.
#[derive(Debug, Default)]
pub struct CannedRunner {
    responses: std::collections::HashMap<Vec<String>, Result<String, String>>,
}

impl CannedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, argv: &[&str], output: impl Into<String>) -> Self {
        self.responses.insert(
            argv.iter().map(|s| s.to_string()).collect(),
            Ok(output.into()),
        );
        self
    }

    pub fn with_failure(mut self, argv: &[&str], message: impl Into<String>) -> Self {
        self.responses.insert(
            argv.iter().map(|s| s.to_string()).collect(),
            Err(message.into()),
        );
        self
    }
}

impl Runner for CannedRunner {
    fn run(&self, argv: &[&str]) -> Result<String, RunError> {
        let key: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        match self.responses.get(&key) {
            Some(Ok(out)) => Ok(out.clone()),
            Some(Err(msg)) => Err(RunError::new(msg.clone())),
            None => Err(RunError::new(format!("no canned response for {argv:?}"))),
        }
    }
}
