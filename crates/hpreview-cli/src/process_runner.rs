//! The real [`Runner`](hpreview_core::Runner): shells out via
//! `std::process::Command`, matching the core crate's "only blocking
//! operations are subprocess calls" contract (§5).

use std::io::Write;
use std::process::{Command, Stdio};

use hpreview_core::{RunError, Runner};

#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Runner for ProcessRunner {
    fn run(&self, argv: &[&str]) -> Result<String, RunError> {
        let [program, args @ ..] = argv else {
            return Err(RunError::new("empty command"));
        };
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| RunError::new(format!("failed to spawn `{program}`: {e}")))?;

        if !output.status.success() {
            return Err(RunError::new(format!(
                "`{}` exited with {}: {}",
                argv.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| RunError::new(format!("`{}` produced non-UTF-8 output: {e}", argv.join(" "))))
    }

    fn run_with_input(&self, argv: &[&str], input: &str) -> Result<String, RunError> {
        let [program, args @ ..] = argv else {
            return Err(RunError::new("empty command"));
        };
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RunError::new(format!("failed to spawn `{program}`: {e}")))?;

        child
            .stdin
            .take()
            .expect("stdin was piped")
            .write_all(input.as_bytes())
            .map_err(|e| RunError::new(format!("failed to write stdin to `{program}`: {e}")))?;

        let output = child
            .wait_with_output()
            .map_err(|e| RunError::new(format!("failed waiting on `{program}`: {e}")))?;

        if !output.status.success() {
            return Err(RunError::new(format!(
                "`{}` exited with {}: {}",
                argv.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| RunError::new(format!("`{}` produced non-UTF-8 output: {e}", argv.join(" "))))
    }
}
