//! Output rendering: a human-oriented terminal report and a machine-oriented
//! JSON document, both built from the same [`hpreview_core::orchestrate::DiffOutput`].

pub mod json;
pub mod terminal;

/// Which renderer the user asked for via `--output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terminal" => Ok(Self::Terminal),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format `{other}` (expected `terminal` or `json`)")),
        }
    }
}
