//! The default `--output terminal` renderer: grouped, colored console
//! output in the `sherpack-cli` `display.rs` style — an icon, a one-line
//! summary per change, then a compact total.

use std::io::{self, Write};

use console::{style, Style};
use hpreview_core::crd::CrdReport;
use hpreview_core::orchestrate::{AnnotatedChange, DiffOutput};
use hpreview_core::{RiskLevel, RiskAnnotation};

pub struct TerminalRenderer {
    writer: Box<dyn Write>,
    color: bool,
    risk_only: bool,
    /// How many raw field changes to print per resource before collapsing
    /// the rest into a "... and N more" line (`--context`). `None` prints
    /// every field change.
    field_context: Option<usize>,
}

impl TerminalRenderer {
    pub fn new(color: bool, risk_only: bool) -> Self {
        Self { writer: Box::new(io::stdout()), color, risk_only, field_context: None }
    }

    pub fn with_writer<W: Write + 'static>(writer: W, color: bool, risk_only: bool) -> Self {
        Self { writer: Box::new(writer), color, risk_only, field_context: None }
    }

    pub fn with_field_context(mut self, context: Option<usize>) -> Self {
        self.field_context = context;
        self
    }

    pub fn render(&mut self, output: &DiffOutput) -> io::Result<()> {
        if !self.color {
            console::set_colors_enabled(false);
        }

        writeln!(self.writer, "{}", style("Upgrade preview").bold())?;
        writeln!(self.writer, "{}", "─".repeat(66))?;

        let visible: Vec<&AnnotatedChange> = output
            .changes
            .iter()
            .filter(|c| !self.risk_only || max_level(&c.risk) != RiskLevel::Safe)
            .collect();

        if visible.is_empty() {
            writeln!(self.writer, "  {} no changes to report", style("✓").green())?;
        } else {
            for change in &visible {
                self.render_change(change)?;
            }
        }

        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{}: {} added, {} removed, {} changed, {} unchanged",
            style("Summary").bold(),
            output.summary.added,
            output.summary.removed,
            output.summary.changed,
            output.summary.unchanged,
        )?;

        if let Some(report) = &output.crd_report {
            self.render_crd_report(report)?;
        }

        Ok(())
    }

    fn render_change(&mut self, change: &AnnotatedChange) -> io::Result<()> {
        let level = max_level(&change.risk);
        let (icon, color) = risk_style(level);
        let verb = match change.record.status.as_str() {
            "added" => "+",
            "removed" => "-",
            _ => "~",
        };
        writeln!(
            self.writer,
            "  {} {} {} {}",
            color.apply_to(icon),
            color.apply_to(verb),
            change.record.kind,
            change.record.resource_key,
        )?;
        for annotation in &change.risk {
            let (a_icon, a_color) = risk_style(annotation.level);
            writeln!(
                self.writer,
                "      {} {}",
                a_color.apply_to(a_icon),
                annotation.message,
            )?;
        }
        if let Some(ownership) = &change.ownership {
            writeln!(self.writer, "      {} managed by {}", style("ℹ").blue(), ownership.manager.as_str())?;
        }

        let limit = self.field_context.unwrap_or(change.record.changes.len());
        for field in change.record.changes.iter().take(limit) {
            writeln!(
                self.writer,
                "      {} {} → {}",
                style(&field.path).dim(),
                style(display_value(&field.old_value)).dim(),
                style(display_value(&field.new_value)).bold(),
            )?;
        }
        let remaining = change.record.changes.len().saturating_sub(limit);
        if remaining > 0 {
            writeln!(self.writer, "      ... and {remaining} more field change(s)")?;
        }
        Ok(())
    }

    fn render_crd_report(&mut self, report: &CrdReport) -> io::Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style("CRD analysis").bold())?;
        writeln!(self.writer, "{}", "─".repeat(66))?;

        for new_crd in &report.new_crds {
            writeln!(
                self.writer,
                "  {} {} is new ({} {})",
                style("✓").green(),
                new_crd.name,
                new_crd.kind,
                new_crd.versions.join(", "),
            )?;
        }

        for crd in &report.crds {
            let (icon, color) = risk_style(crd.max_risk());
            writeln!(self.writer, "  {} {} ({})", color.apply_to(icon), crd.name, crd.status)?;
            for annotation in &crd.risk_annotations {
                let (a_icon, a_color) = risk_style(annotation.level);
                writeln!(self.writer, "      {} {}", a_color.apply_to(a_icon), annotation.message)?;
            }
            for warning in &crd.stored_version_warnings {
                writeln!(self.writer, "      {} {}", style("⚠").yellow(), warning)?;
            }
            for error in &crd.schema_validation_errors {
                writeln!(self.writer, "      {} {}", style("✗").red(), error)?;
            }
            if let Some(conflict) = &crd.ownership_conflict {
                writeln!(self.writer, "      {} {}", style("⚠").yellow(), conflict)?;
            }
        }

        for warning in &report.warnings {
            writeln!(self.writer, "  {} {}", style("⚠").yellow(), warning)?;
        }

        if let Some(policy) = &report.policy_result {
            writeln!(self.writer, "{}", "─".repeat(66))?;
            let icon = if policy.blocked { style("✗").red() } else { style("✓").green() };
            writeln!(self.writer, "  {} {}", icon, policy.message)?;
        }

        Ok(())
    }
}

fn display_value(value: &Option<serde_json::Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "<absent>".to_string(),
    }
}

fn max_level(annotations: &[RiskAnnotation]) -> RiskLevel {
    annotations.iter().map(|a| a.level).max().unwrap_or(RiskLevel::Safe)
}

fn risk_style(level: RiskLevel) -> (&'static str, Style) {
    match level {
        RiskLevel::Safe => ("✓", Style::new().green()),
        RiskLevel::Warning => ("⚠", Style::new().yellow()),
        RiskLevel::Danger => ("✗", Style::new().red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hpreview_core::crd::PolicyMode;
    use hpreview_core::orchestrate::{run_diff, DiffOptions};
    use hpreview_core::runner::CannedRunner;

    fn base_opts<'a>() -> DiffOptions<'a> {
        DiffOptions {
            release: "myrelease",
            chart: "./chart",
            namespace: "default",
            values_files: &[],
            set_values: &[],
            version: None,
            server_side: false,
            show_all: false,
            ignore_paths: Vec::new(),
            kubeconfig: None,
            kube_context: None,
            check_crds: false,
            crd_policy: PolicyMode::Warn,
        }
    }

    #[test]
    fn renders_one_warning_change() {
        let old = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: default\nspec:\n  template:\n    spec:\n      containers:\n      - image: nginx:1.20\n";
        let new = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: default\nspec:\n  template:\n    spec:\n      containers:\n      - image: nginx:1.21\n";
        let runner = CannedRunner::new()
            .with_response(&["helm", "get", "manifest", "myrelease", "--namespace", "default"], old)
            .with_response(
                &["helm", "upgrade", "myrelease", "./chart", "--dry-run", "--namespace", "default"],
                new,
            );
        let output = run_diff(&runner, &base_opts()).unwrap();

        let mut buf = Vec::new();
        {
            let mut renderer = TerminalRenderer::with_writer(&mut buf, false, false);
            renderer.render(&output).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Deployment"));
        assert!(text.contains("container image changed"));
        assert!(text.contains("1 changed"));
    }

    #[test]
    fn risk_only_hides_safe_changes() {
        let old = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cfg\n  namespace: default\n  labels:\n    team: a\ndata:\n  a: '1'\n";
        let new = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cfg\n  namespace: default\n  labels:\n    team: b\ndata:\n  a: '1'\n";
        let runner = CannedRunner::new()
            .with_response(&["helm", "get", "manifest", "myrelease", "--namespace", "default"], old)
            .with_response(
                &["helm", "upgrade", "myrelease", "./chart", "--dry-run", "--namespace", "default"],
                new,
            );
        let output = run_diff(&runner, &base_opts()).unwrap();

        let mut buf = Vec::new();
        {
            let mut renderer = TerminalRenderer::with_writer(&mut buf, false, true);
            renderer.render(&output).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("no changes to report"));
    }
}
