//! `hpreview` — preview the semantic effect of a Helm-style upgrade against
//! a live cluster: fetch, diff, classify risk, and (optionally) run the
//! deeper CRD pipeline.

use clap::Parser;
use hpreview_core::crd::PolicyMode;
use hpreview_core::orchestrate::{run_diff, DiffOptions};

mod error;
mod exit_codes;
mod process_runner;
mod render;

use error::{CliError, Result};
use process_runner::ProcessRunner;
use render::OutputFormat;

#[derive(Parser)]
#[command(name = "hpreview")]
#[command(author = "hpreview contributors")]
#[command(version)]
#[command(about = "Preview a Helm-style upgrade's semantic effect on a live cluster", long_about = None)]
struct Cli {
    /// Release name
    release: String,

    /// Chart path or reference
    chart: String,

    /// Target namespace
    #[arg(short, long, default_value = "default")]
    namespace: String,

    /// Values file(s) to merge
    #[arg(short = 'f', long = "values")]
    values: Vec<String>,

    /// Set values on the command line (key=value)
    #[arg(long = "set")]
    set: Vec<String>,

    /// Chart version to upgrade to
    #[arg(long)]
    version: Option<String>,

    /// Refine the proposed manifest with a per-resource server-side dry-run
    #[arg(long)]
    server_side: bool,

    /// Disable noise stripping; show every field including churn-prone ones
    #[arg(long)]
    show_all: bool,

    /// Output format
    #[arg(long, default_value = "terminal")]
    output: String,

    /// Lines of context around each change in the terminal renderer
    #[arg(long)]
    context: Option<usize>,

    /// Additional dot-paths to ignore, beyond the built-in noise set
    #[arg(long = "ignore-path")]
    ignore_path: Vec<String>,

    /// Path to a kubeconfig file
    #[arg(long)]
    kubeconfig: Option<String>,

    /// kubectl/helm context to use
    #[arg(long)]
    kube_context: Option<String>,

    /// Disable colored terminal output
    #[arg(long)]
    no_color: bool,

    /// Only show changes that carry a WARNING or DANGER risk annotation
    #[arg(long)]
    risk_only: bool,

    /// Run the deeper CRD (CustomResourceDefinition) analysis pipeline
    #[arg(long)]
    check_crds: bool,

    /// What to do when the CRD pipeline finds a DANGER-level change
    #[arg(long, default_value = "warn")]
    crd_policy: String,

    /// Increase log verbosity (repeatable: -v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

fn main() {
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print().ok();
            std::process::exit(exit_codes::USAGE_ERROR);
        }
    };

    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run the diff and render it; returns the process exit code on success.
fn run(cli: &Cli) -> Result<i32> {
    let output_format: OutputFormat = cli
        .output
        .parse()
        .map_err(CliError::Usage)?;
    let crd_policy: PolicyMode = cli.crd_policy.parse().map_err(CliError::Usage)?;

    let opts = DiffOptions {
        release: &cli.release,
        chart: &cli.chart,
        namespace: &cli.namespace,
        values_files: &cli.values,
        set_values: &cli.set,
        version: cli.version.as_deref(),
        server_side: cli.server_side,
        show_all: cli.show_all,
        ignore_paths: cli.ignore_path.clone(),
        kubeconfig: cli.kubeconfig.as_deref(),
        kube_context: cli.kube_context.as_deref(),
        check_crds: cli.check_crds,
        crd_policy,
    };

    let runner = ProcessRunner::new();
    let diff_output = run_diff(&runner, &opts)?;

    let policy_blocked = diff_output
        .crd_report
        .as_ref()
        .and_then(|r| r.policy_result.as_ref())
        .map(|p| p.blocked)
        .unwrap_or(false);

    match output_format {
        OutputFormat::Terminal => {
            let color = !cli.no_color && console::colors_enabled();
            let mut renderer =
                render::terminal::TerminalRenderer::new(color, cli.risk_only).with_field_context(cli.context);
            renderer.render(&diff_output)?;
        }
        OutputFormat::Json => {
            let doc = render::json::render(&diff_output);
            println!("{}", serde_json::to_string_pretty(&doc).map_err(|e| CliError::Usage(e.to_string()))?);
        }
    }

    Ok(if policy_blocked { exit_codes::ISSUES_FOUND } else { exit_codes::SUCCESS })
}
