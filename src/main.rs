use clap::Parser;
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use swiftdeadcode::analysis::{collect_findings, Pipeline};
use swiftdeadcode::config::Config;
use swiftdeadcode::graph::{GraphInput, ParallelGraphBuilder};
use swiftdeadcode::report::{ReportFormat, Reporter};

/// swiftdeadcode - dead code analysis for Swift index graphs
#[derive(Parser, Debug)]
#[command(name = "swiftdeadcode")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Graph document produced by the indexing front end (JSON)
    input: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Patterns to retain - never report as dead (can be specified multiple times)
    #[arg(short, long)]
    retain: Vec<String>,

    /// Treat public and open declarations as entry points
    #[arg(long)]
    retain_public: bool,

    /// Retain declarations reachable from the Objective-C runtime
    #[arg(long)]
    retain_objc_accessible: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Terminal,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!("swiftdeadcode v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    run_analysis(&config, &cli)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        let root = cli.input.parent().unwrap_or_else(|| Path::new("."));
        Config::from_default_locations(root)?
    };

    // Override with CLI arguments
    if !cli.retain.is_empty() {
        config.retain_patterns.extend(cli.retain.clone());
    }
    if cli.retain_public {
        config.retain_public = true;
    }
    if cli.retain_objc_accessible {
        config.retain_objc_accessible = true;
    }

    Ok(config)
}

fn load_input(path: &Path) -> Result<GraphInput> {
    let contents = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read graph document: {}", path.display()))?;

    serde_json::from_str(&contents)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse graph document: {}", path.display()))
}

fn report_format(config: &Config, cli: &Cli) -> Result<ReportFormat> {
    match cli.format {
        Some(format) => Ok(format.into()),
        None => config
            .report
            .format
            .parse()
            .map_err(|e: String| miette::miette!("Invalid report.format in configuration: {}", e)),
    }
}

fn run_analysis(config: &Config, cli: &Cli) -> Result<()> {
    let start_time = Instant::now();
    let format = report_format(config, cli)?;

    info!("Loading graph document {}", cli.input.display());
    let input = load_input(&cli.input)?;

    let mut graph = ParallelGraphBuilder::new().build(input);
    info!(
        "Graph built: {} declarations, {} references",
        graph.declaration_count(),
        graph.reference_count()
    );

    Pipeline::standard(config).run(&mut graph, config)?;

    let findings = collect_findings(&graph, config);

    let reporter = Reporter::new(format, cli.output.clone());
    reporter.report(&findings)?;

    if !cli.quiet && format == ReportFormat::Terminal {
        println!(
            "{}",
            format!("Analysis completed in {:.2?}", start_time.elapsed()).dimmed()
        );
    }

    Ok(())
}
