use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use resource_report::sources::{FsChartSource, FsObjectStore};
use resource_report::{
    compute_target, DocumentRenderer, InvocationEvent, PdfRenderer, ReportConfig, ReportHandler,
    ResultEnvelope,
};
use tracing_subscriber::EnvFilter;

/// Builds and publishes the daily resource-utilization report.
///
/// Fonts must be present under `assets/fonts` next to the binary or the crate, or be provided
/// via the `REPORT_FONTS_DIR` environment variable. Log verbosity follows `RUST_LOG`.
#[derive(Parser)]
#[command(author, version, about = "Resource-utilization report publisher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one report and print the result envelope as JSON.
    Run(RunArgs),

    /// Print where today's (or the given day's) report is published.
    Target(TargetArgs),

    /// List the configured metric catalog.
    Catalog(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// TOML configuration file; the deployed defaults apply when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Publish to this bucket instead of the configured default.
    #[arg(long)]
    bucket: Option<String>,

    /// Raw invocation event, e.g. '{"ReportBucket": "reports"}'.
    #[arg(long)]
    event: Option<String>,

    #[arg(long, value_enum, default_value_t = Backend::Local)]
    backend: Backend,

    /// Object store root of the local backend; buckets are its subdirectories.
    #[arg(long, default_value = "target/report_store")]
    local_root: PathBuf,

    /// Directory holding `{metric_id}.png` charts for the local backend.
    /// Defaults to `<local-root>/charts`.
    #[arg(long)]
    charts_dir: Option<PathBuf>,
}

#[derive(Args)]
struct TargetArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Report date as YYYY-MM-DD; defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    #[arg(long)]
    bucket: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    /// S3 and CloudWatch (requires the `aws` feature).
    Aws,
    /// Filesystem object store and pre-rendered charts.
    Local,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run(args),
        Commands::Target(args) => target(args),
        Commands::Catalog(args) => catalog(args),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn load_config(args: &ConfigArgs) -> Result<ReportConfig, Box<dyn Error>> {
    match &args.config {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            Ok(ReportConfig::load(path)?)
        }
        None => Ok(ReportConfig::default()),
    }
}

fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args.config)?;

    let mut event = match &args.event {
        Some(raw) => serde_json::from_str::<InvocationEvent>(raw)?,
        None => InvocationEvent::default(),
    };
    if let Some(bucket) = args.bucket {
        event.report_bucket = Some(bucket);
    }

    let envelope = match args.backend {
        Backend::Local => run_local(config, &event, &args.local_root, args.charts_dir)?,
        Backend::Aws => run_aws(config, &event)?,
    };

    println!("{}", serde_json::to_string_pretty(&envelope)?);
    if !envelope.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_local(
    config: ReportConfig,
    event: &InvocationEvent,
    root: &Path,
    charts_dir: Option<PathBuf>,
) -> Result<ResultEnvelope, Box<dyn Error>> {
    let store = FsObjectStore::open(root)?;
    let charts = FsChartSource::new(charts_dir.unwrap_or_else(|| root.join("charts")));
    let handler = ReportHandler::new(config, charts, &store, &store, PdfRenderer::new());
    Ok(handler.handle(event))
}

#[cfg(feature = "aws")]
fn run_aws(
    config: ReportConfig,
    event: &InvocationEvent,
) -> Result<ResultEnvelope, Box<dyn Error>> {
    use resource_report::sources::{CloudWatchAlarms, CloudWatchCharts, S3ObjectStore};

    let store = S3ObjectStore::new(&config.region)?;
    let charts = CloudWatchCharts::new(&config)?;
    let alarms = if config.include_alarm_summary {
        Some(CloudWatchAlarms::new(&config)?)
    } else {
        None
    };

    let mut handler = ReportHandler::new(config, charts, &store, &store, PdfRenderer::new());
    if let Some(alarms) = alarms {
        handler = handler.with_alarms(alarms);
    }
    Ok(handler.handle(event))
}

#[cfg(not(feature = "aws"))]
fn run_aws(
    _config: ReportConfig,
    _event: &InvocationEvent,
) -> Result<ResultEnvelope, Box<dyn Error>> {
    Err("the aws backend is unavailable: rebuild with `--features aws`".into())
}

fn target(args: TargetArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args.config)?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let renderer = PdfRenderer::new();
    let target = compute_target(
        date,
        args.bucket.as_deref(),
        &config.target_naming(renderer.extension()),
    );
    println!("{}", target.uri());
    Ok(())
}

fn catalog(args: ConfigArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args)?;
    for metric in &config.metric_catalog {
        println!("{}\t{}", metric.identifier(), metric.label());
    }
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
