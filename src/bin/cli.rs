use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use ci_junit_report::{NoopRenderer, ReportConfig, ReportPipeline, RunSummary};
use clap::Parser;
use tracing_subscriber::EnvFilter;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "ci-junit-report")]
#[command(about = "Consolidate CI job step results into a single JUnit report", long_about = None)]
#[command(version)]
struct Cli {
    /// Identifier of the CI job run
    #[arg(long, env = "PROW_JOB_ID")]
    job_id: Option<String>,

    /// Directory receiving junit.xml and junit-summary.html (default: /tmp)
    #[arg(long, env = "ARTIFACT_DIR")]
    artifact_dir: Option<String>,

    /// Path to a YAML config file overriding the built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write junit.xml only, without rendering the HTML summary
    #[arg(long)]
    skip_render: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "ci_junit_report=debug"
    } else {
        "ci_junit_report=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

#[cfg(feature = "otel")]
fn init_otel_tracing(verbose: bool) {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::runtime::Tokio;
    use opentelemetry_sdk::trace::TracerProvider;

    let otlp_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&otlp_endpoint)
        .build()
        .expect("Failed to create OTLP exporter");

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, Tokio)
        .build();

    let tracer = provider.tracer("ci-junit-report");
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(otel_layer)
        .init();

    opentelemetry::global::set_tracer_provider(provider);
}

#[cfg(not(feature = "otel"))]
fn init_tracing(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    #[cfg(feature = "otel")]
    init_otel_tracing(cli.verbose);

    #[cfg(not(feature = "otel"))]
    init_tracing(cli.verbose);

    let result = run(cli).await;

    #[cfg(feature = "otel")]
    opentelemetry::global::shutdown_tracer_provider();

    match result {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Report failed");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<RunSummary> {
    let config = match &cli.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    // An empty ARTIFACT_DIR counts as unset.
    let artifact_dir = cli.artifact_dir.filter(|d| !d.is_empty()).map(PathBuf::from);
    let config = config.with_overrides(cli.job_id, artifact_dir);
    // Fail on a missing job id before touching the network.
    config.job_id()?;

    let mut pipeline = ReportPipeline::from_config(config)?;
    if cli.skip_render {
        pipeline = pipeline.with_renderer(Arc::new(NoopRenderer));
    }

    Ok(pipeline.run().await?)
}

fn print_summary(summary: &RunSummary) {
    println!("Job: {} (target {})", summary.job.id, summary.job.target);
    println!("Object prefix: {}", summary.job.prefix);
    println!(
        "Suites: {}, tests: {}, failures: {}",
        summary.suites, summary.tests, summary.failures
    );
    println!("{}", summary.junit_path.display());
}
