//! Catalog Template Generator Binary
//!
//! Compiles the bundle list into an OLM basic catalog template.
//!
//! ## Configuration
//!
//! Flags, each with an environment fallback:
//! - `--input` / `BUNDLES_FILE`: bundle list (default: bundles.yaml)
//! - `--output` / `CATALOG_TEMPLATE_FILE`: output file (default: catalog-template.yaml)
//! - `--icon` / `ICON_FILE`: package icon, PNG (default: icon.png)
//! - `--policy` / `UPDATE_GRAPH_POLICY`: JSON policy file (default: built-in rhacs policy)
//! - `--format` / `OUTPUT_FORMAT`: `yaml` or `json` (default: yaml)
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: pretty)
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin generate_catalog -- --input bundles.yaml --output catalog-template.yaml
//! ```

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use update_graph::{
    compile, load_icon, load_input, load_policy, write_template, OutputFormat, UpdateGraphPolicyV1,
    UPDATE_GRAPH_SCHEMA_VERSION,
};

#[derive(Debug, Parser)]
#[command(name = "generate_catalog", version, about = "Generate the OLM catalog template from the bundle list")]
struct Cli {
    /// Bundle list with images, broken versions and the support threshold.
    #[arg(long, env = "BUNDLES_FILE", default_value = "bundles.yaml")]
    input: PathBuf,

    /// Generated catalog template.
    #[arg(long, env = "CATALOG_TEMPLATE_FILE", default_value = "catalog-template.yaml")]
    output: PathBuf,

    /// Package icon (PNG).
    #[arg(long, env = "ICON_FILE", default_value = "icon.png")]
    icon: PathBuf,

    /// JSON policy file overriding the built-in policy.
    #[arg(long, env = "UPDATE_GRAPH_POLICY")]
    policy: Option<PathBuf>,

    /// Output format: yaml or json.
    #[arg(long, env = "OUTPUT_FORMAT", default_value_t = OutputFormat::Yaml)]
    format: OutputFormat,
}

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "generate_catalog=info,update_graph=info".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    let policy = match &cli.policy {
        Some(path) => load_policy(path)?,
        None => UpdateGraphPolicyV1::default(),
    };
    let params_hash = policy.params_hash()?;
    info!(
        policy = policy.policy_id(),
        params_hash = %params_hash,
        exceptions = %policy.exceptions.revision,
        "Policy loaded"
    );

    let catalog = load_input(&cli.input)?;
    let icon = load_icon(&cli.icon)?;
    let template = compile(&catalog, &policy, icon)?;
    let digest = write_template(&template, cli.format, &cli.output)?;

    info!(
        output = %cli.output.display(),
        format = %cli.format,
        digest = %digest,
        latency_ms = start.elapsed().as_millis() as u64,
        "Catalog template written"
    );
    println!("{} generated successfully.", cli.output.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        schema_version = UPDATE_GRAPH_SCHEMA_VERSION,
        input = %cli.input.display(),
        "Starting catalog generation"
    );

    run(&cli).map_err(|e| {
        error!(error = %e, "Catalog generation failed");
        e
    })
}
