use anyhow::{Context, Result};
use grocery_etl::{pipeline, PipelineConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) configuration: optional YAML path, else the built-in paths ──
    let config = match std::env::args_os().nth(1) {
        Some(arg) => {
            let path = PathBuf::from(arg);
            PipelineConfig::from_yaml_file(&path)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    info!(?config, "startup");

    println!("Starting ETL Process...");

    // ─── 3) extract → transform → aggregate ─────────────────────────
    let output = pipeline::process(&config).context("processing sources")?;

    println!("\n-----Preview of clean data-----");
    println!("{}", output.clean.head(15));
    println!("\n-----Preview of aggregated data-----");
    println!("{}", output.aggregated.head(12));

    // ─── 4) load ────────────────────────────────────────────────────
    pipeline::persist(&config, &output).context("writing outputs")?;
    println!("\nETL Process Completed.");
    Ok(())
}
