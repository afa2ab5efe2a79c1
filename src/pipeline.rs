// src/pipeline.rs
use crate::aggregate::avg_weekly_sales_per_month;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::extract::extract;
use crate::load::load;
use crate::table::Table;
use crate::transform::transform_with_threshold;
use std::time::Instant;
use tracing::info;

/// The two tables a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub clean: Table,
    pub aggregated: Table,
}

/// Extract, transform and aggregate, without writing anything.
#[tracing::instrument(level = "info", skip_all)]
pub fn process(config: &PipelineConfig) -> Result<PipelineOutput> {
    config.validate()?;
    let raw = extract(
        &config.row_source_path,
        &config.columnar_source_path,
        &config.join_key,
    )?;
    let clean = transform_with_threshold(&raw, config.sales_threshold)?;
    let aggregated = avg_weekly_sales_per_month(&clean)?;
    Ok(PipelineOutput { clean, aggregated })
}

/// Write both tables to the configured destinations.
pub fn persist(config: &PipelineConfig, output: &PipelineOutput) -> Result<()> {
    load(
        &output.clean,
        &config.clean_output_path,
        &output.aggregated,
        &config.agg_output_path,
    )
}

/// Full run: every stage in order, stopping at the first error.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutput> {
    let start = Instant::now();
    let output = process(config)?;
    persist(config, &output)?;
    info!(
        clean_rows = output.clean.num_rows(),
        months = output.aggregated.num_rows(),
        elapsed = ?start.elapsed(),
        "pipeline complete"
    );
    Ok(output)
}
