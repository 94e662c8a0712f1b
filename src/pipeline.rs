use crate::columns::resolve_columns;
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::filter::{filter_range, DateWindow};
use crate::merge::merge;
use crate::models::MergedRow;
use crate::output;
use crate::synth::{synthesize, SynthesizedTables};
use crate::table::{detect_header_row, load_table};
use tracing::info;

/// Everything one run produces
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub tables: SynthesizedTables,
    pub merged: Vec<MergedRow>,
}

/// Header detection through merge over already-fetched CSV text.
///
/// Does no I/O; the result depends only on the arguments.
pub fn synthesize_from_text(
    content: &str,
    window: DateWindow,
    seed: Option<u64>,
    header_scan_lines: usize,
) -> Result<PipelineOutput> {
    let header_row = detect_header_row(content, header_scan_lines);
    let table = load_table(content, header_row)?;
    let columns = resolve_columns(&table.columns)?;
    let filtered = filter_range(&table, &columns.date, window)?;
    let tables = synthesize(&filtered, &columns.load, seed)?;
    let merged = merge(&tables.power, &tables.temperature, &tables.solar)?;

    Ok(PipelineOutput { tables, merged })
}

/// Fetch the source CSV, synthesize and write all four tables.
///
/// Files are only written once every stage has succeeded.
pub async fn run(config: &Config) -> Result<PipelineOutput> {
    info!(
        "Generating tables for {} ~ {} from {}",
        config.window.start, config.window.end, config.source.url
    );

    let fetcher = Fetcher::from_config(&config.source)?;
    let content = fetcher.fetch_csv().await?;

    let window = DateWindow::new(config.window.start, config.window.end);
    let result = synthesize_from_text(
        &content,
        window,
        config.synthesis.seed,
        config.source.header_scan_lines,
    )?;

    output::write_all(&config.output, &result.tables, &result.merged)?;

    info!(
        "Wrote {} hourly rows to {}",
        result.merged.len(),
        config.output.dir.display()
    );
    Ok(result)
}

/// Rebuild the merged table from previously written power, temperature and solar files
pub fn run_merge_only(config: &Config) -> Result<Vec<MergedRow>> {
    info!("Merging tables in {}", config.output.dir.display());

    let tables = output::read_derived(&config.output)?;
    let merged = merge(&tables.power, &tables.temperature, &tables.solar)?;
    output::write_merged(&config.output, &merged)?;

    Ok(merged)
}
