use crate::config::OutputConfig;
use crate::error::{AppError, Result};
use crate::models::MergedRow;
use crate::synth::SynthesizedTables;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// A fully written CSV waiting next to its target to be renamed into place
struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
    rows: usize,
}

fn stage_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<StagedFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(temp.as_file_mut());
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }

    Ok(StagedFile {
        temp,
        target: path.to_path_buf(),
        rows: rows.len(),
    })
}

/// Rename every staged file into place.
///
/// If one rename fails, targets already renamed by this call are removed
/// again so a failed batch leaves none of its files behind.
fn commit(staged: Vec<StagedFile>) -> Result<()> {
    let mut committed: Vec<PathBuf> = Vec::with_capacity(staged.len());

    for file in staged {
        let StagedFile { temp, target, rows } = file;
        if let Err(e) = temp.persist(&target) {
            for path in &committed {
                if let Err(remove_err) = std::fs::remove_file(path) {
                    warn!("Failed to remove {}: {}", path.display(), remove_err);
                }
            }
            return Err(AppError::Io(e.error));
        }
        info!("Wrote {} rows to {}", rows, target.display());
        committed.push(target);
    }

    Ok(())
}

/// Write `rows` as a headed CSV file, replacing any existing file
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    commit(vec![stage_csv(path, rows)?])
}

/// Read a CSV file produced by [`write_csv`]; bad cells surface as parse errors
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let rows = reader
        .deserialize()
        .enumerate()
        .map(|(row_num, result)| {
            result.map_err(|e| {
                AppError::Parse(format!(
                    "{} row {}: {}",
                    path.display(),
                    row_num + 1,
                    e
                ))
            })
        })
        .collect::<Result<Vec<T>>>()?;

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn stage_derived(output: &OutputConfig, tables: &SynthesizedTables) -> Result<Vec<StagedFile>> {
    Ok(vec![
        stage_csv(&output.power_path(), &tables.power)?,
        stage_csv(&output.temperature_path(), &tables.temperature)?,
        stage_csv(&output.solar_path(), &tables.solar)?,
    ])
}

/// Write the power, temperature and solar files, all or none
pub fn write_derived(output: &OutputConfig, tables: &SynthesizedTables) -> Result<()> {
    commit(stage_derived(output, tables)?)
}

pub fn read_derived(output: &OutputConfig) -> Result<SynthesizedTables> {
    Ok(SynthesizedTables {
        power: read_csv(&output.power_path())?,
        temperature: read_csv(&output.temperature_path())?,
        solar: read_csv(&output.solar_path())?,
    })
}

pub fn write_merged(output: &OutputConfig, merged: &[MergedRow]) -> Result<()> {
    write_csv(&output.merged_path(), merged)
}

/// Write the three derived files and the merged file, all or none
pub fn write_all(output: &OutputConfig, tables: &SynthesizedTables, merged: &[MergedRow]) -> Result<()> {
    let mut staged = stage_derived(output, tables)?;
    staged.push(stage_csv(&output.merged_path(), merged)?);
    commit(staged)
}
