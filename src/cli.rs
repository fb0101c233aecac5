//! CLI helper functions

use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use owo_colors::OwoColorize;

use crate::client::HttpClient;
use crate::config::TargetConfig;
use crate::engine;
use crate::storage::CsvWriter;

/// Collect every YAML target config in a directory, sorted by path.
pub fn discover_configs(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        eyre::bail!("Targets directory not found: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read targets directory {}", dir.display()))?
    {
        let path = entry?.path();
        if matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        ) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Run the full pipeline: load each config, extract, merge, write the CSV.
///
/// Returns the number of records written.
pub async fn run_harvest(config_paths: &[PathBuf], output: &Path) -> Result<usize> {
    let mut configs = Vec::with_capacity(config_paths.len());
    for path in config_paths {
        log::debug!("Loading target config {}", path.display());
        configs.push(TargetConfig::read(path)?);
    }
    log::info!("Running {} target(s)", configs.len());

    let client = HttpClient::try_new()?;
    let records = engine::run_targets(configs, &client).await?;
    log::info!("Extraction complete: {} record(s)", records.len());

    let count = CsvWriter::new(output).write(&records)?;
    log::info!(
        "✓ Wrote {} record(s) to {}",
        count,
        output.display().bright_black()
    );
    Ok(count)
}
