//! Run engine
//!
//! Resolves a strategy for each target configuration in order, runs it, and
//! accumulates the records. Failure policy follows the error kinds: an
//! unknown tag or malformed settings aborts the run, a fetch/parse failure
//! aborts only its target and the run continues.

use crate::client::HttpClient;
use crate::config::TargetConfig;
use crate::error::HarvestError;
use crate::extract::get_extractor;
use crate::schema::Record;

/// Run every target sequentially and return the combined records in
/// accumulation order.
pub async fn run_targets(
    configs: Vec<TargetConfig>,
    client: &HttpClient,
) -> Result<Vec<Record>, HarvestError> {
    let mut records = Vec::new();
    for config in configs {
        let target_id = config.id.clone();
        let extractor = get_extractor(config, client.clone())?;
        log::info!("Extracting target '{target_id}'");
        match extractor.extract().await {
            Ok(mut batch) => {
                log::info!("Target '{target_id}' produced {} record(s)", batch.len());
                records.append(&mut batch);
            }
            Err(error) => {
                log::warn!("Target '{target_id}' failed, continuing: {error}");
            }
        }
    }
    Ok(records)
}
