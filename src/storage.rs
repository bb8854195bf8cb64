use crate::errors::AppError;
use crate::models::EntriesMap;
use crate::normalize::normalize_payload;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

/// Reads and migrates the data file. Missing, unreadable, and corrupt files all
/// start the session with an empty calendar.
pub async fn load_entries(path: &Path) -> EntriesMap {
    match fs::read(path).await {
        Ok(bytes) => {
            let entries = normalize_payload(&bytes);
            info!("loaded {} entries from {}", entries.len(), path.display());
            entries
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => EntriesMap::new(),
        Err(err) => {
            error!("failed to read data file: {err}");
            EntriesMap::new()
        }
    }
}

/// Replaces the whole file with the current map.
pub async fn persist_entries(path: &Path, entries: &EntriesMap) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(entries).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
