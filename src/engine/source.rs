//! Load sources — where raw load records come from.
//!
//! Extraction itself (screen reading, OCR, board scraping) lives outside
//! this crate. A source only hands over already-structured records.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::types::LoadRecord;

/// A producer of load records, polled once per scan tick.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoadSource: Send + Sync {
    /// Records that became visible since the last call.
    async fn fetch_loads(&self) -> Result<Vec<LoadRecord>>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Reads a JSON array of load records from disk.
///
/// The file is re-read on every fetch, and each record key is yielded at
/// most once over the life of the source.
pub struct JsonFileSource {
    path: PathBuf,
    seen: Mutex<HashSet<String>>,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seen: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl LoadSource for JsonFileSource {
    async fn fetch_loads(&self) -> Result<Vec<LoadRecord>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read loads file: {}", self.path.display()))?;
        let records: Vec<LoadRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse loads file: {}", self.path.display()))?;

        let total = records.len();
        let mut seen = self
            .seen
            .lock()
            .map_err(|_| anyhow::anyhow!("load source dedup set poisoned"))?;
        let fresh: Vec<LoadRecord> = records.into_iter().filter(|r| seen.insert(r.key())).collect();

        debug!(
            source = %self.path.display(),
            total,
            fresh = fresh.len(),
            "Loads file read"
        );
        Ok(fresh)
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

/// Fetch from a source and drop every record that fails validation.
pub async fn collect_valid(source: &dyn LoadSource) -> Result<Vec<LoadRecord>> {
    let records = source.fetch_loads().await?;
    let valid = records
        .into_iter()
        .filter(|record| match record.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(source = source.name(), load = %record.key(), error = %e, "Dropping invalid load");
                false
            }
        })
        .collect();
    Ok(valid)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
