// src/storage/mod.rs
use crate::normalize::types::{BatchResult, NormalizedJson};
use crate::utils::error::StorageError;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes batch output under a base directory partitioned by batch date:
///
/// ```text
/// <base>/<date>/documents/<docID>_normalized.json
/// <base>/<date>/batch_summary.json
/// <base>/<date>/errors/batch_errors.json   (only when failures occurred)
/// ```
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Saves the normalized JSON of one processed document.
    pub fn save_document_result(
        &self,
        batch_date: &str,
        doc_id: &str,
        normalized: &NormalizedJson,
    ) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join(batch_date).join("documents");
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir)?;
        }

        let file_path = target_dir.join(format!("{}_normalized.json", doc_id));
        let json = serde_json::to_string_pretty(normalized)?;
        fs::write(&file_path, json)?;

        tracing::info!("Saved normalized document to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves the batch summary, plus the error log when any failure occurred.
    pub fn save_batch_results(
        &self,
        batch_date: &str,
        result: &BatchResult,
    ) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join(batch_date);
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir)?;
        }

        let summary_path = target_dir.join("batch_summary.json");
        let json = serde_json::to_string_pretty(result)?;
        fs::write(&summary_path, json)?;

        if !result.errors.is_empty() {
            let errors_dir = target_dir.join("errors");
            if !errors_dir.exists() {
                fs::create_dir_all(&errors_dir)?;
            }

            let errors_path = errors_dir.join("batch_errors.json");
            let errors_json = serde_json::to_string_pretty(&result.errors)?;
            fs::write(&errors_path, errors_json)?;
        }

        tracing::info!("Saved batch results to {}", target_dir.display());
        Ok(summary_path)
    }
}
