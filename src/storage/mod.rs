// src/storage/mod.rs
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::extractors::industry::IndustryType;
use crate::fnguide::models::CollectionTarget;
use crate::record::{ColumnLayout, CompanyRecord};
use crate::utils::error::StorageError;

/// JSON summary written next to the tables of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub target: CollectionTarget,
    pub current_year: i32,
    pub started_at: String,
    pub finished_at: String,
    pub total: usize,
    pub succeeded: usize,
    pub no_data: Vec<String>,
    pub failures: Vec<FailureEntry>,
    pub output_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    pub code: String,
    pub cause: String,
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Writes `records` as one CSV table with the given column order.
    /// Cells a record does not have are left empty.
    pub fn save_table(&self, file_name: &str, columns: &[String], records: &[CompanyRecord]) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(file_name);
        let mut writer = csv::Writer::from_path(&file_path)?;

        writer.write_record(columns)?;
        for record in records {
            let fields = record.fields();
            writer.write_record(
                columns
                    .iter()
                    .map(|column| fields.get(column).map(ToString::to_string).unwrap_or_default()),
            )?;
        }
        writer.flush().map_err(StorageError::IoError)?;

        tracing::info!("Saved {} rows x {} columns to {}", records.len(), columns.len(), file_path.display());
        Ok(file_path)
    }

    /// Main table of a run: `{stem}_{timestamp}.csv`.
    pub fn save_target_table(
        &self,
        target: CollectionTarget,
        records: &[CompanyRecord],
        timestamp: &str,
    ) -> Result<PathBuf, StorageError> {
        let columns = target.layout().ordered_columns(records);
        self.save_table(&format!("{}_{}.csv", target.file_stem(), timestamp), &columns, records)
    }

    /// One table per industry type, limited to that industry's indicators.
    /// Industries without companies are skipped.
    pub fn save_industry_partitions(
        &self,
        target: CollectionTarget,
        layout: &ColumnLayout,
        records: &[CompanyRecord],
        timestamp: &str,
    ) -> Result<Vec<PathBuf>, StorageError> {
        let mut paths = Vec::new();
        for industry in IndustryType::ALL {
            let members: Vec<CompanyRecord> = records.iter().filter(|r| r.industry == industry).cloned().collect();
            if members.is_empty() {
                tracing::debug!("No {} companies, skipping partition", industry);
                continue;
            }
            let columns = layout.partition_columns(&members, industry);
            let file_name = format!("{}_{}_{}.csv", target.file_stem(), industry.label(), timestamp);
            paths.push(self.save_table(&file_name, &columns, &members)?);
        }
        Ok(paths)
    }

    /// Saves the run summary in JSON format
    pub fn save_run_summary(&self, summary: &RunSummary, timestamp: &str) -> Result<PathBuf, StorageError> {
        let file_path = self
            .base_dir
            .join(format!("{}_{}_summary.json", summary.target.file_stem(), timestamp));

        let summary_str = serde_json::to_string_pretty(summary)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, summary_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved run summary to {}", file_path.display());
        Ok(file_path)
    }
}
