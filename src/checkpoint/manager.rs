use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{info, warn};

use super::metadata::{CheckpointHyperparameters, CheckpointMetadata, CheckpointMetrics};
use super::table_io::{self, TableFormat};
use crate::ai::{TdConfig, ValueTable};
use crate::error::CheckpointError;

const METADATA_FILE: &str = "metadata.json";

/// Configuration for the checkpoint manager.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckpointManagerConfig {
    /// Directory holding the exported tables and metadata.
    pub table_dir: PathBuf,
    /// Table file name without extension.
    pub file_stem: String,
}

impl Default for CheckpointManagerConfig {
    fn default() -> Self {
        CheckpointManagerConfig {
            table_dir: PathBuf::from("tables"),
            file_stem: "4x5".to_string(),
        }
    }
}

/// A table restored from disk, with the episode it was exported at when
/// metadata is available.
#[derive(Debug)]
pub struct CheckpointData {
    pub table: ValueTable,
    pub format: TableFormat,
    pub metadata: Option<CheckpointMetadata>,
}

impl CheckpointData {
    /// Episode the loaded table was exported at. Zero for tables exported
    /// without metadata or whose form the metadata does not record.
    pub fn episode(&self) -> usize {
        self.metadata
            .as_ref()
            .map_or(0, |m| m.table_episode(self.format))
    }
}

/// Exports and imports value tables under a fixed directory and file stem.
pub struct CheckpointManager {
    config: CheckpointManagerConfig,
}

impl CheckpointManager {
    pub fn new(config: CheckpointManagerConfig) -> Self {
        CheckpointManager { config }
    }

    pub fn config(&self) -> &CheckpointManagerConfig {
        &self.config
    }

    pub fn table_path(&self, format: TableFormat) -> PathBuf {
        self.config
            .table_dir
            .join(format!("{}.{}", self.config.file_stem, format.extension()))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.config.table_dir.join(METADATA_FILE)
    }

    /// Write the table in each of `formats` followed by metadata.json.
    /// Returns the table paths written.
    pub fn save_checkpoint(
        &self,
        table: &ValueTable,
        td: &TdConfig,
        metrics: &CheckpointMetrics,
        episode: usize,
        formats: &[TableFormat],
    ) -> Result<Vec<PathBuf>, CheckpointError> {
        fs::create_dir_all(&self.config.table_dir)?;

        let mut tables = self.recorded_tables();
        let mut written = Vec::with_capacity(formats.len());
        for &format in formats {
            let path = self.table_path(format);
            table_io::write_table(table, &path, format)?;
            tables.insert(format, episode);
            written.push(path);
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        let metadata = CheckpointMetadata {
            episode,
            timestamp,
            entries: table.len(),
            metrics: metrics.clone(),
            hyperparameters: CheckpointHyperparameters::from(td),
            tables,
        };
        self.save_metadata(&metadata)?;

        info!(
            "Exported {} entries at episode {} to {}",
            table.len(),
            episode,
            self.config.table_dir.display()
        );
        Ok(written)
    }

    /// Per-form export episodes from the existing metadata, so forms not
    /// rewritten by this checkpoint keep their own episode.
    fn recorded_tables(&self) -> BTreeMap<TableFormat, usize> {
        if !self.metadata_path().exists() {
            return BTreeMap::new();
        }
        match self.load_metadata() {
            Ok(metadata) => metadata.tables,
            Err(e) => {
                warn!("Discarding unreadable checkpoint metadata: {}", e);
                BTreeMap::new()
            }
        }
    }

    pub fn save_metadata(&self, metadata: &CheckpointMetadata) -> Result<(), CheckpointError> {
        let path = self.metadata_path();
        let tmp_path = self.config.table_dir.join(format!("{}.tmp", METADATA_FILE));
        let meta_json = serde_json::to_string_pretty(metadata)?;
        fs::write(&tmp_path, meta_json)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn load_metadata(&self) -> Result<CheckpointMetadata, CheckpointError> {
        let meta_path = self.metadata_path();
        let meta_json =
            fs::read_to_string(&meta_path).map_err(|e| CheckpointError::MetadataRead {
                path: meta_path.clone(),
                source: e,
            })?;
        serde_json::from_str(&meta_json).map_err(|e| CheckpointError::MetadataParse {
            path: meta_path,
            source: e,
        })
    }

    /// Import the table stored in `format`.
    pub fn load_table(&self, format: TableFormat) -> Result<ValueTable, CheckpointError> {
        if !self.config.table_dir.is_dir() {
            return Err(CheckpointError::DirNotFound(self.config.table_dir.clone()));
        }
        let table = table_io::read_table(&self.table_path(format), format)?;
        info!(
            "Imported {} entries from {}",
            table.len(),
            self.table_path(format).display()
        );
        Ok(table)
    }

    /// Import the table and, when present, its metadata. Tables exported by
    /// other tools carry no metadata and resume from episode zero.
    pub fn load_latest(&self, format: TableFormat) -> Result<CheckpointData, CheckpointError> {
        let table = self.load_table(format)?;
        let metadata = if self.metadata_path().exists() {
            Some(self.load_metadata()?)
        } else {
            None
        };
        Ok(CheckpointData {
            table,
            format,
            metadata,
        })
    }
}
