use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::table_io::TableFormat;
use crate::ai::TdConfig;

/// Metrics snapshot at checkpoint time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    /// Share of recent self-play games won by the first mover.
    pub red_win_rate: f32,
    pub draw_rate: f32,
    pub average_game_length: f32,
    pub mean_abs_td_error: f32,
    /// Inference-mode win rate against a uniform random opponent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_win_rate: Option<f32>,
}

/// Hyperparameters recorded in checkpoint metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointHyperparameters {
    pub alpha: f64,
    pub gamma: f64,
}

impl From<&TdConfig> for CheckpointHyperparameters {
    fn from(config: &TdConfig) -> Self {
        CheckpointHyperparameters {
            alpha: config.alpha,
            gamma: config.gamma,
        }
    }
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Last completed episode.
    pub episode: usize,
    pub timestamp: u64,
    /// Number of (player, state, action) entries in the table.
    pub entries: usize,
    pub metrics: CheckpointMetrics,
    pub hyperparameters: CheckpointHyperparameters,
    /// Episode at which each table form on disk was last exported. Interval
    /// checkpoints only refresh the full form.
    #[serde(default)]
    pub tables: BTreeMap<TableFormat, usize>,
}

impl CheckpointMetadata {
    /// Episode the table in `format` was exported at, zero if never recorded.
    pub fn table_episode(&self, format: TableFormat) -> usize {
        self.tables.get(&format).copied().unwrap_or(0)
    }
}
