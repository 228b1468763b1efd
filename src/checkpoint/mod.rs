mod manager;
mod metadata;
mod table_io;

pub use manager::{CheckpointData, CheckpointManager, CheckpointManagerConfig};
pub use metadata::{CheckpointHyperparameters, CheckpointMetadata, CheckpointMetrics};
pub use table_io::{read_table, write_table, TableFormat};
