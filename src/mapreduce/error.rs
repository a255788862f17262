//! Error types for the map/reduce pipeline.

use thiserror::Error;

/// Errors that abort a map/reduce run. No partial output survives them.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The map callback failed.
    #[error("Map failed in input partition {partition} for key {key}: {source}")]
    Map {
        partition: usize,
        key: String,
        source: anyhow::Error,
    },

    /// The reduce callback failed.
    #[error("Reduce failed in reducer partition {partition} for key {key}: {source}")]
    Reduce {
        partition: usize,
        key: String,
        source: anyhow::Error,
    },

    /// A run needs at least one reducer partition.
    #[error("num_reducers must be at least 1")]
    NoReducers,
}
