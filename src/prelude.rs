//! Convenient re-exports for common usage patterns.
//!
//! This module provides a single import to bring all commonly used types
//! into scope.
//!
//! # Example
//!
//! ```ignore
//! use automark::prelude::*;
//!
//! let codec = ValueCodec::local();
//! let expected = codec.encode(&Value::Float(0.3));
//! assert!(outputs_match(TaskKind::Standard, &expected, &Value::Float(0.1 + 0.2), &codec)?);
//! ```

// Unified error handling
pub use crate::error::{Error, Result};

// Values
pub use crate::value::{DType, NdArray, ShapeError, Table, Value, ValueCategory};

// Partitioned values
pub use crate::dataset::{DataFrame, Dataset, ExecutionContext, LocalContext};

// Codec
pub use crate::codec::{DecodeError, PlainKind, TaggedValue, TypeTag, ValueCodec};

// Comparison
pub use crate::compare::{
    ComparisonError, array_equal, map_reduce_results_equal, outputs_match,
    partitioned_collection_results_equal, partitioned_table_results_equal, scalars_equal,
    table_equal,
};

// Map/reduce
pub use crate::mapreduce::{DEFAULT_NUM_REDUCERS, KeyValuePartition, MapReduceJob, PipelineError};

// SQL
#[cfg(feature = "sqlite")]
pub use crate::sql::SqliteEngine;
pub use crate::sql::{QueryEngine, QueryError};

// Remote protocol
pub use crate::remote::{CheckAnswerReply, GradingServer, RemoteProtocolError, RemoteTestInput};

// Running submissions
pub use crate::config::{Config, ConfigError};
pub use crate::runner::{
    Args, RunnerError, Submission, TaskKind, TestBundle, TestCase, TestRunner, Verdict,
};
