//! Client-side grading harness.
//!
//! This library runs a submitted function against a bundle of local test
//! cases and, once those pass, against a hidden case held by a grading
//! server. Its core is a codec that moves heterogeneous values through a
//! tagged JSON envelope, and a comparison engine that decides whether a
//! produced answer equals the expected one.
//!
//! # Quick Start
//!
//! ```ignore
//! use automark::prelude::*;
//!
//! let runner = TestRunner::new(Config::from_file("automark.toml")?);
//! let bundle = runner.load_bundle()?;
//!
//! let add = Submission::function("add", &["a", "b"], |args| {
//!     let a = args.get("a").and_then(Value::as_i64).unwrap_or(0);
//!     let b = args.get("b").and_then(Value::as_i64).unwrap_or(0);
//!     Ok(Value::Int(a + b))
//! });
//!
//! let verdict = runner.test_submission(&bundle, &server, &add)?;
//! ```
//!
//! # Modules
//!
//! - [`value`] - Dynamic values, arrays and tables
//! - [`dataset`] - Execution context for partitioned values
//! - [`codec`] - Tagged value encoding/decoding
//! - [`compare`] - Tolerance-aware output comparison
//! - [`mapreduce`] - Local map/reduce pipeline
//! - [`sql`] - Query engine for SQL tasks
//! - [`remote`] - Grading server protocol
//! - [`runner`] - Test bundles, submissions and the test runner
//! - [`config`] - TOML configuration
//!
//! # Feature Flags
//!
//! - `sqlite` - Enable the SQLite-backed query engine (enabled by default)
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)
//! - `cli` - Enable the command-line interface binary
//! - `full` - Enable all features

pub mod codec;
pub mod compare;
pub mod config;
pub mod dataset;
mod logging;
pub mod mapreduce;
pub mod prelude;
pub mod remote;
pub mod runner;
pub mod sql;
pub mod value;

mod error;

// Re-export the unified error type
pub use error::{Error, Result};

// Re-export the most used types at crate root for convenience
pub use codec::{DecodeError, PlainKind, TaggedValue, TypeTag, ValueCodec};
pub use compare::{ComparisonError, outputs_match};
pub use config::{Config, ConfigError};
pub use dataset::{DataFrame, Dataset, ExecutionContext, LocalContext};
pub use mapreduce::{KeyValuePartition, MapReduceJob, PipelineError};
pub use remote::{GradingServer, RemoteProtocolError};
pub use runner::{Submission, TaskKind, TestBundle, TestCase, TestRunner, Verdict};
pub use value::{NdArray, Table, Value, ValueCategory};
