//! Unified error type for the automark library.
//!
//! This module provides a single [`Error`] type that encompasses all errors
//! that can occur while grading, so callers can use `?` across codec,
//! comparison, pipeline and remote calls alike.

use thiserror::Error;

use crate::codec::DecodeError;
use crate::compare::ComparisonError;
use crate::config::ConfigError;
use crate::mapreduce::PipelineError;
use crate::remote::RemoteProtocolError;
use crate::runner::RunnerError;
use crate::sql::QueryError;

/// Unified error type for all automark operations.
///
/// # Example
///
/// ```ignore
/// use automark::{Result, TestBundle, TestRunner, Config};
///
/// fn grade(submission: &Submission) -> Result<bool> {
///     let runner = TestRunner::new(Config::from_file("automark.toml")?);
///     let bundle = runner.load_bundle()?;
///     let case = bundle.get(submission.name()).ok_or_else(|| ...)?;
///     runner.run_local_suite(case, submission)
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A tagged value could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// An expected output could not be compared.
    #[error(transparent)]
    Comparison(#[from] ComparisonError),

    /// A map or reduce callback failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A submitted query could not be run.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The grading server rejected a request or could not be reached.
    #[error(transparent)]
    Remote(#[from] RemoteProtocolError),

    /// The submission could not be run against its test case.
    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error outside of value decoding.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` if this is a decode error.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Returns `true` if this is a comparison error.
    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::Comparison(_))
    }

    /// Returns `true` if this is a map/reduce pipeline error.
    pub fn is_pipeline(&self) -> bool {
        matches!(self, Self::Pipeline(_))
    }

    /// Returns `true` if this is a query error.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// Returns `true` if this is a remote protocol error.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Returns `true` if this is a runner error.
    pub fn is_runner(&self) -> bool {
        matches!(self, Self::Runner(_))
    }

    /// Returns `true` if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns `true` if this is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
