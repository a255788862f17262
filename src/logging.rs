//! Logging macros for the grading pipeline.
//!
//! With the `logging` feature the macros forward to `tracing`; the `automark`
//! binary installs the subscriber. Without it they expand to nothing, so the
//! library carries no tracing dependency.
//!
//! Levels as used across the crate:
//!
//! - `trace`: map, shuffle and reduce steps of a pipeline run
//! - `debug`: partitioning, decoding and comparison mismatches
//! - `info`: bundle loading and the local/remote stages of a submission
//! - `warn`: a failed local case or a rejected remote answer
//! - `error`: a student function that raised
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::logging::{info, warn};
//!
//! info!(function = submission.name(), cases = case.len(), "running local tests");
//! warn!(function = submission.name(), case = index, "local test failed");
//! ```

/// Pipeline phase steps.
#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { tracing::trace!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

/// Codec and comparison details.
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Submission lifecycle.
#[cfg(feature = "logging")]
macro_rules! log_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

/// Failed cases and rejected answers.
#[cfg(feature = "logging")]
macro_rules! log_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

/// Student function failures.
#[cfg(feature = "logging")]
macro_rules! log_error {
    ($($arg:tt)*) => { tracing::error!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_error {
    ($($arg:tt)*) => {};
}

pub(crate) use log_debug as debug;
pub(crate) use log_error as error;
pub(crate) use log_info as info;
pub(crate) use log_trace as trace;
pub(crate) use log_warn as warn;
