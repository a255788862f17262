//! Error types for running submissions.

use thiserror::Error;

use super::bundle::TaskKind;

/// Errors that stop a submission from being run.
///
/// A submission that runs but produces a wrong answer is not an error; the
/// runner reports it as a failed test.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("No test case for function '{0}'")]
    UnknownFunction(String),

    #[error("Missing argument '{argument}' for '{function}'")]
    MissingArgument { function: String, argument: String },

    /// The submission's entry point cannot serve this task kind.
    #[error("'{function}' is a {entry} submission but its task kind is {kind}")]
    EntryMismatch {
        function: String,
        entry: &'static str,
        kind: TaskKind,
    },

    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// The submitted function itself failed.
    #[error("Function '{function}' failed: {source}")]
    Function {
        function: String,
        source: anyhow::Error,
    },

    #[error("Test case '{function}' has {inputs} inputs but {outputs} outputs")]
    MismatchedCase {
        function: String,
        inputs: usize,
        outputs: usize,
    },
}
