//! Running submissions against local test cases and the grading server.
//!
//! [`TestRunner::test_submission`] is the full flow: run the local suite for
//! the submission's function, and only if every local case passes, run the
//! hidden remote test.
//!
//! # Module Organization
//!
//! - [`bundle`]: Test bundle and task kinds
//! - [`submission`]: The function under test
//! - [`error`]: Runner errors

mod bundle;
mod error;
mod submission;

pub use bundle::{TaskKind, TestBundle, TestCase};
pub use error::RunnerError;
pub use submission::{Args, Entry, FunctionEntry, Submission};

use std::collections::BTreeMap;

use crate::codec::{TaggedValue, ValueCodec};
use crate::compare::outputs_match;
use crate::config::Config;
use crate::error::Result;
use crate::logging::{debug, error, info, warn};
use crate::mapreduce::{DEFAULT_NUM_REDUCERS, partitions_from_value, partitions_to_value};
use crate::remote::GradingServer;
use crate::sql::{self, QueryEngine, QueryError};
use crate::value::Value;

/// Input key holding a map/reduce task's input partitions.
pub const INPUT_PARTITIONS: &str = "input_partitions";

/// Outcome of grading a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A local test case failed; the server was not contacted.
    LocalFailed,
    /// Local tests passed but the server rejected the answer.
    RemoteFailed,
    Passed,
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

/// Runs submissions through their test cases.
pub struct TestRunner {
    config: Config,
    codec: ValueCodec,
    query_engine: Option<Box<dyn QueryEngine>>,
}

impl std::fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestRunner")
            .field("config", &self.config)
            .field("codec", &self.codec)
            .field("query_engine", &self.query_engine.is_some())
            .finish()
    }
}

impl TestRunner {
    /// Runner with a local execution context and the default query engine.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            codec: ValueCodec::local(),
            query_engine: sql::default_engine(),
        }
    }

    pub fn with_codec(mut self, codec: ValueCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_query_engine(mut self, engine: impl QueryEngine + 'static) -> Self {
        self.query_engine = Some(Box::new(engine));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    /// Load the bundle at the configured test path.
    pub fn load_bundle(&self) -> Result<TestBundle> {
        info!(path = %self.config.test_path.display(), "loading local tests");
        TestBundle::from_file(&self.config.test_path)
    }

    /// Run every case of `case` in order. Returns `false` at the first
    /// output that does not match.
    pub fn run_local_suite(&self, case: &TestCase, submission: &Submission) -> Result<bool> {
        case.validate(submission.name())?;
        for (index, (input, expected)) in case.pairs().enumerate() {
            let args = self.decode_inputs(input)?;
            let actual = self.execute(case.task_kind, submission, &args)?;
            if !outputs_match(case.task_kind, expected, &actual, &self.codec)? {
                warn!(function = submission.name(), case = index, "local test failed");
                return Ok(false);
            }
            debug!(function = submission.name(), case = index, "local test passed");
        }
        Ok(true)
    }

    /// Run the submission on the server's hidden input and let the server
    /// check the answer.
    pub fn run_remote_test(&self, server: &dyn GradingServer, submission: &Submission) -> Result<bool> {
        let username = self.config.username.as_str();
        let reply = server.get_test_input(username, submission.name())?;

        let args = if submission.params().is_empty() {
            self.decode_inputs(&reply.input)?
        } else {
            submission
                .params()
                .iter()
                .map(|param| -> Result<(String, Value)> {
                    let tagged = reply.input.get(param).ok_or_else(|| RunnerError::MissingArgument {
                        function: submission.name().to_string(),
                        argument: param.clone(),
                    })?;
                    Ok((param.clone(), self.codec.decode(tagged)?))
                })
                .collect::<Result<Args>>()?
        };

        let actual = self.execute(reply.task_kind, submission, &args)?;
        let answer = self.codec.encode(&actual).to_json_string()?;
        let verdict = server.check_answer(username, submission.name(), &reply.request_id, &answer)?;
        if !verdict.success {
            warn!(function = submission.name(), "remote test failed");
        }
        Ok(verdict.success)
    }

    /// Grade `submission`: local suite first, then the remote test.
    pub fn test_submission(
        &self,
        bundle: &TestBundle,
        server: &dyn GradingServer,
        submission: &Submission,
    ) -> Result<Verdict> {
        let case = bundle
            .get(submission.name())
            .ok_or_else(|| RunnerError::UnknownFunction(submission.name().to_string()))?;

        info!(function = submission.name(), cases = case.len(), "running local tests");
        if !self.run_local_suite(case, submission)? {
            info!(function = submission.name(), "failed some local tests");
            return Ok(Verdict::LocalFailed);
        }
        info!(function = submission.name(), "passed local tests");

        info!(function = submission.name(), "running remote test");
        if !self.run_remote_test(server, submission)? {
            return Ok(Verdict::RemoteFailed);
        }
        info!(function = submission.name(), "remote test passed");
        Ok(Verdict::Passed)
    }

    fn decode_inputs(&self, input: &BTreeMap<String, TaggedValue>) -> Result<Args> {
        input
            .iter()
            .map(|(name, tagged)| -> Result<(String, Value)> {
                Ok((name.clone(), self.codec.decode(tagged)?))
            })
            .collect()
    }

    /// Invoke the submission the way `kind` requires.
    fn execute(&self, kind: TaskKind, submission: &Submission, input: &Args) -> Result<Value> {
        match (kind, submission.entry()) {
            (TaskKind::SqlQuery, Entry::Query(query)) => {
                let engine = self
                    .query_engine
                    .as_deref()
                    .ok_or(QueryError::Unavailable)?;
                let tables = sql::tables_from_args(input)?;
                Ok(Value::Table(engine.execute(&query(), &tables)?))
            }
            (TaskKind::MapReduce, Entry::MapReduce(job)) => {
                let partitions = input.get(INPUT_PARTITIONS).ok_or_else(|| {
                    RunnerError::MissingArgument {
                        function: submission.name().to_string(),
                        argument: INPUT_PARTITIONS.to_string(),
                    }
                })?;
                let partitions = partitions_from_value(partitions).ok_or_else(|| {
                    RunnerError::InvalidArgument {
                        argument: INPUT_PARTITIONS.to_string(),
                        reason: format!(
                            "expected a list of lists of key/value pairs, got a {}",
                            partitions.type_name()
                        ),
                    }
                })?;
                let output = job().run(&partitions, DEFAULT_NUM_REDUCERS)?;
                Ok(partitions_to_value(&output))
            }
            (
                TaskKind::Standard | TaskKind::PartitionedCollection | TaskKind::PartitionedTable,
                Entry::Function(function),
            ) => {
                let args = submission.bind(input)?;
                function(&args).map_err(|source| {
                    error!(function = submission.name(), error = %source, "submission raised an error");
                    RunnerError::Function {
                        function: submission.name().to_string(),
                        source,
                    }
                    .into()
                })
            }
            (kind, entry) => Err(RunnerError::EntryMismatch {
                function: submission.name().to_string(),
                entry: entry.kind_name(),
                kind,
            }
            .into()),
        }
    }
}
