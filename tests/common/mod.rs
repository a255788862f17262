//! Common test utilities and fixtures.
//!
//! This module provides shared submissions, bundle builders and an in-memory
//! grading server to reduce duplication across the test suite.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use automark::prelude::*;
use automark::remote::{CheckAnswerReply, RemoteTestInput};
use tempfile::TempDir;

// =============================================================================
// Submissions
// =============================================================================

/// `add(a, b) = a + b` over integers.
pub fn add_submission() -> Submission {
    Submission::function("add", &["a", "b"], |args| {
        let a = args.get("a").and_then(Value::as_i64).unwrap_or_default();
        let b = args.get("b").and_then(Value::as_i64).unwrap_or_default();
        Ok(Value::Int(a + b))
    })
}

/// Word count: map splits lines into `(word, 1)`, reduce sums the ones.
pub fn word_count_job() -> MapReduceJob {
    MapReduceJob::new(
        |_, line| {
            let text = line
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("line is a {}, not a string", line.type_name()))?;
            Ok(text
                .split_whitespace()
                .map(|word| (Value::from(word), Value::Int(1)))
                .collect())
        },
        |word, counts| {
            let total = counts.iter().filter_map(Value::as_i64).sum::<i64>();
            Ok(vec![(word.clone(), Value::Int(total))])
        },
    )
}

pub fn word_count_submission() -> Submission {
    Submission::map_reduce("count_words", word_count_job)
}

// =============================================================================
// Tagged values and test cases
// =============================================================================

pub fn tagged(value: impl Into<Value>) -> TaggedValue {
    ValueCodec::local().encode(&value.into())
}

/// A single-partition list of `(line number, line)` records.
pub fn lines(texts: &[&str]) -> Vec<KeyValuePartition> {
    vec![
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| (Value::Int(i as i64), Value::from(*text)))
            .collect(),
    ]
}

pub fn input(pairs: &[(&str, TaggedValue)]) -> BTreeMap<String, TaggedValue> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

pub fn add_case(a: i64, b: i64, expected: i64) -> TestCase {
    TestCase::new(
        TaskKind::Standard,
        vec![input(&[("a", tagged(a)), ("b", tagged(b))])],
        vec![tagged(expected)],
    )
}

/// Word count case whose expected output comes from running the job itself.
pub fn word_count_case(texts: &[&str], num_reducers: usize) -> anyhow::Result<TestCase> {
    let partitions = lines(texts);
    let expected = word_count_job().run(&partitions, num_reducers)?;
    Ok(TestCase::new(
        TaskKind::MapReduce,
        vec![input(&[(
            "input_partitions",
            tagged(automark::mapreduce::partitions_to_value(&partitions)),
        )])],
        vec![tagged(automark::mapreduce::partitions_to_value(&expected))],
    ))
}

/// Write `bundle` into a fresh directory; returns the directory guard and
/// the bundle path.
pub fn write_bundle(bundle: &TestBundle) -> anyhow::Result<(TempDir, PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tests.json");
    std::fs::write(&path, bundle.to_json_string()?)?;
    Ok((dir, path))
}

pub fn config_for(test_path: PathBuf) -> Config {
    Config {
        username: "student".to_string(),
        test_path,
        ..Config::default()
    }
}

// =============================================================================
// In-memory grading server
// =============================================================================

/// Grading server that keeps hidden cases in memory and grades answers with
/// the library's own comparison rules.
#[derive(Default)]
pub struct MemoryServer {
    hidden: HashMap<String, (RemoteTestInput, TaggedValue)>,
    errors: HashMap<String, String>,
    answers: RefCell<Vec<(String, String, String)>>,
    input_requests: RefCell<usize>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the hidden case for `function`.
    pub fn with_case(
        mut self,
        function: &str,
        task_kind: TaskKind,
        input: BTreeMap<String, TaggedValue>,
        expected: TaggedValue,
    ) -> Self {
        let request_id = format!("req-{}", self.hidden.len() + 1);
        self.hidden.insert(
            function.to_string(),
            (
                RemoteTestInput {
                    input,
                    task_kind,
                    request_id,
                },
                expected,
            ),
        );
        self
    }

    /// Answer every request for `function` with an error payload.
    pub fn with_error(mut self, function: &str, message: &str) -> Self {
        self.errors.insert(function.to_string(), message.to_string());
        self
    }

    /// `(function, request id, answer)` for every checked answer.
    pub fn answers(&self) -> Vec<(String, String, String)> {
        self.answers.borrow().clone()
    }

    pub fn input_requests(&self) -> usize {
        *self.input_requests.borrow()
    }
}

impl GradingServer for MemoryServer {
    fn get_test_input(
        &self,
        _username: &str,
        function: &str,
    ) -> std::result::Result<RemoteTestInput, RemoteProtocolError> {
        *self.input_requests.borrow_mut() += 1;
        if let Some(message) = self.errors.get(function) {
            return Err(RemoteProtocolError::Server(message.clone()));
        }
        self.hidden
            .get(function)
            .map(|(input, _)| input.clone())
            .ok_or_else(|| RemoteProtocolError::Server(format!("unknown function {}", function)))
    }

    fn check_answer(
        &self,
        _username: &str,
        function: &str,
        request_id: &str,
        answer: &str,
    ) -> std::result::Result<CheckAnswerReply, RemoteProtocolError> {
        self.answers.borrow_mut().push((
            function.to_string(),
            request_id.to_string(),
            answer.to_string(),
        ));
        let (input, expected) = self
            .hidden
            .get(function)
            .ok_or_else(|| RemoteProtocolError::Status(404))?;
        if input.request_id != request_id {
            return Err(RemoteProtocolError::Server("stale request id".to_string()));
        }

        let codec = ValueCodec::local();
        let success = TaggedValue::from_json_str(answer)
            .map_err(|e| RemoteProtocolError::MalformedReply(e.to_string()))
            .and_then(|tagged| {
                codec
                    .decode(&tagged)
                    .map_err(|e| RemoteProtocolError::MalformedReply(e.to_string()))
            })
            .map(|actual| {
                outputs_match(input.task_kind, expected, &actual, &codec).unwrap_or(false)
            })?;
        Ok(CheckAnswerReply { success })
    }
}
