//! Test bundle model: the local test cases for every gradable function.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::RunnerError;
use crate::codec::TaggedValue;
use crate::error::{Error, Result};

/// How a function's inputs are prepared and its output compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    /// Plain function of its keyword arguments.
    Standard,
    /// Returns a SQL query run over the inputs as tables.
    SqlQuery,
    /// Returns a map/reduce job run over `input_partitions`.
    MapReduce,
    /// Returns a partitioned collection of key/value records.
    PartitionedCollection,
    /// Returns a partitioned table.
    PartitionedTable,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Standard => "STANDARD",
            TaskKind::SqlQuery => "SQL_QUERY",
            TaskKind::MapReduce => "MAP_REDUCE",
            TaskKind::PartitionedCollection => "PARTITIONED_COLLECTION",
            TaskKind::PartitionedTable => "PARTITIONED_TABLE",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs and expected outputs of one function, paired by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(alias = "task_type")]
    pub task_kind: TaskKind,
    pub inputs: Vec<BTreeMap<String, TaggedValue>>,
    pub outputs: Vec<TaggedValue>,
}

impl TestCase {
    pub fn new(
        task_kind: TaskKind,
        inputs: Vec<BTreeMap<String, TaggedValue>>,
        outputs: Vec<TaggedValue>,
    ) -> Self {
        Self {
            task_kind,
            inputs,
            outputs,
        }
    }

    /// Number of input/output pairs.
    pub fn len(&self) -> usize {
        self.inputs.len().min(self.outputs.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&BTreeMap<String, TaggedValue>, &TaggedValue)> {
        self.inputs.iter().zip(&self.outputs)
    }

    /// Every input must have an expected output and vice versa.
    pub fn validate(&self, function: &str) -> std::result::Result<(), RunnerError> {
        if self.inputs.len() == self.outputs.len() {
            Ok(())
        } else {
            Err(RunnerError::MismatchedCase {
                function: function.to_string(),
                inputs: self.inputs.len(),
                outputs: self.outputs.len(),
            })
        }
    }
}

/// Test cases keyed by function name.
///
/// Serialized as a JSON object `{function name: test case}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestBundle {
    cases: BTreeMap<String, TestCase>,
}

impl TestBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a bundle from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let bundle: Self = serde_json::from_str(text)?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Read and validate a bundle file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(Error::Io)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn insert(&mut self, function: impl Into<String>, case: TestCase) {
        self.cases.insert(function.into(), case);
    }

    pub fn get(&self, function: &str) -> Option<&TestCase> {
        self.cases.get(function)
    }

    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.cases.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TestCase)> {
        self.cases.iter().map(|(name, case)| (name.as_str(), case))
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    fn validate(&self) -> std::result::Result<(), RunnerError> {
        self.cases
            .iter()
            .try_for_each(|(function, case)| case.validate(function))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"{
        "add": {
            "task_kind": "STANDARD",
            "inputs": [{"a": {"data": 1, "type": "int"}, "b": {"data": 2, "type": "int"}}],
            "outputs": [{"data": 3, "type": "int"}]
        },
        "count_words": {
            "task_type": "MAP_REDUCE",
            "inputs": [],
            "outputs": []
        }
    }"#;

    #[test]
    fn test_parse_bundle() -> Result<()> {
        let bundle = TestBundle::from_json_str(BUNDLE)?;
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.functions().collect::<Vec<_>>(), vec!["add", "count_words"]);
        let add = bundle.get("add");
        assert_eq!(add.map(|c| c.task_kind), Some(TaskKind::Standard));
        assert_eq!(add.map(TestCase::len), Some(1));
        assert_eq!(
            bundle.get("count_words").map(|c| c.task_kind),
            Some(TaskKind::MapReduce)
        );
        Ok(())
    }

    #[test]
    fn test_mismatched_case_rejected() {
        let text = r#"{"f": {"task_kind": "STANDARD", "inputs": [{}], "outputs": []}}"#;
        let result = TestBundle::from_json_str(text);
        assert!(result.is_err_and(|e| e.is_runner()));
    }

    #[test]
    fn test_round_trip_through_json() -> Result<()> {
        let bundle = TestBundle::from_json_str(BUNDLE)?;
        let again = TestBundle::from_json_str(&bundle.to_json_string()?)?;
        assert_eq!(bundle, again);
        Ok(())
    }

    #[test]
    fn test_task_kind_wire_names() -> Result<()> {
        let kind: TaskKind = serde_json::from_str("\"PARTITIONED_TABLE\"")?;
        assert_eq!(kind, TaskKind::PartitionedTable);
        assert_eq!(TaskKind::SqlQuery.to_string(), "SQL_QUERY");
        Ok(())
    }
}
