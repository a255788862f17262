//! The function under test.

use std::collections::BTreeMap;
use std::fmt;

use super::error::RunnerError;
use crate::mapreduce::MapReduceJob;
use crate::value::Value;

/// Keyword arguments passed to a submitted function.
pub type Args = BTreeMap<String, Value>;

/// Boxed function of keyword arguments.
pub type FunctionEntry = Box<dyn Fn(&Args) -> anyhow::Result<Value>>;

/// How a submission is invoked.
pub enum Entry {
    /// Called with the declared parameters bound from the test input.
    Function(FunctionEntry),
    /// Called without arguments; returns the SQL text to execute.
    Query(Box<dyn Fn() -> String>),
    /// Called without arguments; returns the job to run.
    MapReduce(Box<dyn Fn() -> MapReduceJob>),
}

impl Entry {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Entry::Function(_) => "function",
            Entry::Query(_) => "query",
            Entry::MapReduce(_) => "map/reduce",
        }
    }
}

/// A named function submitted for grading, with its declared parameters.
///
/// # Example
///
/// ```ignore
/// use automark::runner::Submission;
/// use automark::Value;
///
/// let add = Submission::function("add", &["a", "b"], |args| {
///     let a = args.get("a").and_then(Value::as_i64).unwrap_or(0);
///     let b = args.get("b").and_then(Value::as_i64).unwrap_or(0);
///     Ok(Value::Int(a + b))
/// });
/// ```
pub struct Submission {
    name: String,
    params: Vec<String>,
    entry: Entry,
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("entry", &self.entry.kind_name())
            .finish()
    }
}

impl Submission {
    pub fn function<F>(name: impl Into<String>, params: &[&str], function: F) -> Self
    where
        F: Fn(&Args) -> anyhow::Result<Value> + 'static,
    {
        Self {
            name: name.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
            entry: Entry::Function(Box::new(function)),
        }
    }

    pub fn query<F>(name: impl Into<String>, query: F) -> Self
    where
        F: Fn() -> String + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            entry: Entry::Query(Box::new(query)),
        }
    }

    pub fn map_reduce<F>(name: impl Into<String>, job: F) -> Self
    where
        F: Fn() -> MapReduceJob + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            entry: Entry::MapReduce(Box::new(job)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Arguments for the declared parameters, taken from `input`. Extra
    /// input keys are ignored.
    pub fn bind(&self, input: &Args) -> Result<Args, RunnerError> {
        self.params
            .iter()
            .map(|param| {
                input
                    .get(param)
                    .map(|value| (param.clone(), value.clone()))
                    .ok_or_else(|| RunnerError::MissingArgument {
                        function: self.name.clone(),
                        argument: param.clone(),
                    })
            })
            .collect()
    }
}
