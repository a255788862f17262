//! End-to-end tests for the test runner: local suites for every task kind
//! and the full local-then-remote grading flow.

mod common;

use anyhow::anyhow;
use automark::prelude::*;
use automark::runner::RunnerError;
use common::*;

fn runner() -> TestRunner {
    TestRunner::new(Config::default())
}

// =============================================================================
// STANDARD tasks
// =============================================================================

#[test]
fn test_add_passes_local_suite() -> anyhow::Result<()> {
    assert!(runner().run_local_suite(&add_case(1, 2, 3), &add_submission())?);
    Ok(())
}

#[test]
fn test_add_fails_local_suite_on_wrong_expectation() -> anyhow::Result<()> {
    assert!(!runner().run_local_suite(&add_case(1, 2, 4), &add_submission())?);
    Ok(())
}

#[test]
fn test_suite_stops_at_first_mismatch() -> anyhow::Result<()> {
    let case = TestCase::new(
        TaskKind::Standard,
        vec![
            input(&[("a", tagged(1)), ("b", tagged(1))]),
            input(&[("a", tagged(2)), ("b", tagged(2))]),
        ],
        vec![tagged(3), tagged(4)],
    );
    assert!(!runner().run_local_suite(&case, &add_submission())?);
    Ok(())
}

#[test]
fn test_extra_inputs_are_ignored() -> anyhow::Result<()> {
    let case = TestCase::new(
        TaskKind::Standard,
        vec![input(&[("a", tagged(1)), ("b", tagged(2)), ("c", tagged(100))])],
        vec![tagged(3)],
    );
    assert!(runner().run_local_suite(&case, &add_submission())?);
    Ok(())
}

#[test]
fn test_missing_argument_is_an_error() {
    let case = TestCase::new(
        TaskKind::Standard,
        vec![input(&[("a", tagged(1))])],
        vec![tagged(1)],
    );
    let result = runner().run_local_suite(&case, &add_submission());
    assert!(matches!(
        result,
        Err(Error::Runner(RunnerError::MissingArgument { ref argument, .. })) if argument == "b"
    ));
}

#[test]
fn test_float_output_uses_tolerance() -> anyhow::Result<()> {
    let mean = Submission::function("mean", &["xs"], |args| {
        let xs = args
            .get("xs")
            .and_then(Value::as_list)
            .ok_or_else(|| anyhow!("xs is not a list"))?;
        let sum: f64 = xs.iter().filter_map(Value::as_f64).sum();
        Ok(Value::Float(sum / xs.len() as f64))
    });
    let xs = Value::List(vec![Value::Float(0.1), Value::Float(0.2), Value::Float(0.3)]);
    let case = TestCase::new(
        TaskKind::Standard,
        vec![input(&[("xs", tagged(xs))])],
        vec![tagged(0.2000001)],
    );
    assert!(runner().run_local_suite(&case, &mean)?);
    Ok(())
}

#[test]
fn test_array_output() -> anyhow::Result<()> {
    let scale = Submission::function("scale", &["xs"], |args| {
        let xs = args
            .get("xs")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("xs is not an array"))?;
        let data = xs.data().iter().map(|x| x * 2.0).collect();
        Ok(Value::Array(NdArray::new(xs.shape().to_vec(), data, DType::Float)?))
    });
    let case = TestCase::new(
        TaskKind::Standard,
        vec![input(&[("xs", tagged(NdArray::from_f64(vec![0.5, 1.5])))])],
        vec![tagged(NdArray::from_f64(vec![1.0, 3.0000001]))],
    );
    assert!(runner().run_local_suite(&case, &scale)?);
    Ok(())
}

#[test]
fn test_table_output_ignores_row_order() -> anyhow::Result<()> {
    let reverse = Submission::function("reverse", &["t"], |args| {
        let table = args
            .get("t")
            .and_then(Value::as_table)
            .ok_or_else(|| anyhow!("t is not a table"))?;
        let rows = table.rows().iter().rev().cloned().collect();
        Ok(Value::Table(Table::new(table.columns().to_vec(), rows)?))
    });
    let table = Table::from_columns(vec![
        ("k".to_string(), vec![Value::from("x"), Value::from("y")]),
        ("v".to_string(), vec![Value::Int(1), Value::Int(2)]),
    ])?;
    let case = TestCase::new(
        TaskKind::Standard,
        vec![input(&[("t", tagged(table.clone()))])],
        vec![tagged(table)],
    );
    assert!(runner().run_local_suite(&case, &reverse)?);
    Ok(())
}

#[test]
fn test_failing_function_propagates() {
    let broken = Submission::function("add", &["a", "b"], |_| Err(anyhow!("division by zero")));
    let result = runner().run_local_suite(&add_case(1, 2, 3), &broken);
    assert!(result.is_err_and(|e| e.is_runner()));
}

#[test]
fn test_partitioned_expectation_rejected_for_standard_task() {
    let expected = tagged(Dataset::from_partitions(vec![vec![Value::pair("a", 1)]]));
    let case = TestCase::new(
        TaskKind::Standard,
        vec![input(&[("a", tagged(1)), ("b", tagged(0))])],
        vec![expected],
    );
    let result = runner().run_local_suite(&case, &add_submission());
    assert!(result.is_err_and(|e| e.is_comparison()));
}

// =============================================================================
// MAP_REDUCE tasks
// =============================================================================

#[test]
fn test_word_count_matches_regardless_of_reducer_count() -> anyhow::Result<()> {
    // Expected output was produced with five reducers; the runner uses two.
    let case = word_count_case(&["a b a", "b c"], 5)?;
    assert!(runner().run_local_suite(&case, &word_count_submission())?);
    Ok(())
}

#[test]
fn test_word_count_detects_wrong_counts() -> anyhow::Result<()> {
    let expected = automark::mapreduce::partitions_to_value(&[
        vec![(Value::from("a"), Value::Int(3))],
        vec![(Value::from("b"), Value::Int(1))],
    ]);
    let case = TestCase::new(
        TaskKind::MapReduce,
        vec![input(&[(
            "input_partitions",
            tagged(automark::mapreduce::partitions_to_value(&lines(&["a b a"]))),
        )])],
        vec![tagged(expected)],
    );
    assert!(!runner().run_local_suite(&case, &word_count_submission())?);
    Ok(())
}

#[test]
fn test_map_failure_is_pipeline_error() {
    let partitions = vec![vec![(Value::Int(0), Value::Int(42))]];
    let case = TestCase::new(
        TaskKind::MapReduce,
        vec![input(&[(
            "input_partitions",
            tagged(automark::mapreduce::partitions_to_value(&partitions)),
        )])],
        vec![tagged(Value::List(vec![]))],
    );
    let result = runner().run_local_suite(&case, &word_count_submission());
    assert!(result.is_err_and(|e| e.is_pipeline()));
}

#[test]
fn test_invalid_input_partitions() {
    let case = TestCase::new(
        TaskKind::MapReduce,
        vec![input(&[("input_partitions", tagged("not partitions"))])],
        vec![tagged(Value::List(vec![]))],
    );
    let result = runner().run_local_suite(&case, &word_count_submission());
    assert!(matches!(
        result,
        Err(Error::Runner(RunnerError::InvalidArgument { .. }))
    ));
}

#[test]
fn test_function_entry_rejected_for_map_reduce_task() -> anyhow::Result<()> {
    let case = word_count_case(&["a"], 2)?;
    let result = runner().run_local_suite(&case, &add_submission());
    assert!(matches!(
        result,
        Err(Error::Runner(RunnerError::EntryMismatch { .. }))
    ));
    Ok(())
}

// =============================================================================
// Partitioned tasks
// =============================================================================

fn double_values() -> Submission {
    Submission::function("double_values", &["records"], |args| {
        let records = args
            .get("records")
            .and_then(Value::as_collection)
            .ok_or_else(|| anyhow!("records is not a partitioned collection"))?;
        let partitions = records
            .partitions()
            .iter()
            .map(|partition| {
                partition
                    .iter()
                    .map(|record| match record.as_pair() {
                        Some((k, v)) => Value::pair(k.clone(), v.as_f64().unwrap_or_default() * 2.0),
                        None => record.clone(),
                    })
                    .collect()
            })
            .collect();
        Ok(Value::Collection(Dataset::from_partitions(partitions)))
    })
}

fn collection(partitions: Vec<Vec<(&str, f64)>>) -> Dataset {
    Dataset::from_partitions(
        partitions
            .into_iter()
            .map(|p| p.into_iter().map(|(k, v)| Value::pair(k, v)).collect())
            .collect(),
    )
}

#[test]
fn test_partitioned_collection_task() -> anyhow::Result<()> {
    let records = collection(vec![vec![("a", 1.0), ("b", 2.0)], vec![("c", 3.0)]]);
    let expected = collection(vec![vec![("c", 6.0)], vec![("b", 4.0), ("a", 2.0000001)]]);
    let case = TestCase::new(
        TaskKind::PartitionedCollection,
        vec![input(&[("records", tagged(records))])],
        vec![tagged(expected)],
    );
    assert!(runner().run_local_suite(&case, &double_values())?);
    Ok(())
}

#[test]
fn test_partitioned_collection_partition_count_must_match() -> anyhow::Result<()> {
    let records = collection(vec![vec![("a", 1.0)], vec![("b", 2.0)]]);
    let expected = collection(vec![vec![("a", 2.0)], vec![("b", 4.0)], vec![]]);
    let case = TestCase::new(
        TaskKind::PartitionedCollection,
        vec![input(&[("records", tagged(records))])],
        vec![tagged(expected)],
    );
    assert!(!runner().run_local_suite(&case, &double_values())?);
    Ok(())
}

#[test]
fn test_partitioned_table_task() -> anyhow::Result<()> {
    let adults = Submission::function("adults", &["people"], |args| {
        let people = args
            .get("people")
            .and_then(Value::as_frame)
            .ok_or_else(|| anyhow!("people is not a partitioned table"))?;
        let age = people
            .columns()
            .iter()
            .position(|c| c == "age")
            .ok_or_else(|| anyhow!("no age column"))?;
        let partitions = people
            .partitions()
            .iter()
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.get(age).and_then(Value::as_i64).unwrap_or(0) >= 18)
                    .cloned()
                    .collect()
            })
            .collect();
        Ok(Value::Frame(DataFrame::from_partitions(
            people.columns().to_vec(),
            partitions,
        )))
    });

    let columns = vec!["name".to_string(), "age".to_string()];
    let people = DataFrame::from_partitions(
        columns.clone(),
        vec![
            vec![vec![Value::from("ann"), Value::Int(31)]],
            vec![vec![Value::from("bob"), Value::Int(12)], vec![Value::from("cy"), Value::Int(18)]],
        ],
    );
    let expected = DataFrame::from_partitions(
        columns,
        vec![
            vec![vec![Value::from("cy"), Value::Int(18)]],
            vec![vec![Value::from("ann"), Value::Int(31)]],
        ],
    );
    let case = TestCase::new(
        TaskKind::PartitionedTable,
        vec![input(&[("people", tagged(people))])],
        vec![tagged(expected)],
    );
    assert!(runner().run_local_suite(&case, &adults)?);
    Ok(())
}

#[test]
fn test_partitioned_table_partition_count_must_match() -> anyhow::Result<()> {
    let columns = vec!["name".to_string()];
    let people = DataFrame::from_partitions(
        columns.clone(),
        vec![vec![vec![Value::from("ann")]], vec![vec![Value::from("bob")]]],
    );
    let merged = DataFrame::from_partitions(
        columns,
        vec![vec![vec![Value::from("ann")], vec![Value::from("bob")]]],
    );
    let identity = Submission::function("identity", &["people"], |args| {
        args.get("people")
            .cloned()
            .ok_or_else(|| anyhow!("missing people"))
    });
    let case = TestCase::new(
        TaskKind::PartitionedTable,
        vec![input(&[("people", tagged(people))])],
        vec![tagged(merged)],
    );
    assert!(!runner().run_local_suite(&case, &identity)?);
    Ok(())
}

#[test]
fn test_partitioned_inputs_need_a_context() {
    let records = collection(vec![vec![("a", 1.0)]]);
    let case = TestCase::new(
        TaskKind::PartitionedCollection,
        vec![input(&[("records", tagged(records.clone()))])],
        vec![tagged(records)],
    );
    let runner = runner().with_codec(ValueCodec::new());
    let result = runner.run_local_suite(&case, &double_values());
    assert!(matches!(
        result,
        Err(Error::Decode(DecodeError::ContextUnavailable(_)))
    ));
}

// =============================================================================
// SQL_QUERY tasks
// =============================================================================

#[cfg(feature = "sqlite")]
fn people_table() -> std::result::Result<Table, ShapeError> {
    Table::from_columns(vec![
        (
            "name".to_string(),
            vec![Value::from("ann"), Value::from("bob"), Value::from("cy")],
        ),
        ("age".to_string(), vec![Value::Int(31), Value::Int(12), Value::Int(18)]),
    ])
}

#[cfg(feature = "sqlite")]
#[test]
fn test_sql_query_task() -> anyhow::Result<()> {
    let query = Submission::query("adults", || {
        "SELECT age, name FROM people WHERE age >= 18 ORDER BY age DESC".to_string()
    });
    let expected = Table::from_columns(vec![
        ("name".to_string(), vec![Value::from("cy"), Value::from("ann")]),
        ("age".to_string(), vec![Value::Int(18), Value::Int(31)]),
    ])?;
    let case = TestCase::new(
        TaskKind::SqlQuery,
        vec![input(&[("people", tagged(people_table()?))])],
        vec![tagged(expected)],
    );
    assert!(runner().run_local_suite(&case, &query)?);
    Ok(())
}

#[cfg(feature = "sqlite")]
#[test]
fn test_sql_query_wrong_result() -> anyhow::Result<()> {
    let query = Submission::query("adults", || "SELECT name, age FROM people".to_string());
    let expected = Table::from_columns(vec![
        ("name".to_string(), vec![Value::from("ann")]),
        ("age".to_string(), vec![Value::Int(31)]),
    ])?;
    let case = TestCase::new(
        TaskKind::SqlQuery,
        vec![input(&[("people", tagged(people_table()?))])],
        vec![tagged(expected)],
    );
    assert!(!runner().run_local_suite(&case, &query)?);
    Ok(())
}

#[cfg(feature = "sqlite")]
#[test]
fn test_sql_inputs_must_be_tables() {
    let query = Submission::query("q", || "SELECT 1".to_string());
    let case = TestCase::new(
        TaskKind::SqlQuery,
        vec![input(&[("n", tagged(3))])],
        vec![tagged(1)],
    );
    let result = runner().run_local_suite(&case, &query);
    assert!(result.is_err_and(|e| e.is_query()));
}

// =============================================================================
// Full flow: bundle on disk, local suite, remote test
// =============================================================================

fn add_bundle(expected: i64) -> TestBundle {
    let mut bundle = TestBundle::new();
    bundle.insert("add", add_case(1, 2, expected));
    bundle
}

fn add_server(expected: i64) -> MemoryServer {
    MemoryServer::new().with_case(
        "add",
        TaskKind::Standard,
        input(&[("a", tagged(5)), ("b", tagged(7))]),
        tagged(expected),
    )
}

#[test]
fn test_submission_passes_local_and_remote() -> anyhow::Result<()> {
    let (_dir, path) = write_bundle(&add_bundle(3))?;
    let runner = TestRunner::new(config_for(path));
    let bundle = runner.load_bundle()?;
    let server = add_server(12);

    let verdict = runner.test_submission(&bundle, &server, &add_submission())?;
    assert_eq!(verdict, Verdict::Passed);

    let answers = server.answers();
    assert_eq!(answers.len(), 1);
    let (function, request_id, answer) = answers.first().ok_or_else(|| anyhow!("no answer"))?;
    assert_eq!(function, "add");
    assert_eq!(request_id, "req-1");
    assert_eq!(TaggedValue::from_json_str(answer)?, tagged(12));
    Ok(())
}

#[test]
fn test_local_failure_never_contacts_server() -> anyhow::Result<()> {
    let server = add_server(12);
    let verdict = runner().test_submission(&add_bundle(4), &server, &add_submission())?;
    assert_eq!(verdict, Verdict::LocalFailed);
    assert_eq!(server.input_requests(), 0);
    assert!(server.answers().is_empty());
    Ok(())
}

#[test]
fn test_remote_rejection() -> anyhow::Result<()> {
    let server = add_server(13);
    let verdict = runner().test_submission(&add_bundle(3), &server, &add_submission())?;
    assert_eq!(verdict, Verdict::RemoteFailed);
    assert_eq!(server.answers().len(), 1);
    Ok(())
}

#[test]
fn test_server_error_reply_aborts() {
    let server = MemoryServer::new().with_error("add", "unknown student");
    let result = runner().test_submission(&add_bundle(3), &server, &add_submission());
    assert!(matches!(
        result,
        Err(Error::Remote(RemoteProtocolError::Server(ref message))) if message == "unknown student"
    ));
}

#[test]
fn test_unknown_function() {
    let result = runner().test_submission(&TestBundle::new(), &add_server(12), &add_submission());
    assert!(matches!(
        result,
        Err(Error::Runner(RunnerError::UnknownFunction(ref name))) if name == "add"
    ));
}

#[test]
fn test_remote_input_missing_declared_param() {
    let server = MemoryServer::new().with_case(
        "add",
        TaskKind::Standard,
        input(&[("a", tagged(5))]),
        tagged(5),
    );
    let result = runner().run_remote_test(&server, &add_submission());
    assert!(matches!(
        result,
        Err(Error::Runner(RunnerError::MissingArgument { .. }))
    ));
}

#[test]
fn test_map_reduce_remote_flow() -> anyhow::Result<()> {
    let mut bundle = TestBundle::new();
    bundle.insert("count_words", word_count_case(&["x y", "y"], 2)?);

    let hidden = word_count_case(&["to be or not to be"], 3)?;
    let (hidden_input, hidden_output) = hidden
        .pairs()
        .next()
        .map(|(i, o)| (i.clone(), o.clone()))
        .ok_or_else(|| anyhow!("empty hidden case"))?;
    let server = MemoryServer::new().with_case(
        "count_words",
        TaskKind::MapReduce,
        hidden_input,
        hidden_output,
    );

    let verdict = runner().test_submission(&bundle, &server, &word_count_submission())?;
    assert!(verdict.is_passed());
    Ok(())
}
