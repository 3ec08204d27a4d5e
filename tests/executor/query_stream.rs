//! Query Stream Tests
//!
//! Rows arrive in production order, followed by metadata or a single error.
//! Closing the stream stops the producer.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::common::*;
use cbbridge::{
    EngineError, EngineErrorKind, Error, MutationState, MutationToken, ProfileMode, QueryMetrics,
    QueryOptions, RawQueryOptions, ScanConsistency,
};

fn streaming(rows: usize) -> ScriptedConnection {
    ScriptedConnection::new().with_query(move |request| QueryScript {
        rows: numbered_rows(rows),
        ending: Ending::Metadata(success_metadata(&request.client_context_id)),
    })
}

// ============================================================================
// Ordering and metadata
// ============================================================================

#[test]
fn rows_arrive_in_order_then_metadata() {
    init_tracing();
    let connection = Arc::new(streaming(100));
    let executor = cbbridge::Executor::with_config(connection.clone(), small_buffer_config());

    let mut result = executor
        .execute_query("SELECT * FROM airports", QueryOptions::default())
        .unwrap();

    let mut seen = Vec::new();
    while let Some(row) = result.blocking_next_row() {
        seen.push(row.unwrap());
    }
    connection.join_workers();

    assert_eq!(seen, numbered_rows(100));
    assert_eq!(result.rows_delivered(), 100);
    let metadata = result.metadata().unwrap();
    assert_eq!(metadata.client_context_id, result.client_context_id());
    assert!(result.blocking_next_row().is_none());
}

#[test]
fn empty_result_still_has_metadata() {
    let connection = Arc::new(ScriptedConnection::new());
    let executor = executor_with(connection.clone());

    let mut result = executor
        .execute_query("SELECT 1 WHERE false", QueryOptions::default())
        .unwrap();

    assert!(result.blocking_next_row().is_none());
    assert!(result.metadata().is_some());
    assert_eq!(result.rows_delivered(), 0);
}

#[test]
fn metadata_carries_metrics() {
    let connection = Arc::new(ScriptedConnection::new().with_query(|request| QueryScript {
        rows: numbered_rows(2),
        ending: Ending::Metadata(
            success_metadata(&request.client_context_id)
                .with_metrics(QueryMetrics {
                    elapsed_time: Duration::from_millis(12),
                    result_count: 2,
                    ..QueryMetrics::default()
                })
                .with_warning(5003, "index not used"),
        ),
    }));
    let executor = executor_with(connection.clone());

    let mut result = executor
        .execute_query("SELECT * FROM airports", QueryOptions::new().metrics(true))
        .unwrap();
    assert_eq!(result.blocking_rows().unwrap().len(), 2);

    let metadata = result.metadata().unwrap();
    assert_eq!(metadata.metrics.as_ref().unwrap().result_count, 2);
    assert_eq!(metadata.warnings[0].code, 5003);
    assert!(connection.query_requests.lock()[0].metrics);
}

#[tokio::test]
async fn async_consumer_sees_every_row() {
    let connection = Arc::new(streaming(50));
    let executor = cbbridge::Executor::with_config(connection.clone(), small_buffer_config());

    let mut result = executor
        .execute_query("SELECT * FROM airports", QueryOptions::default())
        .unwrap();

    let rows = result.rows().await.unwrap();
    assert_eq!(rows, numbered_rows(50));
    assert!(result.metadata().is_some());
    assert!(matches!(result.rows().await, Err(Error::AlreadyQueried)));
}

// ============================================================================
// Failure
// ============================================================================

#[test]
fn failure_after_rows_yields_rows_then_one_error() {
    let connection = Arc::new(ScriptedConnection::new().with_query(|_| QueryScript {
        rows: numbered_rows(3),
        ending: Ending::Fail(EngineError::timeout("query exceeded 75000ms")),
    }));
    let executor = executor_with(connection.clone());

    let mut result = executor
        .execute_query("SELECT * FROM airports", QueryOptions::default())
        .unwrap();

    for n in 0..3 {
        assert_eq!(result.blocking_next_row().unwrap().unwrap(), json!({ "n": n }));
    }
    let err = result.blocking_next_row().unwrap().unwrap_err();
    assert_eq!(err.engine_kind(), Some(EngineErrorKind::Timeout));
    assert!(result.blocking_next_row().is_none());
    assert!(result.metadata().is_none());
}

#[test]
fn producer_vanishing_is_dropped_error() {
    let connection = Arc::new(ScriptedConnection::new().with_query(|_| QueryScript {
        rows: numbered_rows(1),
        ending: Ending::Vanish,
    }));
    let executor = executor_with(connection.clone());

    let mut result = executor
        .execute_query("SELECT * FROM airports", QueryOptions::default())
        .unwrap();

    assert!(result.blocking_next_row().unwrap().is_ok());
    let err = result.blocking_next_row().unwrap().unwrap_err();
    assert_eq!(err.engine_kind(), Some(EngineErrorKind::Dropped));
    assert!(result.metadata().is_none());
}

#[test]
fn collecting_after_failure_is_already_queried() {
    let connection = Arc::new(ScriptedConnection::new().with_query(|_| QueryScript {
        rows: vec![],
        ending: Ending::Fail(EngineError::new(EngineErrorKind::Server, "syntax error")),
    }));
    let executor = executor_with(connection.clone());

    let mut result = executor
        .execute_query("SELEKT 1", QueryOptions::default())
        .unwrap();

    assert!(matches!(result.blocking_rows(), Err(Error::Engine(_))));
    assert!(matches!(result.blocking_rows(), Err(Error::AlreadyQueried)));
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn close_after_some_rows_stops_producer() {
    let connection = Arc::new(streaming(1000));
    let executor = cbbridge::Executor::with_config(connection.clone(), small_buffer_config());

    let mut result = executor
        .execute_query("SELECT * FROM airports", QueryOptions::default())
        .unwrap();

    for _ in 0..5 {
        assert!(result.blocking_next_row().unwrap().is_ok());
    }
    result.close();

    assert!(result.blocking_next_row().is_none());
    assert!(result.metadata().is_none());
    assert!(result.is_closed());

    connection.join_workers();
    assert_eq!(connection.cancelled_count(), 1);
    let sent = connection.rows_sent.lock()[0];
    assert!(sent < 1000, "producer kept going after close: {}", sent);
}

#[test]
fn dropping_result_stops_producer() {
    let connection = Arc::new(streaming(1000));
    let executor = cbbridge::Executor::with_config(connection.clone(), small_buffer_config());

    let result = executor
        .execute_query("SELECT * FROM airports", QueryOptions::default())
        .unwrap();
    drop(result);

    connection.join_workers();
    assert_eq!(connection.cancelled_count(), 1);
}

// ============================================================================
// Options reach the engine
// ============================================================================

#[test]
fn consistency_and_tokens_are_forwarded_in_order() {
    let connection = Arc::new(ScriptedConnection::new());
    let executor = executor_with(connection.clone());

    let options = QueryOptions::try_from(RawQueryOptions {
        scan_consistency: Some("request_plus".into()),
        profile: Some("phases".into()),
        consistent_with: vec![
            json!({ "partition_id": 12, "partition_uuid": 111, "sequence_number": 5, "bucket_name": "travel" }),
            json!({ "partition_id": 7, "partition_uuid": 222, "sequence_number": 9, "bucket_name": "travel" }),
        ],
        timeout_ms: Some(2500),
        ..RawQueryOptions::default()
    })
    .unwrap();

    let mut result = executor.execute_query("SELECT 1", options).unwrap();
    assert!(result.blocking_rows().unwrap().is_empty());

    let requests = connection.query_requests.lock();
    let request = &requests[0];
    assert_eq!(request.scan_consistency, Some(ScanConsistency::RequestPlus));
    assert_eq!(request.profile, ProfileMode::Phases);
    assert_eq!(request.timeout, Duration::from_millis(2500));
    assert_eq!(
        request.mutation_state,
        vec![
            MutationToken::new(12, 111, 5, "travel"),
            MutationToken::new(7, 222, 9, "travel"),
        ]
    );
}

#[test]
fn not_bounded_with_mutation_state_is_forwarded() {
    let connection = Arc::new(ScriptedConnection::new());
    let executor = executor_with(connection.clone());

    let state = MutationState::from(vec![MutationToken::new(1, 2, 3, "travel")]);
    let options = QueryOptions::new()
        .scan_consistency(ScanConsistency::NotBounded)
        .consistent_with(state);

    executor.execute_query("SELECT 1", options).unwrap();

    let requests = connection.query_requests.lock();
    assert_eq!(requests[0].scan_consistency, Some(ScanConsistency::NotBounded));
    assert_eq!(requests[0].mutation_state.len(), 1);
}

#[test]
fn default_query_timeout_comes_from_config() {
    let connection = Arc::new(ScriptedConnection::new());
    let mut config = cbbridge::ClientConfig::default();
    config.query_timeout_ms = 1234;
    let executor = cbbridge::Executor::with_config(connection.clone(), config);

    executor.execute_query("SELECT 1", QueryOptions::default()).unwrap();

    assert_eq!(
        connection.query_requests.lock()[0].timeout,
        Duration::from_millis(1234)
    );
}

#[test]
fn unvalidated_oversized_buffer_still_streams() {
    let connection = Arc::new(streaming(3));
    let mut config = cbbridge::ClientConfig::default();
    config.stream.row_buffer = usize::MAX >> 1;
    let executor = cbbridge::Executor::with_config(connection.clone(), config);

    let mut result = executor
        .execute_query("SELECT * FROM airports", QueryOptions::default())
        .unwrap();

    assert_eq!(result.blocking_rows().unwrap(), numbered_rows(3));
    connection.join_workers();
}

// ============================================================================
// Synchronous rejection
// ============================================================================

#[test]
fn invalid_consistency_names_the_value() {
    let err = QueryOptions::try_from(RawQueryOptions {
        scan_consistency: Some("eventual".into()),
        ..RawQueryOptions::default()
    })
    .unwrap_err();

    assert!(err.to_string().contains("eventual"));
    assert!(err.is_validation());
}

#[test]
fn malformed_token_means_no_submission() {
    let connection = Arc::new(ScriptedConnection::new());
    let executor = executor_with(connection.clone());

    let outcome = QueryOptions::try_from(RawQueryOptions {
        consistent_with: vec![
            json!({ "partition_id": 1, "partition_uuid": 1, "sequence_number": 1, "bucket_name": "b" }),
            json!({ "partition_id": 2, "partition_uuid": 2, "bucket_name": "b" }),
        ],
        ..RawQueryOptions::default()
    })
    .and_then(|options| executor.execute_query("SELECT 1", options));

    match outcome {
        Err(Error::MalformedMutationToken { index, reason }) => {
            assert_eq!(index, 1);
            assert!(reason.contains("sequence_number"));
        }
        Err(other) => panic!("Expected MalformedMutationToken, got {:?}", other),
        Ok(_) => panic!("Expected MalformedMutationToken, got a stream"),
    }
    assert_eq!(connection.query_count(), 0);
}

#[test]
fn empty_statement_means_no_submission() {
    let connection = Arc::new(ScriptedConnection::new());
    let executor = executor_with(connection.clone());

    let result = executor.execute_query("   ", QueryOptions::default());

    assert!(matches!(result, Err(Error::InvalidArguments { .. })));
    assert_eq!(connection.query_count(), 0);
}
