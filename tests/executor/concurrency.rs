//! Concurrency Tests
//!
//! Many operations in flight on one shared executor: each resolves once,
//! with its own result.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use serde_json::json;

use crate::common::*;
use cbbridge::{
    AnalyticsLink, AzureBlobExternalLink, ManagementCommand, ManagementOperation,
    ManagementOutput, OperationDescriptor, QueryOptions,
};

/// Engine that answers GET_ALL_LINKS with one link named after the
/// requested dataverse, so a misrouted reply is detectable.
fn echoing_links() -> ScriptedConnection {
    ScriptedConnection::new().with_management(|request| match &request.command {
        ManagementCommand::GetAllLinks(args) => {
            let dataverse = args.dataverse_name.clone().unwrap_or_default();
            Reply::Output(ManagementOutput::Links(vec![AnalyticsLink::AzureBlobExternal(
                AzureBlobExternalLink {
                    dataverse: dataverse.clone(),
                    name: format!("link-{}", dataverse),
                    connection_string: Some("UseDevelopmentStorage=true".into()),
                    account_name: None,
                    account_key: None,
                    shared_access_signature: None,
                    blob_endpoint: None,
                    endpoint_suffix: None,
                },
            )]))
        }
        other => Reply::Output(default_output(other.operation())),
    })
}

#[test]
fn hundred_concurrent_dispatches_resolve_once_without_mixing() {
    let connection = Arc::new(echoing_links());
    let executor = executor_with(connection.clone());

    let handles: Vec<_> = (0..100)
        .map(|i| {
            let executor = executor.clone();
            thread::spawn(move || {
                let recorder = Recorder::default();
                let dataverse = format!("dv{}", i);
                executor
                    .dispatch(
                        OperationDescriptor::new(
                            ManagementOperation::GetAllLinks,
                            json!({ "dataverse_name": dataverse }),
                        ),
                        recorder.callbacks(),
                    )
                    .unwrap();
                (dataverse, recorder)
            })
        })
        .collect();

    let recorders: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    connection.join_workers();

    assert_eq!(connection.management_count(), 100);
    for (dataverse, recorder) in recorders {
        assert_eq!(recorder.successes(), 1, "{}", dataverse);
        assert_eq!(recorder.errors(), 0, "{}", dataverse);
        match recorder.take_last().unwrap().unwrap() {
            ManagementOutput::Links(links) => {
                assert_eq!(links.len(), 1);
                assert_eq!(links[0].dataverse(), dataverse);
            }
            other => panic!("Expected Links, got {:?}", other),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_futures_resolve_independently() {
    let connection = Arc::new(echoing_links());
    let executor = executor_with(connection.clone());

    let tasks: Vec<_> = (0..100)
        .map(|i| {
            let executor = executor.clone();
            tokio::spawn(async move {
                let dataverse = format!("dv{}", i);
                let output = executor
                    .submit(OperationDescriptor::new(
                        ManagementOperation::GetAllLinks,
                        json!({ "dataverse_name": dataverse }),
                    ))
                    .unwrap()
                    .await
                    .unwrap();
                (dataverse, output)
            })
        })
        .collect();

    for task in tasks {
        let (dataverse, output) = task.await.unwrap();
        match output {
            ManagementOutput::Links(links) => assert_eq!(links[0].name(), format!("link-{}", dataverse)),
            other => panic!("Expected Links, got {:?}", other),
        }
    }
}

#[test]
fn concurrent_streams_do_not_interleave() {
    let connection = Arc::new(ScriptedConnection::new().with_query(|request| QueryScript {
        rows: (0..200)
            .map(|n| json!({ "query": request.statement.clone(), "n": n }))
            .collect(),
        ending: Ending::Metadata(success_metadata(&request.client_context_id)),
    }));
    let executor = cbbridge::Executor::with_config(connection.clone(), small_buffer_config());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let executor = executor.clone();
            thread::spawn(move || {
                let statement = format!("SELECT {}", i);
                let mut result = executor
                    .execute_query(statement.clone(), QueryOptions::default())
                    .unwrap();
                let mut expected = 0;
                while let Some(row) = result.blocking_next_row() {
                    let row = row.unwrap();
                    assert_eq!(row["query"], json!(statement));
                    assert_eq!(row["n"], json!(expected));
                    expected += 1;
                }
                assert_eq!(expected, 200);
                result.client_context_id().to_string()
            })
        })
        .collect();

    let ids: HashSet<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    connection.join_workers();
    assert_eq!(ids.len(), 8);
}
