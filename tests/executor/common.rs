//! Common test utilities for executor tests
//!
//! `ScriptedConnection` stands in for the cluster engine. It replies from
//! its own worker threads, like a real engine's I/O context, and records
//! every request it receives.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use cbbridge::{
    AnalyticsDataset, AnalyticsIndex, Callbacks, ClientConfig, Completion, Connection, EngineError,
    Error, Executor, ManagementOperation, ManagementOutput, ManagementRequest, QueryMetadata,
    QueryRequest, QueryStatus, Row, RowSink,
};

/// How the engine answers a management request.
#[allow(dead_code)]
pub enum Reply {
    Output(ManagementOutput),
    Fail(EngineError),
    /// Release the completion without answering
    Drop,
}

/// How the engine answers a query.
#[allow(dead_code)]
pub enum Ending {
    Metadata(QueryMetadata),
    Fail(EngineError),
    /// Release the sink without a terminal event
    Vanish,
}

/// Rows to produce, then how to end.
pub struct QueryScript {
    pub rows: Vec<Row>,
    pub ending: Ending,
}

type ManagementFn = dyn Fn(&ManagementRequest) -> Reply + Send + Sync;
type QueryFn = dyn Fn(&QueryRequest) -> QueryScript + Send + Sync;

/// Fake engine.
pub struct ScriptedConnection {
    management: Box<ManagementFn>,
    query: Box<QueryFn>,
    pub management_requests: Mutex<Vec<ManagementRequest>>,
    pub query_requests: Mutex<Vec<QueryRequest>>,
    /// Rows each finished query pushed before ending or being cancelled
    pub rows_sent: Arc<Mutex<Vec<usize>>>,
    /// Queries whose producer observed the consumer closing the stream
    pub cancelled: Arc<AtomicUsize>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ScriptedConnection {
    /// Engine that answers every operation with a well-formed empty output
    /// and every query with no rows.
    pub fn new() -> Self {
        ScriptedConnection {
            management: Box::new(|request: &ManagementRequest| {
                Reply::Output(default_output(request.command.operation()))
            }),
            query: Box::new(|request: &QueryRequest| QueryScript {
                rows: vec![],
                ending: Ending::Metadata(success_metadata(&request.client_context_id)),
            }),
            management_requests: Mutex::new(Vec::new()),
            query_requests: Mutex::new(Vec::new()),
            rows_sent: Arc::new(Mutex::new(Vec::new())),
            cancelled: Arc::new(AtomicUsize::new(0)),
            workers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_management(
        mut self,
        script: impl Fn(&ManagementRequest) -> Reply + Send + Sync + 'static,
    ) -> Self {
        self.management = Box::new(script);
        self
    }

    pub fn with_query(
        mut self,
        script: impl Fn(&QueryRequest) -> QueryScript + Send + Sync + 'static,
    ) -> Self {
        self.query = Box::new(script);
        self
    }

    /// Wait for every reply the engine has started to finish.
    pub fn join_workers(&self) {
        loop {
            let batch: Vec<_> = self.workers.lock().drain(..).collect();
            if batch.is_empty() {
                return;
            }
            for worker in batch {
                worker.join().unwrap();
            }
        }
    }

    pub fn management_count(&self) -> usize {
        self.management_requests.lock().len()
    }

    pub fn query_count(&self) -> usize {
        self.query_requests.lock().len()
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Connection for ScriptedConnection {
    fn submit_management(&self, request: ManagementRequest, completion: Completion<ManagementOutput>) {
        let reply = (self.management)(&request);
        self.management_requests.lock().push(request);
        let worker = std::thread::spawn(move || match reply {
            Reply::Output(output) => completion.succeed(output),
            Reply::Fail(err) => completion.fail(err),
            Reply::Drop => drop(completion),
        });
        self.workers.lock().push(worker);
    }

    fn submit_query(&self, request: QueryRequest, sink: RowSink) {
        let script = (self.query)(&request);
        self.query_requests.lock().push(request);

        let rows_sent = self.rows_sent.clone();
        let cancelled = self.cancelled.clone();
        let worker = std::thread::spawn(move || {
            let mut sent = 0;
            for row in script.rows {
                if sink.blocking_send_row(row).is_err() {
                    cancelled.fetch_add(1, Ordering::SeqCst);
                    rows_sent.lock().push(sent);
                    return;
                }
                sent += 1;
            }
            rows_sent.lock().push(sent);
            match script.ending {
                Ending::Metadata(metadata) => sink.blocking_finish(metadata),
                Ending::Fail(err) => sink.blocking_fail(err),
                Ending::Vanish => drop(sink),
            }
        });
        self.workers.lock().push(worker);
    }
}

/// Output whose kind matches what `op` must produce.
pub fn default_output(op: ManagementOperation) -> ManagementOutput {
    match op {
        ManagementOperation::GetAllDatasets => ManagementOutput::Datasets(vec![AnalyticsDataset {
            dataset_name: "airports".into(),
            dataverse_name: "Default".into(),
            link_name: "Local".into(),
            bucket_name: "travel-sample".into(),
        }]),
        ManagementOperation::GetAllIndexes => ManagementOutput::Indexes(vec![AnalyticsIndex {
            name: "airports_primary".into(),
            dataset_name: "airports".into(),
            dataverse_name: "Default".into(),
            is_primary: true,
        }]),
        ManagementOperation::GetAllLinks => ManagementOutput::Links(vec![]),
        ManagementOperation::GetPendingMutations => {
            let mut per_dataset = BTreeMap::new();
            per_dataset.insert("airports".to_string(), 0u64);
            let mut by_dataverse = BTreeMap::new();
            by_dataverse.insert("Default".to_string(), per_dataset);
            ManagementOutput::PendingMutations(by_dataverse)
        }
        _ => ManagementOutput::Unit,
    }
}

pub fn success_metadata(client_context_id: &str) -> QueryMetadata {
    QueryMetadata::new("req-0001", client_context_id, QueryStatus::Success)
}

/// Numbered rows `{"n": 0}`, `{"n": 1}`, ...
pub fn numbered_rows(count: usize) -> Vec<Row> {
    (0..count).map(|n| serde_json::json!({ "n": n })).collect()
}

/// Config with a small row buffer so producers block quickly.
pub fn small_buffer_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.stream.row_buffer = 4;
    config
}

pub fn executor_with(connection: Arc<ScriptedConnection>) -> Executor {
    Executor::new(connection)
}

/// Callbacks that count invocations and keep the last outcome.
#[derive(Clone, Default)]
pub struct Recorder {
    pub successes: Arc<AtomicUsize>,
    pub errors: Arc<AtomicUsize>,
    pub last: Arc<Mutex<Option<Result<ManagementOutput, Error>>>>,
}

impl Recorder {
    pub fn callbacks(&self) -> Callbacks<ManagementOutput> {
        let (ok, ok_last) = (self.successes.clone(), self.last.clone());
        let (err, err_last) = (self.errors.clone(), self.last.clone());
        Callbacks::new(
            move |output| {
                ok.fetch_add(1, Ordering::SeqCst);
                *ok_last.lock() = Some(Ok(output));
            },
            move |e| {
                err.fetch_add(1, Ordering::SeqCst);
                *err_last.lock() = Some(Err(e));
            },
        )
    }

    pub fn successes(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    pub fn take_last(&self) -> Option<Result<ManagementOutput, Error>> {
        self.last.lock().take()
    }
}

/// Route `tracing` output through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
