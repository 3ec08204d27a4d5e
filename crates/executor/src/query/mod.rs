//! Query execution.
//!
//! `execute_query` translates caller options into an engine-native
//! [`QueryRequest`], submits it together with the producer end of a bounded
//! row stream, and returns the consumer end immediately. Rows arrive as the
//! engine produces them.

mod metadata;
mod options;
mod stream;

pub use metadata::{QueryMetadata, QueryMetrics, QueryWarning};
pub use options::{QueryOptions, RawQueryOptions};
pub use stream::{Row, RowSink, StreamClosed, StreamedResult};

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value as JsonValue;
use tracing::debug;
use uuid::Uuid;

use cbbridge_core::{Error, MutationToken, ProfileMode, Result, ScanConsistency};

use self::options::dollar_prefixed;
use crate::config::ClientConfig;
use crate::connection::Connection;

/// Engine-native form of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Statement text
    pub statement: String,
    /// Correlates the query with its metadata and logs
    pub client_context_id: String,
    /// Resolved timeout
    pub timeout: Duration,
    /// `None` leaves the choice to the service
    pub scan_consistency: Option<ScanConsistency>,
    /// Causal positions the query must observe, in caller order
    pub mutation_state: Vec<MutationToken>,
    /// Profiling detail to collect
    pub profile: ProfileMode,
    /// Whether the statement is one-off (not prepared)
    pub adhoc: bool,
    /// Reject statements that mutate data
    pub read_only: bool,
    /// Collect execution metrics
    pub metrics: bool,
    /// Allow full-text indexes to serve the query
    pub flex_index: bool,
    /// Maximum index parallelism
    pub max_parallelism: Option<u32>,
    /// Maximum index scan buffer
    pub scan_cap: Option<u32>,
    /// Maximum time to wait for an index to catch up
    pub scan_wait: Option<Duration>,
    /// Items read per batch
    pub pipeline_batch: Option<u32>,
    /// Maximum items buffered per request
    pub pipeline_cap: Option<u32>,
    /// Scope the statement runs against
    pub query_context: Option<String>,
    /// `$1`, `$2`, ... parameter values
    pub positional_parameters: Vec<JsonValue>,
    /// Keys always carry the leading `$`
    pub named_parameters: BTreeMap<String, JsonValue>,
    /// Extra parameters passed through untouched
    pub raw: BTreeMap<String, JsonValue>,
}

impl QueryRequest {
    /// Build a request, filling unset options from `default_timeout` and a
    /// fresh client context id.
    pub fn new(statement: impl Into<String>, options: QueryOptions, default_timeout: Duration) -> Self {
        QueryRequest {
            statement: statement.into(),
            client_context_id: options
                .client_context_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            timeout: options.timeout.unwrap_or(default_timeout),
            scan_consistency: options.scan_consistency,
            mutation_state: options.consistent_with.into_tokens(),
            profile: options.profile.unwrap_or_default(),
            adhoc: options.adhoc,
            read_only: options.read_only,
            metrics: options.metrics,
            flex_index: options.flex_index,
            max_parallelism: options.max_parallelism,
            scan_cap: options.scan_cap,
            scan_wait: options.scan_wait,
            pipeline_batch: options.pipeline_batch,
            pipeline_cap: options.pipeline_cap,
            query_context: options.query_context,
            positional_parameters: options.positional_parameters,
            named_parameters: options
                .named_parameters
                .into_iter()
                .map(|(k, v)| (dollar_prefixed(k), v))
                .collect(),
            raw: options.raw,
        }
    }
}

/// Submit a query and return its row stream.
///
/// # Errors
///
/// Returns [`Error::InvalidArguments`] for an empty statement, without
/// contacting the engine. Engine failures arrive through the stream.
pub fn execute_query(
    connection: &dyn Connection,
    statement: impl Into<String>,
    options: QueryOptions,
    config: &ClientConfig,
) -> Result<StreamedResult> {
    let statement = statement.into();
    if statement.trim().is_empty() {
        return Err(Error::InvalidArguments {
            operation: "QUERY".to_string(),
            reason: "statement must not be empty".to_string(),
        });
    }

    let request = QueryRequest::new(statement, options, config.query_timeout());
    let (sink, result) =
        StreamedResult::channel(request.client_context_id.clone(), config.stream.row_buffer);

    debug!(
        target: "cbbridge::query",
        client_context_id = %request.client_context_id,
        timeout_ms = request.timeout.as_millis() as u64,
        scan_consistency = ?request.scan_consistency,
        tokens = request.mutation_state.len(),
        "submitting query"
    );
    connection.submit_query(request, sink);
    Ok(result)
}
