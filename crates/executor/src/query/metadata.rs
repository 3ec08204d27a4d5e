//! Trailing query metadata.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use cbbridge_core::QueryStatus;

/// Metadata delivered after the last row of a successful query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    /// Server-assigned request id
    pub request_id: String,
    /// Context id sent with the query
    pub client_context_id: String,
    /// Final query status
    pub status: QueryStatus,
    /// Result signature, when the service reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<JsonValue>,
    /// Present when a profile mode other than `off` was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<JsonValue>,
    /// Present when metrics were requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<QueryMetrics>,
    /// Non-fatal warnings
    #[serde(default)]
    pub warnings: Vec<QueryWarning>,
}

impl QueryMetadata {
    /// Metadata with the identifying fields set and everything else empty.
    pub fn new(
        request_id: impl Into<String>,
        client_context_id: impl Into<String>,
        status: QueryStatus,
    ) -> Self {
        QueryMetadata {
            request_id: request_id.into(),
            client_context_id: client_context_id.into(),
            status,
            signature: None,
            profile: None,
            metrics: None,
            warnings: Vec::new(),
        }
    }

    /// Attach execution metrics.
    pub fn with_metrics(mut self, metrics: QueryMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Append a warning.
    pub fn with_warning(mut self, code: u64, message: impl Into<String>) -> Self {
        self.warnings.push(QueryWarning {
            code,
            message: message.into(),
        });
        self
    }
}

/// Execution metrics reported by the query service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMetrics {
    /// Total time from request receipt to response
    pub elapsed_time: Duration,
    /// Time spent executing the query
    pub execution_time: Duration,
    /// Rows returned
    pub result_count: u64,
    /// Bytes returned
    pub result_size: u64,
    /// Documents mutated
    pub mutation_count: u64,
    /// Rows sorted
    pub sort_count: u64,
    /// Errors reported
    pub error_count: u64,
    /// Warnings reported
    pub warning_count: u64,
}

/// Non-fatal warning reported alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWarning {
    /// Service warning code
    pub code: u64,
    /// Human-readable message
    pub message: String,
}
