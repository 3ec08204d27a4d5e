//! The engine seam.
//!
//! A [`Connection`] is the opaque capability granting access to the cluster
//! engine. This crate never constructs or tears one down; it only submits
//! requests through it. Submission never fails synchronously: an engine that
//! cannot accept a request reports that through the completion or the sink
//! it was handed, the same way it reports any other failure.
//!
//! Implementations are shared across caller threads and must provide their
//! own internal synchronization.

use std::time::Duration;

use crate::command::ManagementCommand;
use crate::completion::Completion;
use crate::output::ManagementOutput;
use crate::query::{QueryRequest, RowSink};

/// Engine-native form of a management operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagementRequest {
    /// Validated, typed command
    pub command: ManagementCommand,
    /// Time the engine may spend before failing with a timeout
    pub timeout: Duration,
    /// Identifier echoed in engine logs and errors
    pub client_context_id: String,
}

/// Access to the cluster engine.
pub trait Connection: Send + Sync {
    /// Submit a management operation.
    ///
    /// The engine resolves `completion` once, from its own execution
    /// context, when the operation succeeds, fails or times out.
    fn submit_management(&self, request: ManagementRequest, completion: Completion<ManagementOutput>);

    /// Submit a query.
    ///
    /// The engine pushes rows into `sink` in production order and ends the
    /// stream with either metadata or an error. It should stop producing
    /// once the sink reports the consumer closed the stream.
    fn submit_query(&self, request: QueryRequest, sink: RowSink);
}
