//! Streamed query results.
//!
//! The engine holds a [`RowSink`] and the caller holds a [`StreamedResult`];
//! the two ends share a bounded channel, so a slow consumer applies
//! backpressure to the producer. The channel carries rows in production
//! order followed by exactly one terminal event.
//!
//! ## State machine
//!
//! ```text
//!            rows
//!          ┌──────┐
//!          ▼      │
//!      Streaming ─┘
//!       │   │   │
//!  meta │   │   │ close() / drop
//!       ▼   │   ▼
//!     Done  │  Closed
//!           │ error / producer vanished
//!           ▼
//!         Failed
//! ```
//!
//! Every state other than `Streaming` is terminal: `next_row` yields `None`
//! and `rows` fails with `AlreadyQueried`.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use cbbridge_core::{EngineError, Error, Result};

use crate::config::MAX_ROW_BUFFER;

use super::metadata::QueryMetadata;

/// One result row, as produced by the query service.
pub type Row = serde_json::Value;

#[derive(Debug)]
enum StreamEvent {
    Row(Row),
    Metadata(QueryMetadata),
    Failed(EngineError),
}

/// Returned to the producer once the consumer has closed the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("row stream closed by consumer")]
pub struct StreamClosed;

/// Producer end of a row stream, held by the engine.
///
/// The terminal calls take `self`, so a stream ends at most once. A sink
/// dropped without a terminal call surfaces to the consumer as an engine
/// failure of kind `dropped`.
#[derive(Debug)]
pub struct RowSink {
    tx: mpsc::Sender<StreamEvent>,
    client_context_id: String,
}

impl RowSink {
    /// Push a row, waiting while the buffer is full.
    pub async fn send_row(&self, row: Row) -> std::result::Result<(), StreamClosed> {
        self.tx.send(StreamEvent::Row(row)).await.map_err(|_| StreamClosed)
    }

    /// Push a row from a non-async thread, blocking while the buffer is full.
    ///
    /// Must not be called from within an async runtime.
    pub fn blocking_send_row(&self, row: Row) -> std::result::Result<(), StreamClosed> {
        self.tx
            .blocking_send(StreamEvent::Row(row))
            .map_err(|_| StreamClosed)
    }

    /// End the stream successfully.
    pub async fn finish(self, metadata: QueryMetadata) {
        let _ = self.tx.send(StreamEvent::Metadata(metadata)).await;
    }

    /// Blocking form of [`finish`](Self::finish).
    pub fn blocking_finish(self, metadata: QueryMetadata) {
        let _ = self.tx.blocking_send(StreamEvent::Metadata(metadata));
    }

    /// End the stream with an engine failure.
    pub async fn fail(self, err: EngineError) {
        let _ = self.tx.send(StreamEvent::Failed(err)).await;
    }

    /// Blocking form of [`fail`](Self::fail).
    pub fn blocking_fail(self, err: EngineError) {
        let _ = self.tx.blocking_send(StreamEvent::Failed(err));
    }

    /// Whether the consumer has closed the stream.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Wait until the consumer closes the stream.
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    /// Context id of the query this sink belongs to.
    pub fn client_context_id(&self) -> &str {
        &self.client_context_id
    }
}

#[derive(Debug)]
enum StreamState {
    Streaming,
    Done(QueryMetadata),
    Failed,
    Closed,
}

/// Consumer end of a row stream.
///
/// Rows are yielded in the order the engine produced them. Metadata becomes
/// available only after the last row has been consumed. Dropping the handle
/// closes the stream.
#[derive(Debug)]
pub struct StreamedResult {
    rx: mpsc::Receiver<StreamEvent>,
    state: StreamState,
    rows_delivered: u64,
    client_context_id: String,
}

impl StreamedResult {
    /// Create both ends of a stream holding at most `buffer` undelivered rows.
    ///
    /// `buffer` is clamped to `1..=MAX_ROW_BUFFER`.
    pub(crate) fn channel(client_context_id: String, buffer: usize) -> (RowSink, StreamedResult) {
        let (tx, rx) = mpsc::channel(buffer.clamp(1, MAX_ROW_BUFFER));
        let sink = RowSink {
            tx,
            client_context_id: client_context_id.clone(),
        };
        let result = StreamedResult {
            rx,
            state: StreamState::Streaming,
            rows_delivered: 0,
            client_context_id,
        };
        (sink, result)
    }

    /// Next row, or `None` once the stream has ended.
    ///
    /// A failure is yielded once as `Some(Err(_))`; later calls return `None`.
    pub async fn next_row(&mut self) -> Option<Result<Row>> {
        if !self.is_streaming() {
            return None;
        }
        let event = self.rx.recv().await;
        self.advance(event)
    }

    /// Blocking form of [`next_row`](Self::next_row).
    ///
    /// Must not be called from within an async runtime.
    pub fn blocking_next_row(&mut self) -> Option<Result<Row>> {
        if !self.is_streaming() {
            return None;
        }
        let event = self.rx.blocking_recv();
        self.advance(event)
    }

    fn advance(&mut self, event: Option<StreamEvent>) -> Option<Result<Row>> {
        match event {
            Some(StreamEvent::Row(row)) => {
                self.rows_delivered += 1;
                Some(Ok(row))
            }
            Some(StreamEvent::Metadata(metadata)) => {
                debug!(
                    target: "cbbridge::query",
                    client_context_id = %self.client_context_id,
                    rows = self.rows_delivered,
                    status = %metadata.status,
                    "query stream completed"
                );
                self.rx.close();
                self.state = StreamState::Done(metadata);
                None
            }
            Some(StreamEvent::Failed(err)) => {
                warn!(
                    target: "cbbridge::query",
                    client_context_id = %self.client_context_id,
                    rows = self.rows_delivered,
                    error = %err,
                    "query stream failed"
                );
                self.rx.close();
                self.state = StreamState::Failed;
                Some(Err(Error::Engine(err)))
            }
            None => {
                warn!(
                    target: "cbbridge::query",
                    client_context_id = %self.client_context_id,
                    rows = self.rows_delivered,
                    "query stream ended without metadata"
                );
                self.state = StreamState::Failed;
                Some(Err(Error::Engine(EngineError::dropped(
                    "row stream ended without metadata",
                ))))
            }
        }
    }

    /// Collect every remaining row.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyQueried`] if the stream has already ended
    /// - the stream's failure, if it fails while collecting
    pub async fn rows(&mut self) -> Result<Vec<Row>> {
        if !self.is_streaming() {
            return Err(Error::AlreadyQueried);
        }
        let mut rows = Vec::new();
        while let Some(row) = self.next_row().await {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// Blocking form of [`rows`](Self::rows).
    pub fn blocking_rows(&mut self) -> Result<Vec<Row>> {
        if !self.is_streaming() {
            return Err(Error::AlreadyQueried);
        }
        let mut rows = Vec::new();
        while let Some(row) = self.blocking_next_row() {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// Trailing metadata, once every row has been consumed.
    pub fn metadata(&self) -> Option<&QueryMetadata> {
        match &self.state {
            StreamState::Done(metadata) => Some(metadata),
            _ => None,
        }
    }

    /// Stop consuming. The producer is told to stop; rows still in flight
    /// are discarded and no further events are delivered.
    pub fn close(&mut self) {
        if self.is_streaming() {
            debug!(
                target: "cbbridge::query",
                client_context_id = %self.client_context_id,
                rows = self.rows_delivered,
                "query stream closed by caller"
            );
            self.rx.close();
            self.state = StreamState::Closed;
        }
    }

    /// Whether more events may still arrive.
    pub fn is_streaming(&self) -> bool {
        matches!(self.state, StreamState::Streaming)
    }

    /// Whether the stream ended by caller request.
    pub fn is_closed(&self) -> bool {
        matches!(self.state, StreamState::Closed)
    }

    /// Number of rows yielded so far.
    pub fn rows_delivered(&self) -> u64 {
        self.rows_delivered
    }

    /// Context id of the query.
    pub fn client_context_id(&self) -> &str {
        &self.client_context_id
    }
}
