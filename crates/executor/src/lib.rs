//! # cbbridge Executor
//!
//! Bridges caller requests to an asynchronous cluster engine.
//!
//! This crate provides:
//! - [`dispatch`]/[`submit`] - Analytics management operations with an
//!   exactly-once completion
//! - [`execute_query`] - Queries whose rows stream back as the engine
//!   produces them
//! - [`Executor`] - Both of the above bound to one [`Connection`]
//!
//! ## Management operations
//!
//! ```text
//! use cbbridge_executor::{Callbacks, ManagementOperation, OperationDescriptor};
//!
//! let descriptor = OperationDescriptor::new(
//!     ManagementOperation::CreateDataverse,
//!     json!({ "dataverse_name": "inventory" }),
//! );
//! executor.dispatch(descriptor, Callbacks::new(
//!     |output| println!("created: {:?}", output),
//!     |err| eprintln!("failed: {}", err),
//! ))?;
//! ```
//!
//! ## Queries
//!
//! ```text
//! let options = QueryOptions::try_from(RawQueryOptions {
//!     scan_consistency: Some("request_plus".into()),
//!     ..Default::default()
//! })?;
//! let mut result = executor.execute_query("SELECT * FROM airports", options)?;
//! while let Some(row) = result.next_row().await {
//!     handle(row?);
//! }
//! let metadata = result.metadata();
//! ```
//!
//! ## Error surface
//!
//! | When | How |
//! |------|-----|
//! | Unknown operation, bad arguments, bad enum string, malformed token | `Err` returned synchronously, nothing submitted |
//! | Engine failure on a management operation | `on_error` / `PendingOperation` resolves to `Err` |
//! | Engine failure during a query | `Some(Err(_))` from the row stream |

#![warn(missing_docs)]

mod command;
mod completion;
mod config;
mod connection;
mod dispatch;
mod executor;
mod operation;
mod output;
mod query;
mod registry;
mod types;

// =============================================================================
// Public API
// =============================================================================

pub use command::{
    CreateDatasetArgs, CreateDataverseArgs, CreateIndexArgs, DropDatasetArgs, DropDataverseArgs,
    DropIndexArgs, DropLinkArgs, GetAllLinksArgs, LinkArgs, LinkConnectArgs, LinkDisconnectArgs,
    ManagementCommand,
};
pub use completion::{Callbacks, Completion, PendingOperation};
pub use config::{ClientConfig, StreamConfig, CONFIG_FILE_NAME, MAX_ROW_BUFFER};
pub use connection::{Connection, ManagementRequest};
pub use dispatch::{dispatch, submit};
pub use executor::Executor;
pub use operation::{ManagementOperation, OperationDescriptor};
pub use output::{ManagementOutput, OutputKind};
pub use query::{
    execute_query, QueryMetadata, QueryMetrics, QueryOptions, QueryRequest, QueryWarning,
    RawQueryOptions, Row, RowSink, StreamClosed, StreamedResult,
};
pub use registry::resolve;
pub use types::{
    AnalyticsDataset, AnalyticsIndex, AnalyticsLink, AzureBlobExternalLink, CouchbaseRemoteLink,
    S3ExternalLink,
};

pub use cbbridge_core::{
    AnalyticsEncryptionLevel, AnalyticsLinkType, EngineError, EngineErrorKind, Error,
    MutationState, MutationToken, ProfileMode, QueryStatus, Result, ScanConsistency,
};
