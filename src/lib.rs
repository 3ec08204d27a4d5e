//! cbbridge - operation dispatch and streamed results for an analytics/query
//! database client
//!
//! Callers describe analytics management operations with an
//! [`OperationDescriptor`] and queries with [`QueryOptions`]. The bridge
//! validates them, hands them to an asynchronous cluster engine through a
//! [`Connection`], and routes every outcome back exactly once.
//!
//! # Quick Start
//!
//! ```ignore
//! use cbbridge::{Executor, ManagementCommand, QueryOptions, ScanConsistency};
//!
//! let executor = Executor::new(connection);
//!
//! let datasets = executor.execute(ManagementCommand::GetAllDatasets).await?;
//!
//! let options = QueryOptions::new().scan_consistency(ScanConsistency::RequestPlus);
//! let mut result = executor.execute_query("SELECT * FROM airports", options)?;
//! while let Some(row) = result.next_row().await {
//!     println!("{}", row?);
//! }
//! ```
//!
//! # Architecture
//!
//! All operations go through the [`Executor`] or the free functions it wraps.
//! The engine itself is external: implement [`Connection`] to plug one in.

// Re-export the public API from cbbridge-executor
pub use cbbridge_executor::*;
