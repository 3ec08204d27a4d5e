//! Core types for cbbridge
//!
//! This crate defines the vocabulary shared by the dispatcher and the query bridge:
//! - Canonical string enums: ScanConsistency, ProfileMode, QueryStatus, link types
//! - Mutation tokens and MutationState for causally consistent reads
//! - Error: the structured error hierarchy, including engine failures

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod consistency;
pub mod error;
pub mod mutation;

pub use consistency::{
    AnalyticsEncryptionLevel, AnalyticsLinkType, ProfileMode, QueryStatus, ScanConsistency,
};
pub use error::{EngineError, EngineErrorKind, Error, Result};
pub use mutation::{MutationState, MutationToken};
