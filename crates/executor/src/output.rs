//! Output enum for management operation results.
//!
//! Every operation produces exactly one output variant. The mapping is fixed
//! per operation kind and checked by the dispatcher: an engine reply of the
//! wrong shape is reported as a protocol failure, never handed to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::operation::ManagementOperation;
use crate::types::{AnalyticsDataset, AnalyticsIndex, AnalyticsLink};

/// Successful management operation results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagementOutput {
    /// No return value (create, drop, connect, disconnect, replace)
    Unit,

    /// Every dataset
    Datasets(Vec<AnalyticsDataset>),

    /// Every index
    Indexes(Vec<AnalyticsIndex>),

    /// Links matching the request filters
    Links(Vec<AnalyticsLink>),

    /// Dataverse → dataset → number of mutations not yet ingested
    PendingMutations(BTreeMap<String, BTreeMap<String, u64>>),
}

/// Shape of a [`ManagementOutput`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// No payload
    Unit,
    /// List of datasets
    Datasets,
    /// List of indexes
    Indexes,
    /// List of links
    Links,
    /// Pending mutation counts
    PendingMutations,
}

impl ManagementOutput {
    /// Shape of this output.
    pub fn kind(&self) -> OutputKind {
        match self {
            ManagementOutput::Unit => OutputKind::Unit,
            ManagementOutput::Datasets(_) => OutputKind::Datasets,
            ManagementOutput::Indexes(_) => OutputKind::Indexes,
            ManagementOutput::Links(_) => OutputKind::Links,
            ManagementOutput::PendingMutations(_) => OutputKind::PendingMutations,
        }
    }
}

impl ManagementOperation {
    /// Output shape this operation must produce.
    ///
    /// `None` for the `Unknown` sentinel, which never reaches the engine.
    pub fn expected_output(&self) -> Option<OutputKind> {
        match self {
            ManagementOperation::Unknown => None,
            ManagementOperation::GetAllDatasets => Some(OutputKind::Datasets),
            ManagementOperation::GetAllIndexes => Some(OutputKind::Indexes),
            ManagementOperation::GetAllLinks => Some(OutputKind::Links),
            ManagementOperation::GetPendingMutations => Some(OutputKind::PendingMutations),
            ManagementOperation::CreateDataverse
            | ManagementOperation::CreateDataset
            | ManagementOperation::CreateIndex
            | ManagementOperation::DropDataverse
            | ManagementOperation::DropDataset
            | ManagementOperation::DropIndex
            | ManagementOperation::LinkCreate
            | ManagementOperation::LinkConnect
            | ManagementOperation::LinkDisconnect
            | ManagementOperation::LinkReplace
            | ManagementOperation::DropLink => Some(OutputKind::Unit),
        }
    }
}
