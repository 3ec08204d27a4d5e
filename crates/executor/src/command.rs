//! Typed analytics management commands.
//!
//! Every management operation has exactly one [`ManagementCommand`] variant
//! carrying its typed arguments. Commands are:
//! - **Self-contained**: all parameters needed by the engine are in the variant
//! - **Serializable**: argument structs round-trip through JSON
//! - **Closed**: there is no generic fallback variant

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cbbridge_core::AnalyticsLinkType;

use crate::operation::ManagementOperation;
use crate::types::AnalyticsLink;

/// Arguments for `CREATE_DATAVERSE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDataverseArgs {
    /// Dataverse to create
    pub dataverse_name: String,
    /// Succeed quietly if the dataverse already exists
    #[serde(default)]
    pub ignore_if_exists: bool,
}

/// Arguments for `CREATE_DATASET`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDatasetArgs {
    /// Dataset to create
    pub dataset_name: String,
    /// Bucket the dataset ingests from
    pub bucket_name: String,
    /// Dataverse to create it in; engine default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataverse_name: Option<String>,
    /// Optional `WHERE` filter applied to ingested documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Succeed quietly if the dataset already exists
    #[serde(default)]
    pub ignore_if_exists: bool,
}

/// Arguments for `CREATE_INDEX`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateIndexArgs {
    /// Index to create
    pub index_name: String,
    /// Dataset the index covers
    pub dataset_name: String,
    /// Dataverse of the dataset; engine default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataverse_name: Option<String>,
    /// Field path → analytics type (e.g. `"city": "string"`)
    pub fields: BTreeMap<String, String>,
    /// Succeed quietly if the index already exists
    #[serde(default)]
    pub ignore_if_exists: bool,
}

/// Arguments for `DROP_DATAVERSE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropDataverseArgs {
    /// Dataverse to drop
    pub dataverse_name: String,
    /// Succeed quietly if the dataverse does not exist
    #[serde(default)]
    pub ignore_if_not_exists: bool,
}

/// Arguments for `DROP_DATASET`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropDatasetArgs {
    /// Dataset to drop
    pub dataset_name: String,
    /// Dataverse of the dataset; engine default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataverse_name: Option<String>,
    /// Succeed quietly if the dataset does not exist
    #[serde(default)]
    pub ignore_if_not_exists: bool,
}

/// Arguments for `DROP_INDEX`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropIndexArgs {
    /// Index to drop
    pub index_name: String,
    /// Dataset the index covers
    pub dataset_name: String,
    /// Dataverse of the dataset; engine default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataverse_name: Option<String>,
    /// Succeed quietly if the index does not exist
    #[serde(default)]
    pub ignore_if_not_exists: bool,
}

/// Arguments for `LINK_CREATE` and `LINK_REPLACE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkArgs {
    /// Full link definition
    pub link: AnalyticsLink,
}

/// Arguments for `LINK_CONNECT`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkConnectArgs {
    /// Dataverse of the link; engine default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataverse_name: Option<String>,
    /// Link to connect; engine default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_name: Option<String>,
    /// Connect even if the remote bucket UUID changed
    #[serde(default)]
    pub force: bool,
}

/// Arguments for `GET_ALL_LINKS`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetAllLinksArgs {
    /// Only list links in this dataverse
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataverse_name: Option<String>,
    /// Only list the link with this name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_name: Option<String>,
    /// Only list links of this type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<AnalyticsLinkType>,
}

/// Arguments for `LINK_DISCONNECT`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkDisconnectArgs {
    /// Dataverse of the link; engine default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataverse_name: Option<String>,
    /// Link to disconnect; engine default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_name: Option<String>,
}

/// Arguments for `DROP_LINK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropLinkArgs {
    /// Link to drop
    pub link_name: String,
    /// Dataverse of the link
    pub dataverse_name: String,
}

/// A typed analytics management command.
///
/// | Variant | Returns |
/// |---------|---------|
/// | `CreateDataverse`, `CreateDataset`, `CreateIndex` | `ManagementOutput::Unit` |
/// | `DropDataverse`, `DropDataset`, `DropIndex` | `ManagementOutput::Unit` |
/// | `GetAllDatasets` | `ManagementOutput::Datasets` |
/// | `GetAllIndexes` | `ManagementOutput::Indexes` |
/// | `GetPendingMutations` | `ManagementOutput::PendingMutations` |
/// | `LinkCreate`, `LinkConnect`, `LinkDisconnect`, `LinkReplace`, `DropLink` | `ManagementOutput::Unit` |
/// | `GetAllLinks` | `ManagementOutput::Links` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagementCommand {
    // ==================== Dataverses / Datasets / Indexes ====================
    /// Create a dataverse
    CreateDataverse(CreateDataverseArgs),
    /// Create a dataset
    CreateDataset(CreateDatasetArgs),
    /// Create an index
    CreateIndex(CreateIndexArgs),
    /// List every dataset
    GetAllDatasets,
    /// List every index
    GetAllIndexes,
    /// Drop a dataverse
    DropDataverse(DropDataverseArgs),
    /// Drop a dataset
    DropDataset(DropDatasetArgs),
    /// Drop an index
    DropIndex(DropIndexArgs),
    /// Count mutations not yet ingested
    GetPendingMutations,

    // ==================== Links ====================
    /// Create a link
    LinkCreate(LinkArgs),
    /// Connect a link
    LinkConnect(LinkConnectArgs),
    /// List links
    GetAllLinks(GetAllLinksArgs),
    /// Disconnect a link
    LinkDisconnect(LinkDisconnectArgs),
    /// Replace a link definition
    LinkReplace(LinkArgs),
    /// Drop a link
    DropLink(DropLinkArgs),
}

impl ManagementCommand {
    /// Operation kind of this command.
    pub fn operation(&self) -> ManagementOperation {
        match self {
            ManagementCommand::CreateDataverse(_) => ManagementOperation::CreateDataverse,
            ManagementCommand::CreateDataset(_) => ManagementOperation::CreateDataset,
            ManagementCommand::CreateIndex(_) => ManagementOperation::CreateIndex,
            ManagementCommand::GetAllDatasets => ManagementOperation::GetAllDatasets,
            ManagementCommand::GetAllIndexes => ManagementOperation::GetAllIndexes,
            ManagementCommand::DropDataverse(_) => ManagementOperation::DropDataverse,
            ManagementCommand::DropDataset(_) => ManagementOperation::DropDataset,
            ManagementCommand::DropIndex(_) => ManagementOperation::DropIndex,
            ManagementCommand::GetPendingMutations => ManagementOperation::GetPendingMutations,
            ManagementCommand::LinkCreate(_) => ManagementOperation::LinkCreate,
            ManagementCommand::LinkConnect(_) => ManagementOperation::LinkConnect,
            ManagementCommand::GetAllLinks(_) => ManagementOperation::GetAllLinks,
            ManagementCommand::LinkDisconnect(_) => ManagementOperation::LinkDisconnect,
            ManagementCommand::LinkReplace(_) => ManagementOperation::LinkReplace,
            ManagementCommand::DropLink(_) => ManagementOperation::DropLink,
        }
    }

    /// Arguments as a JSON payload, the inverse of registry resolution.
    pub fn arguments(&self) -> serde_json::Value {
        let value = match self {
            ManagementCommand::CreateDataverse(a) => serde_json::to_value(a),
            ManagementCommand::CreateDataset(a) => serde_json::to_value(a),
            ManagementCommand::CreateIndex(a) => serde_json::to_value(a),
            ManagementCommand::DropDataverse(a) => serde_json::to_value(a),
            ManagementCommand::DropDataset(a) => serde_json::to_value(a),
            ManagementCommand::DropIndex(a) => serde_json::to_value(a),
            ManagementCommand::LinkCreate(a) | ManagementCommand::LinkReplace(a) => {
                serde_json::to_value(a)
            }
            ManagementCommand::LinkConnect(a) => serde_json::to_value(a),
            ManagementCommand::GetAllLinks(a) => serde_json::to_value(a),
            ManagementCommand::LinkDisconnect(a) => serde_json::to_value(a),
            ManagementCommand::DropLink(a) => serde_json::to_value(a),
            ManagementCommand::GetAllDatasets
            | ManagementCommand::GetAllIndexes
            | ManagementCommand::GetPendingMutations => Ok(serde_json::Value::Null),
        };
        // Argument structs only hold strings, bools, maps and enums
        value.unwrap_or(serde_json::Value::Null)
    }

    /// Check argument constraints that the type system does not express.
    ///
    /// Returns a reason string on failure.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ManagementCommand::CreateDataverse(a) => non_empty("dataverse_name", &a.dataverse_name),
            ManagementCommand::CreateDataset(a) => {
                non_empty("dataset_name", &a.dataset_name)?;
                non_empty("bucket_name", &a.bucket_name)?;
                optional_non_empty("dataverse_name", &a.dataverse_name)
            }
            ManagementCommand::CreateIndex(a) => {
                non_empty("index_name", &a.index_name)?;
                non_empty("dataset_name", &a.dataset_name)?;
                optional_non_empty("dataverse_name", &a.dataverse_name)?;
                if a.fields.is_empty() {
                    return Err("`fields` must name at least one field".into());
                }
                Ok(())
            }
            ManagementCommand::DropDataverse(a) => non_empty("dataverse_name", &a.dataverse_name),
            ManagementCommand::DropDataset(a) => {
                non_empty("dataset_name", &a.dataset_name)?;
                optional_non_empty("dataverse_name", &a.dataverse_name)
            }
            ManagementCommand::DropIndex(a) => {
                non_empty("index_name", &a.index_name)?;
                non_empty("dataset_name", &a.dataset_name)?;
                optional_non_empty("dataverse_name", &a.dataverse_name)
            }
            ManagementCommand::LinkCreate(a) | ManagementCommand::LinkReplace(a) => a.link.validate(),
            ManagementCommand::LinkConnect(a) => {
                optional_non_empty("dataverse_name", &a.dataverse_name)?;
                optional_non_empty("link_name", &a.link_name)
            }
            ManagementCommand::GetAllLinks(a) => {
                if a.link_name.is_some() && a.dataverse_name.is_none() {
                    return Err("`link_name` requires `dataverse_name`".into());
                }
                optional_non_empty("dataverse_name", &a.dataverse_name)?;
                optional_non_empty("link_name", &a.link_name)
            }
            ManagementCommand::LinkDisconnect(a) => {
                optional_non_empty("dataverse_name", &a.dataverse_name)?;
                optional_non_empty("link_name", &a.link_name)
            }
            ManagementCommand::DropLink(a) => {
                non_empty("link_name", &a.link_name)?;
                non_empty("dataverse_name", &a.dataverse_name)
            }
            ManagementCommand::GetAllDatasets
            | ManagementCommand::GetAllIndexes
            | ManagementCommand::GetPendingMutations => Ok(()),
        }
    }
}

fn non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("`{}` must not be empty", field))
    } else {
        Ok(())
    }
}

fn optional_non_empty(field: &str, value: &Option<String>) -> Result<(), String> {
    match value {
        Some(v) => non_empty(field, v),
        None => Ok(()),
    }
}
