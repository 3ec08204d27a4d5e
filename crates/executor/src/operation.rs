//! Closed enumeration of analytics management operations.
//!
//! [`ManagementOperation`] is the boundary vocabulary: callers name an
//! operation by its canonical string or numeric code, and anything outside
//! the closed set becomes [`ManagementOperation::Unknown`]. `Unknown` is a
//! safe default for a descriptor, never a valid submission; the registry
//! rejects it before any engine interaction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::ManagementCommand;

/// An analytics management operation kind.
///
/// Numeric codes are stable: `Unknown` is 0 and the real operations follow
/// in declaration order starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ManagementOperation {
    /// Sentinel for an unset or unrecognised operation
    #[default]
    Unknown = 0,
    /// Create a dataverse
    CreateDataverse = 1,
    /// Create a dataset
    CreateDataset = 2,
    /// Create a secondary index on a dataset
    CreateIndex = 3,
    /// List every dataset
    GetAllDatasets = 4,
    /// List every index
    GetAllIndexes = 5,
    /// Drop a dataverse
    DropDataverse = 6,
    /// Drop a dataset
    DropDataset = 7,
    /// Drop an index
    DropIndex = 8,
    /// Per-dataset count of mutations not yet ingested
    GetPendingMutations = 9,
    /// Create a link
    LinkCreate = 10,
    /// Connect a link
    LinkConnect = 11,
    /// List links
    GetAllLinks = 12,
    /// Disconnect a link
    LinkDisconnect = 13,
    /// Replace a link definition
    LinkReplace = 14,
    /// Drop a link
    DropLink = 15,
}

impl ManagementOperation {
    /// Every real operation, excluding `Unknown`, in code order.
    pub const ALL: [ManagementOperation; 15] = [
        ManagementOperation::CreateDataverse,
        ManagementOperation::CreateDataset,
        ManagementOperation::CreateIndex,
        ManagementOperation::GetAllDatasets,
        ManagementOperation::GetAllIndexes,
        ManagementOperation::DropDataverse,
        ManagementOperation::DropDataset,
        ManagementOperation::DropIndex,
        ManagementOperation::GetPendingMutations,
        ManagementOperation::LinkCreate,
        ManagementOperation::LinkConnect,
        ManagementOperation::GetAllLinks,
        ManagementOperation::LinkDisconnect,
        ManagementOperation::LinkReplace,
        ManagementOperation::DropLink,
    ];

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            ManagementOperation::Unknown => "UNKNOWN",
            ManagementOperation::CreateDataverse => "CREATE_DATAVERSE",
            ManagementOperation::CreateDataset => "CREATE_DATASET",
            ManagementOperation::CreateIndex => "CREATE_INDEX",
            ManagementOperation::GetAllDatasets => "GET_ALL_DATASETS",
            ManagementOperation::GetAllIndexes => "GET_ALL_INDEXES",
            ManagementOperation::DropDataverse => "DROP_DATAVERSE",
            ManagementOperation::DropDataset => "DROP_DATASET",
            ManagementOperation::DropIndex => "DROP_INDEX",
            ManagementOperation::GetPendingMutations => "GET_PENDING_MUTATIONS",
            ManagementOperation::LinkCreate => "LINK_CREATE",
            ManagementOperation::LinkConnect => "LINK_CONNECT",
            ManagementOperation::GetAllLinks => "GET_ALL_LINKS",
            ManagementOperation::LinkDisconnect => "LINK_DISCONNECT",
            ManagementOperation::LinkReplace => "LINK_REPLACE",
            ManagementOperation::DropLink => "DROP_LINK",
        }
    }

    /// Look up an operation by canonical name.
    ///
    /// Surrounding whitespace is ignored; matching is case-sensitive.
    /// Anything else, including the literal `"UNKNOWN"`, yields `Unknown`.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name() == name)
            .unwrap_or(ManagementOperation::Unknown)
    }

    /// Look up an operation by numeric code. Out of range yields `Unknown`.
    pub fn from_code(code: u8) -> Self {
        match code {
            1..=15 => Self::ALL[usize::from(code) - 1],
            _ => ManagementOperation::Unknown,
        }
    }

    /// Numeric code.
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Whether this is a real operation rather than the sentinel.
    pub fn is_known(&self) -> bool {
        !matches!(self, ManagementOperation::Unknown)
    }

    /// Space-separated list of every canonical name, for error messages.
    pub fn all_operations() -> String {
        Self::ALL
            .iter()
            .map(|op| op.name())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for ManagementOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ManagementOperation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Accepts either a canonical name or a numeric code.
impl<'de> Deserialize<'de> for ManagementOperation {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OperationVisitor;

        impl serde::de::Visitor<'_> for OperationVisitor {
            type Value = ManagementOperation;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an operation name or numeric code")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ManagementOperation::from_name(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(u8::try_from(v)
                    .map(ManagementOperation::from_code)
                    .unwrap_or(ManagementOperation::Unknown))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(u8::try_from(v)
                    .map(ManagementOperation::from_code)
                    .unwrap_or(ManagementOperation::Unknown))
            }
        }

        deserializer.deserialize_any(OperationVisitor)
    }
}

/// A management request as the caller hands it over.
///
/// `arguments` is the caller's payload for the operation. It is only
/// interpreted by the registry, which turns it into a typed
/// [`ManagementCommand`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Which operation to run
    #[serde(default)]
    pub operation_type: ManagementOperation,
    /// Operation-specific payload
    #[serde(default)]
    pub arguments: serde_json::Value,
    /// Per-operation timeout; `None` uses the configured management timeout
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_millis")]
    pub timeout: Option<Duration>,
}

impl OperationDescriptor {
    /// Create a descriptor from an operation and its payload.
    pub fn new(operation_type: ManagementOperation, arguments: serde_json::Value) -> Self {
        OperationDescriptor {
            operation_type,
            arguments,
            timeout: None,
        }
    }

    /// Build a descriptor from a typed command.
    pub fn from_command(command: &ManagementCommand) -> Self {
        OperationDescriptor {
            operation_type: command.operation(),
            arguments: command.arguments(),
            timeout: None,
        }
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
