//! Descriptor → command resolution.
//!
//! The registry is the only place where a caller's opaque argument payload is
//! interpreted. It is stateless and identical for every connection: a
//! descriptor either resolves to the typed command for exactly its own
//! operation kind, or fails before any engine interaction.

use serde::de::DeserializeOwned;

use cbbridge_core::{Error, Result};

use crate::command::ManagementCommand;
use crate::operation::{ManagementOperation, OperationDescriptor};

/// Resolve a descriptor into a validated, typed command.
///
/// # Errors
///
/// - [`Error::UnrecognizedOperation`] if the operation type is `Unknown`
/// - [`Error::InvalidArguments`] if the payload does not fit the operation
pub fn resolve(descriptor: &OperationDescriptor) -> Result<ManagementCommand> {
    let op = descriptor.operation_type;
    let args = &descriptor.arguments;

    let command = match op {
        ManagementOperation::Unknown => {
            return Err(Error::UnrecognizedOperation {
                operation: format!(
                    "{} (expected one of: {})",
                    op.name(),
                    ManagementOperation::all_operations()
                ),
            })
        }
        ManagementOperation::CreateDataverse => ManagementCommand::CreateDataverse(parse(op, args)?),
        ManagementOperation::CreateDataset => ManagementCommand::CreateDataset(parse(op, args)?),
        ManagementOperation::CreateIndex => ManagementCommand::CreateIndex(parse(op, args)?),
        ManagementOperation::GetAllDatasets => {
            no_arguments(op, args)?;
            ManagementCommand::GetAllDatasets
        }
        ManagementOperation::GetAllIndexes => {
            no_arguments(op, args)?;
            ManagementCommand::GetAllIndexes
        }
        ManagementOperation::DropDataverse => ManagementCommand::DropDataverse(parse(op, args)?),
        ManagementOperation::DropDataset => ManagementCommand::DropDataset(parse(op, args)?),
        ManagementOperation::DropIndex => ManagementCommand::DropIndex(parse(op, args)?),
        ManagementOperation::GetPendingMutations => {
            no_arguments(op, args)?;
            ManagementCommand::GetPendingMutations
        }
        ManagementOperation::LinkCreate => ManagementCommand::LinkCreate(parse(op, args)?),
        ManagementOperation::LinkConnect => ManagementCommand::LinkConnect(parse_or_default(op, args)?),
        ManagementOperation::GetAllLinks => ManagementCommand::GetAllLinks(parse_or_default(op, args)?),
        ManagementOperation::LinkDisconnect => {
            ManagementCommand::LinkDisconnect(parse_or_default(op, args)?)
        }
        ManagementOperation::LinkReplace => ManagementCommand::LinkReplace(parse(op, args)?),
        ManagementOperation::DropLink => ManagementCommand::DropLink(parse(op, args)?),
    };

    command.validate().map_err(|reason| invalid(op, reason))?;
    Ok(command)
}

fn parse<T: DeserializeOwned>(op: ManagementOperation, args: &serde_json::Value) -> Result<T> {
    serde_json::from_value(args.clone()).map_err(|e| invalid(op, e.to_string()))
}

fn parse_or_default<T: DeserializeOwned + Default>(
    op: ManagementOperation,
    args: &serde_json::Value,
) -> Result<T> {
    if args.is_null() {
        Ok(T::default())
    } else {
        parse(op, args)
    }
}

fn no_arguments(op: ManagementOperation, args: &serde_json::Value) -> Result<()> {
    match args {
        serde_json::Value::Null => Ok(()),
        serde_json::Value::Object(map) if map.is_empty() => Ok(()),
        other => Err(invalid(op, format!("operation takes no arguments, got {}", other))),
    }
}

fn invalid(op: ManagementOperation, reason: impl Into<String>) -> Error {
    Error::InvalidArguments {
        operation: op.name().to_string(),
        reason: reason.into(),
    }
}
