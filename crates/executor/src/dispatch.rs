//! Management operation dispatch.
//!
//! Resolution is synchronous: an unrecognized operation or bad arguments
//! come back as `Err` before the engine is touched, and the caller's
//! callbacks are dropped uninvoked. Everything after submission is
//! asynchronous and reaches the caller exactly once through the completion.

use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use cbbridge_core::{EngineError, Result};

use crate::command::ManagementCommand;
use crate::completion::{Callbacks, Completion, PendingOperation};
use crate::config::ClientConfig;
use crate::connection::{Connection, ManagementRequest};
use crate::operation::{ManagementOperation, OperationDescriptor};
use crate::output::ManagementOutput;
use crate::registry;

/// Dispatch a management operation, reporting through `callbacks`.
///
/// Exactly one of the callbacks is invoked, exactly once, from the engine's
/// execution context, unless this returns `Err`, in which case neither is.
///
/// # Errors
///
/// - [`cbbridge_core::Error::UnrecognizedOperation`] for the `Unknown` sentinel
/// - [`cbbridge_core::Error::InvalidArguments`] if the payload does not fit
pub fn dispatch(
    connection: &dyn Connection,
    descriptor: OperationDescriptor,
    callbacks: Callbacks<ManagementOutput>,
    config: &ClientConfig,
) -> Result<()> {
    let command = registry::resolve(&descriptor)?;
    let timeout = descriptor.timeout.unwrap_or_else(|| config.management_timeout());
    let completion = Completion::from_callbacks(command.operation().name(), callbacks);
    submit_resolved(connection, command, timeout, completion);
    Ok(())
}

/// Dispatch a management operation, returning a future for its result.
///
/// # Errors
///
/// Same as [`dispatch`].
pub fn submit(
    connection: &dyn Connection,
    descriptor: OperationDescriptor,
    config: &ClientConfig,
) -> Result<PendingOperation<ManagementOutput>> {
    let command = registry::resolve(&descriptor)?;
    let timeout = descriptor.timeout.unwrap_or_else(|| config.management_timeout());
    let (completion, pending) = Completion::channel(command.operation().name());
    submit_resolved(connection, command, timeout, completion);
    Ok(pending)
}

fn submit_resolved(
    connection: &dyn Connection,
    command: ManagementCommand,
    timeout: Duration,
    completion: Completion<ManagementOutput>,
) {
    let operation = command.operation();
    let client_context_id = Uuid::new_v4().to_string();

    debug!(
        target: "cbbridge::dispatch",
        operation = %operation,
        client_context_id = %client_context_id,
        timeout_ms = timeout.as_millis() as u64,
        "submitting analytics management operation"
    );

    let context_id = client_context_id.clone();
    let completion =
        completion.map_result(move |result| check_output(operation, &context_id, result));

    let request = ManagementRequest {
        command,
        timeout,
        client_context_id,
    };
    connection.submit_management(request, completion);
}

fn check_output(
    operation: ManagementOperation,
    client_context_id: &str,
    result: Result<ManagementOutput>,
) -> Result<ManagementOutput> {
    match result {
        Ok(output) if Some(output.kind()) == operation.expected_output() => {
            debug!(
                target: "cbbridge::dispatch",
                operation = %operation,
                client_context_id = %client_context_id,
                "analytics management operation completed"
            );
            Ok(output)
        }
        Ok(output) => {
            warn!(
                target: "cbbridge::dispatch",
                operation = %operation,
                client_context_id = %client_context_id,
                output = ?output.kind(),
                "engine replied with an output of the wrong kind"
            );
            Err(EngineError::protocol(format!(
                "{} produced {:?} output, expected {:?}",
                operation,
                output.kind(),
                operation.expected_output()
            ))
            .with_context(client_context_id)
            .into())
        }
        Err(err) => {
            warn!(
                target: "cbbridge::dispatch",
                operation = %operation,
                client_context_id = %client_context_id,
                error = %err,
                "analytics management operation failed"
            );
            Err(err)
        }
    }
}
