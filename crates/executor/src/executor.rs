//! The Executor - single entry point for a connection.
//!
//! Holds a shared connection and the client configuration. It keeps no
//! per-operation state: every operation owns its completion or stream, so
//! one executor can serve any number of threads at once.

use std::sync::Arc;

use crate::command::ManagementCommand;
use crate::completion::{Callbacks, PendingOperation};
use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::dispatch;
use crate::operation::OperationDescriptor;
use crate::output::ManagementOutput;
use crate::query::{self, QueryOptions, StreamedResult};
use crate::Result;

/// Dispatcher bound to one connection.
///
/// # Thread Safety
///
/// Executor is `Send + Sync` and can be shared across threads.
///
/// # Example
///
/// ```ignore
/// use cbbridge_executor::{Executor, ManagementCommand, QueryOptions};
///
/// let executor = Executor::new(connection);
///
/// // Typed management command
/// let output = executor.execute(ManagementCommand::GetAllDatasets).await?;
///
/// // Streamed query
/// let mut rows = executor.execute_query("SELECT * FROM airports", QueryOptions::default())?;
/// while let Some(row) = rows.next_row().await {
///     println!("{}", row?);
/// }
/// ```
#[derive(Clone)]
pub struct Executor {
    connection: Arc<dyn Connection>,
    config: ClientConfig,
}

impl Executor {
    /// Create an executor with the default configuration.
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self::with_config(connection, ClientConfig::default())
    }

    /// Create an executor with an explicit configuration.
    pub fn with_config(connection: Arc<dyn Connection>, config: ClientConfig) -> Self {
        Self { connection, config }
    }

    /// Dispatch a descriptor, reporting through `callbacks`.
    ///
    /// See [`dispatch::dispatch`].
    pub fn dispatch(
        &self,
        descriptor: OperationDescriptor,
        callbacks: Callbacks<ManagementOutput>,
    ) -> Result<()> {
        dispatch::dispatch(self.connection.as_ref(), descriptor, callbacks, &self.config)
    }

    /// Dispatch a descriptor, returning a future for its result.
    pub fn submit(&self, descriptor: OperationDescriptor) -> Result<PendingOperation<ManagementOutput>> {
        dispatch::submit(self.connection.as_ref(), descriptor, &self.config)
    }

    /// Execute a typed command and wait for its result.
    pub async fn execute(&self, command: ManagementCommand) -> Result<ManagementOutput> {
        self.submit(OperationDescriptor::from_command(&command))?.await
    }

    /// Execute multiple commands.
    ///
    /// All commands are submitted before any result is awaited; results are
    /// returned in command order.
    pub async fn execute_many(&self, commands: Vec<ManagementCommand>) -> Vec<Result<ManagementOutput>> {
        let submitted: Vec<_> = commands
            .iter()
            .map(|command| self.submit(OperationDescriptor::from_command(command)))
            .collect();

        let mut results = Vec::with_capacity(submitted.len());
        for pending in submitted {
            results.push(match pending {
                Ok(pending) => pending.await,
                Err(err) => Err(err),
            });
        }
        results
    }

    /// Submit a query and return its row stream.
    ///
    /// See [`query::execute_query`].
    pub fn execute_query(
        &self,
        statement: impl Into<String>,
        options: QueryOptions,
    ) -> Result<StreamedResult> {
        query::execute_query(self.connection.as_ref(), statement, options, &self.config)
    }

    /// Configuration in effect.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
