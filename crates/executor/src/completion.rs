//! Exactly-once completion protocol.
//!
//! The engine receives a [`Completion`] with every submitted operation.
//! `Completion::complete` takes `self` by value, so a completion can be
//! resolved at most once; if the engine drops it without resolving, `Drop`
//! resolves it with an engine failure of kind `dropped`, so it is resolved at
//! least once. Callers observe the resolution either through a
//! [`Callbacks`] pair or through a [`PendingOperation`] future.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::warn;

use cbbridge_core::{EngineError, Error, Result};

type Resolver<T> = Box<dyn FnOnce(Result<T>) + Send>;

/// Success and error callables for one operation.
///
/// Exactly one of the two is invoked, exactly once.
pub struct Callbacks<T> {
    on_success: Box<dyn FnOnce(T) + Send>,
    on_error: Box<dyn FnOnce(Error) + Send>,
}

impl<T> Callbacks<T> {
    /// Create a callback pair.
    pub fn new(
        on_success: impl FnOnce(T) + Send + 'static,
        on_error: impl FnOnce(Error) + Send + 'static,
    ) -> Self {
        Callbacks {
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
        }
    }

    /// Invoke the callable matching `result`.
    pub fn resolve(self, result: Result<T>) {
        match result {
            Ok(value) => (self.on_success)(value),
            Err(err) => (self.on_error)(err),
        }
    }
}

impl<T> std::fmt::Debug for Callbacks<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks").finish_non_exhaustive()
    }
}

/// Engine-side handle that resolves one operation.
pub struct Completion<T> {
    resolver: Option<Resolver<T>>,
    label: String,
}

impl<T: Send + 'static> Completion<T> {
    /// Create a completion that hands its result to `resolver`.
    ///
    /// `label` names the operation in logs.
    pub fn new(label: impl Into<String>, resolver: impl FnOnce(Result<T>) + Send + 'static) -> Self {
        Completion {
            resolver: Some(Box::new(resolver)),
            label: label.into(),
        }
    }

    /// Create a completion that invokes a callback pair.
    pub fn from_callbacks(label: impl Into<String>, callbacks: Callbacks<T>) -> Self {
        Self::new(label, move |result| callbacks.resolve(result))
    }

    /// Create a completion paired with a future that observes it.
    pub fn channel(label: impl Into<String>) -> (Self, PendingOperation<T>) {
        let (tx, rx) = oneshot::channel();
        let completion = Self::new(label, move |result| {
            // The receiver may have been dropped; the result is then unobserved
            let _ = tx.send(result);
        });
        (completion, PendingOperation { rx })
    }

    /// Wrap the resolver so results pass through `map` first.
    pub fn map_result(
        mut self,
        map: impl FnOnce(Result<T>) -> Result<T> + Send + 'static,
    ) -> Self {
        let label = std::mem::take(&mut self.label);
        match self.resolver.take() {
            Some(inner) => Completion::new(label, move |result| inner(map(result))),
            None => Completion {
                resolver: None,
                label,
            },
        }
    }

    /// Resolve with the engine's outcome.
    pub fn complete(mut self, result: std::result::Result<T, EngineError>) {
        if let Some(resolver) = self.resolver.take() {
            resolver(result.map_err(Error::from));
        }
    }

    /// Resolve successfully.
    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    /// Resolve with an engine failure.
    pub fn fail(self, err: EngineError) {
        self.complete(Err(err));
    }

    /// Operation label used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if let Some(resolver) = self.resolver.take() {
            warn!(target: "cbbridge::dispatch", operation = %self.label, "completion dropped by engine without a reply");
            resolver(Err(Error::Engine(EngineError::dropped(format!(
                "{} was released by the engine without a reply",
                self.label
            )))));
        }
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("label", &self.label)
            .field("resolved", &self.resolver.is_none())
            .finish()
    }
}

/// Caller-side future for one submitted operation.
///
/// Resolves exactly once, to the value or error the engine reported.
#[derive(Debug)]
pub struct PendingOperation<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> PendingOperation<T> {
    /// Wait for the result.
    pub async fn wait(self) -> Result<T> {
        self.await
    }

    /// Block the current thread until the result arrives.
    ///
    /// Must not be called from within an async runtime.
    pub fn blocking_wait(self) -> Result<T> {
        self.rx.blocking_recv().unwrap_or_else(|_| Err(lost_completion()))
    }

    /// Take the result if it has already arrived.
    pub fn try_result(&mut self) -> Option<Result<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(lost_completion())),
        }
    }
}

impl<T> Future for PendingOperation<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(lost_completion())),
            Poll::Pending => Poll::Pending,
        }
    }
}

// Unreachable while Completion's Drop resolves; kept so the future never hangs
fn lost_completion() -> Error {
    Error::Engine(EngineError::dropped("completion channel closed without a result"))
}
