//! One-shot callback delivery.
//!
//! Callers that cannot `.await` (FFI bridges, event loops) hand a
//! [`Callback`] to [`dispatch`] along with the operation future. The
//! operation runs on the Tokio runtime and exactly one continuation fires
//! exactly once: the result continuation on success, the error continuation
//! on failure, on a panic, or when the callback is dropped undelivered
//! (aborted delivery task, runtime shutdown).

use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::CryptoError;
use crate::Result;

type Continuation<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

/// Result and error continuations for one operation.
///
/// [`deliver`](Self::deliver) consumes the callback, so it can only fire once.
/// Dropping a callback that was never delivered fires the error continuation
/// with [`CryptoError::Internal`].
pub struct Callback<T> {
    continuation: Option<Continuation<T>>,
}

impl<T: Send + 'static> Callback<T> {
    /// Build a callback from separate result and error continuations.
    pub fn new<R, E>(on_result: R, on_error: E) -> Self
    where
        R: FnOnce(T) + Send + 'static,
        E: FnOnce(CryptoError) + Send + 'static,
    {
        Self {
            continuation: Some(Box::new(move |outcome| match outcome {
                Ok(value) => on_result(value),
                Err(err) => on_error(err),
            })),
        }
    }

    /// A callback that forwards the outcome into a oneshot channel.
    pub fn oneshot() -> (Self, oneshot::Receiver<Result<T>>) {
        let (tx, rx) = oneshot::channel();
        let callback = Self {
            continuation: Some(Box::new(move |outcome| {
                // The receiver may already be gone; nothing else to notify.
                let _ = tx.send(outcome);
            })),
        };
        (callback, rx)
    }
}

impl<T> Callback<T> {
    /// Fire the matching continuation.
    pub fn deliver(mut self, outcome: Result<T>) {
        if let Some(continuation) = self.continuation.take() {
            continuation(outcome);
        }
    }
}

impl<T> Drop for Callback<T> {
    fn drop(&mut self) {
        if let Some(continuation) = self.continuation.take() {
            warn!("Callback dropped before delivery");
            continuation(Err(CryptoError::internal("operation dropped before delivery")));
        }
    }
}

impl<T> std::fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callback")
            .field("delivered", &self.continuation.is_none())
            .finish_non_exhaustive()
    }
}

/// Run `operation` on the runtime and deliver its outcome to `callback`.
///
/// A panic inside `operation` is delivered as [`CryptoError::Internal`], as
/// is aborting the returned handle before delivery. Must be called from
/// within a Tokio runtime.
pub fn dispatch<F, T>(operation: F, callback: Callback<T>) -> JoinHandle<()>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::spawn(operation);
    tokio::spawn(async move {
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Crypto operation aborted");
                Err(CryptoError::internal(format!("operation aborted: {e}")))
            }
        };
        callback.deliver(outcome);
    })
}
