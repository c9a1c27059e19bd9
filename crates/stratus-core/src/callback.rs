//! Bridge from begin/complete style SDK calls to futures.
//!
//! A storage SDK operation is started by a "begin" call that receives a
//! [`Completion`] and returns a [`CancelHook`]. The SDK completes the operation
//! later, possibly from another thread. [`from_callback`] turns such a call
//! into a [`Pending`] future.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result, TRACING_TARGET_CALLBACK};

/// One-shot completion handed to a begin call.
#[must_use = "the operation never finishes unless the completion is used"]
pub struct Completion<T> {
    sender: oneshot::Sender<Result<T>>,
}

impl<T> Completion<T> {
    /// Completes the operation with the given outcome.
    ///
    /// Outcomes delivered after the waiting future was dropped are discarded.
    pub fn complete(self, result: Result<T>) {
        if self.sender.send(result).is_err() {
            tracing::trace!(
                target: TRACING_TARGET_CALLBACK,
                "Completion delivered after the caller stopped waiting"
            );
        }
    }

    /// Completes the operation successfully.
    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    /// Completes the operation with a failure.
    pub fn fail(self, error: Error) {
        self.complete(Err(error));
    }

    /// Returns true if nobody is waiting for this completion anymore.
    pub fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("abandoned", &self.is_abandoned())
            .finish()
    }
}

/// Cancellation hook returned by a begin call.
#[derive(Default)]
pub struct CancelHook {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl CancelHook {
    /// Creates a hook that runs `cancel` when the operation is abandoned.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Creates a hook for operations that cannot be cancelled.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if this hook can cancel anything.
    pub fn is_cancellable(&self) -> bool {
        self.cancel.is_some()
    }

    fn fire(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            tracing::debug!(
                target: TRACING_TARGET_CALLBACK,
                "Cancelling outstanding operation"
            );
            cancel();
        }
    }
}

impl std::fmt::Debug for CancelHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHook")
            .field("cancellable", &self.is_cancellable())
            .finish()
    }
}

/// Future resolving to the outcome of a begin/complete operation.
///
/// Dropping it before the operation completes fires the cancel hook.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Pending<T> {
    receiver: oneshot::Receiver<Result<T>>,
    hook: CancelHook,
    done: bool,
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let outcome = match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(result)) => result,
            Poll::Ready(Err(_)) => Err(Error::abandoned()),
        };

        this.done = true;
        Poll::Ready(outcome)
    }
}

impl<T> Drop for Pending<T> {
    fn drop(&mut self) {
        if !self.done {
            self.hook.fire();
        }
    }
}

impl<T> std::fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pending")
            .field("hook", &self.hook)
            .field("done", &self.done)
            .finish()
    }
}

/// Starts a begin/complete operation and returns a future for its outcome.
///
/// `begin` runs immediately, before the future is first polled.
///
/// # Example
/// ```ignore
/// let created = from_callback(|done| container.begin_create_if_not_exists(done)).await?;
/// ```
pub fn from_callback<T, F>(begin: F) -> Pending<T>
where
    F: FnOnce(Completion<T>) -> CancelHook,
{
    let (sender, receiver) = oneshot::channel();
    let hook = begin(Completion { sender });

    Pending {
        receiver,
        hook,
        done: false,
    }
}

/// Runs `future` until it finishes or `cancel` fires, whichever comes first.
///
/// On cancellation the future is dropped, which releases whatever it holds
/// (for a [`Pending`], its cancel hook fires).
pub async fn with_cancellation<F, T>(future: F, cancel: Option<&CancellationToken>) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(cancel) = cancel else {
        return future.await;
    };

    if cancel.is_cancelled() {
        return Err(Error::cancelled());
    }

    tokio::select! {
        biased;

        () = cancel.cancelled() => Err(Error::cancelled()),
        result = future => result,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::ErrorKind;

    #[tokio::test]
    async fn resolves_inline_completion() {
        let value = from_callback(|done: Completion<u32>| {
            done.succeed(7);
            CancelHook::none()
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn resolves_completion_from_another_task() {
        let pending = from_callback(|done: Completion<&'static str>| {
            tokio::spawn(async move { done.succeed("ok") });
            CancelHook::none()
        });

        assert_eq!(pending.await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn surfaces_failure_unchanged() {
        let error = from_callback(|done: Completion<()>| {
            done.fail(Error::not_found("container"));
            CancelHook::none()
        })
        .await
        .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.message.as_deref(), Some("container"));
    }

    #[tokio::test]
    async fn dropped_completion_is_abandoned() {
        let error = from_callback(|done: Completion<()>| {
            drop(done);
            CancelHook::none()
        })
        .await
        .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Abandoned);
    }

    #[tokio::test]
    async fn dropping_pending_fires_hook() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let (keep, _keep_rx) = std::sync::mpsc::channel();

        let pending = from_callback(|done: Completion<()>| {
            keep.send(done).unwrap();
            CancelHook::new(move || flag.store(true, Ordering::SeqCst))
        });
        drop(pending);

        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn completed_pending_does_not_fire_hook() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let pending = from_callback(|done: Completion<()>| {
            done.succeed(());
            CancelHook::new(move || flag.store(true, Ordering::SeqCst))
        });
        pending.await.unwrap();

        assert!(!cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancellation_token_fires_hook() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let (keep, _keep_rx) = std::sync::mpsc::channel();
        let token = CancellationToken::new();

        let pending = from_callback(|done: Completion<()>| {
            keep.send(done).unwrap();
            CancelHook::new(move || flag.store(true, Ordering::SeqCst))
        });

        let canceller = token.clone();
        tokio::spawn(async move { canceller.cancel() });

        let error = with_cancellation(pending, Some(&token)).await.unwrap_err();
        assert!(error.is_cancelled());
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn already_cancelled_token_skips_future() {
        let token = CancellationToken::new();
        token.cancel();

        let error = with_cancellation(async { Ok::<_, Error>(1) }, Some(&token))
            .await
            .unwrap_err();
        assert!(error.is_cancelled());
    }
}
