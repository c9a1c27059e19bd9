//! Async operations on table service contexts and typed queries.

use std::marker::PhantomData;

use stratus_core::{
    CancellationToken, Collected, ContinuationToken, Page, PageSource, Progress, Result, Segmented,
    from_callback,
};

use crate::TRACING_TARGET;
use crate::client::{TableServiceContext, TableServiceQuery};
use crate::response::SaveChangesResponse;

/// Async operations on a [`TableServiceContext`].
#[async_trait::async_trait]
pub trait TableServiceContextExt: TableServiceContext {
    /// Sends every pending change.
    async fn save_changes(&self) -> Result<SaveChangesResponse> {
        let pending = self.pending_changes();
        let response = from_callback(|done| self.begin_save_changes(done)).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            pending,
            operations = response.len(),
            success = response.is_success(),
            "Changes saved"
        );

        Ok(response)
    }
}

impl<C: TableServiceContext + ?Sized> TableServiceContextExt for C {}

/// [`PageSource`] over the segments of a [`TableServiceQuery`].
pub struct ServiceQuerySource<'a, Q: ?Sized, T> {
    query: &'a Q,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, Q: ?Sized, T> ServiceQuerySource<'a, Q, T> {
    /// Creates a source that starts at the first segment of `query`.
    pub fn new(query: &'a Q) -> Self {
        Self {
            query,
            _marker: PhantomData,
        }
    }
}

#[async_trait::async_trait]
impl<'a, Q, T> PageSource for ServiceQuerySource<'a, Q, T>
where
    Q: TableServiceQuery<T> + ?Sized,
    T: Send + 'static,
{
    type Item = T;

    async fn fetch_page(&mut self, continuation: Option<ContinuationToken>) -> Result<Page<T>> {
        tracing::trace!(
            target: TRACING_TARGET,
            resumed = continuation.is_some(),
            "Requesting service query segment"
        );

        let segment =
            from_callback(|done| self.query.begin_execute_segmented(continuation, done)).await?;
        Ok(segment.into_page())
    }
}

impl<Q: ?Sized, T> std::fmt::Debug for ServiceQuerySource<'_, Q, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceQuerySource").finish_non_exhaustive()
    }
}

/// Async operations on a [`TableServiceQuery`].
#[async_trait::async_trait]
pub trait TableServiceQueryExt<T>: TableServiceQuery<T>
where
    T: Send + 'static,
{
    /// Prepares a segmented run of the query.
    fn pages(&self) -> Segmented<'_, ServiceQuerySource<'_, Self, T>> {
        Segmented::new(ServiceQuerySource::new(self))
    }

    /// Runs the query to completion, following continuation tokens until the
    /// last segment.
    ///
    /// `progress` receives each segment as soon as it arrives. When `cancel`
    /// fires, the outstanding fetch is abandoned and no further segment is
    /// requested.
    async fn execute_segmented<'a>(
        &'a self,
        progress: Option<&'a dyn Progress<T>>,
        cancel: Option<CancellationToken>,
    ) -> Result<Collected<T>> {
        let mut pages = self.pages().with_optional_progress(progress);
        if let Some(cancel) = cancel {
            pages = pages.with_cancellation(cancel);
        }

        let results = pages.collect().await?;

        tracing::debug!(
            target: TRACING_TARGET,
            results = results.len(),
            segments = results.pages(),
            "Service query complete"
        );

        Ok(results)
    }
}

impl<T, Q> TableServiceQueryExt<T> for Q
where
    T: Send + 'static,
    Q: TableServiceQuery<T> + ?Sized,
{
}
