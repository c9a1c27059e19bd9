//! Aggregation of segmented operations.
//!
//! [`Segmented`] drives a [`PageSource`] from the first page to the last,
//! strictly one fetch at a time, and either concatenates every page into a
//! [`Collected`] or hands the pages out lazily as a [`PageStream`].

use std::future::Future;
use std::time::Duration;

use async_stream::try_stream;
use derive_more::{Deref, IntoIterator};
use futures::TryStreamExt;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::callback::with_cancellation;
use crate::{Error, Page, PageSource, Progress, Result, SegmentConfig, TRACING_TARGET_SEGMENT};

/// A boxed stream of pages.
pub type PageStream<'a, T> = BoxStream<'a, Result<Page<T>>>;

/// All items of a segmented operation, in the order they were fetched.
#[derive(Debug, Clone, PartialEq, Eq, Deref, IntoIterator)]
pub struct Collected<T> {
    #[deref(forward)]
    #[into_iterator(owned, ref)]
    items: Vec<T>,
    pages: usize,
}

impl<T> Collected<T> {
    /// Returns the number of pages the items were assembled from.
    #[inline]
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Consumes the collection and returns the items.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> From<Collected<T>> for Vec<T> {
    fn from(collected: Collected<T>) -> Self {
        collected.items
    }
}

/// Sequential driver for a segmented operation.
///
/// Each fetch is issued only after the previous one resolved, using the
/// continuation token it returned. The first failure ends the operation.
pub struct Segmented<'a, S: PageSource> {
    source: S,
    progress: Option<&'a dyn Progress<S::Item>>,
    cancel: Option<CancellationToken>,
    fetch_timeout: Option<Duration>,
}

impl<'a, S> Segmented<'a, S>
where
    S: PageSource + 'a,
    S::Item: 'a,
{
    /// Creates a driver for the given page source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            progress: None,
            cancel: None,
            fetch_timeout: None,
        }
    }

    /// Reports every fetched page to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn Progress<S::Item>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Reports every fetched page to `progress`, if one is given.
    #[must_use]
    pub fn with_optional_progress(mut self, progress: Option<&'a dyn Progress<S::Item>>) -> Self {
        self.progress = progress;
        self
    }

    /// Stops the operation when `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Fails the operation if a single fetch takes longer than `timeout`.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Applies the settings of a [`SegmentConfig`] after validating it.
    ///
    /// A config without a fetch timeout keeps the one already set. The page
    /// size is chosen by the page source; see `ListBlobsExt::list_blobs_with`.
    pub fn with_config(mut self, config: &SegmentConfig) -> Result<Self> {
        config.validate()?;

        if let Some(timeout) = config.fetch_timeout() {
            self.fetch_timeout = Some(timeout);
        }

        Ok(self)
    }

    /// Returns the pages lazily, fetching the next one only when polled.
    ///
    /// The progress sink sees each page just before the stream yields it.
    /// The stream ends after the first error.
    pub fn into_stream(self) -> PageStream<'a, S::Item> {
        let Self {
            mut source,
            progress,
            cancel,
            fetch_timeout,
        } = self;

        Box::pin(try_stream! {
            let mut continuation = None;
            let mut index = 0usize;

            loop {
                let fetch = source.fetch_page(continuation.take());
                let page = fetch_with_limits(fetch, cancel.as_ref(), fetch_timeout).await?;
                index += 1;

                tracing::debug!(
                    target: TRACING_TARGET_SEGMENT,
                    page = index,
                    items = page.len(),
                    has_more = page.has_more(),
                    "Fetched segment"
                );

                if let Some(progress) = progress {
                    progress.report(page.items());
                }

                let next = page.continuation().cloned();
                yield page;

                match next {
                    Some(token) => continuation = Some(token),
                    None => break,
                }
            }
        })
    }

    /// Fetches every page and returns all items in arrival order.
    ///
    /// Items gathered before a failure are discarded.
    pub async fn collect(self) -> Result<Collected<S::Item>> {
        let mut stream = self.into_stream();
        let mut items = Vec::new();
        let mut pages = 0usize;

        loop {
            match stream.try_next().await {
                Ok(Some(page)) => {
                    pages += 1;
                    items.extend(page.into_items());
                }
                Ok(None) => break,
                Err(error) => {
                    tracing::debug!(
                        target: TRACING_TARGET_SEGMENT,
                        pages_fetched = pages,
                        error = %error,
                        "Segmented fetch failed, discarding partial results"
                    );
                    return Err(error);
                }
            }
        }

        tracing::info!(
            target: TRACING_TARGET_SEGMENT,
            pages,
            items = items.len(),
            "Segmented fetch complete"
        );

        Ok(Collected { items, pages })
    }
}

impl<S: PageSource> std::fmt::Debug for Segmented<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segmented")
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

async fn fetch_with_limits<F, T>(
    fetch: F,
    cancel: Option<&CancellationToken>,
    fetch_timeout: Option<Duration>,
) -> Result<Page<T>>
where
    F: Future<Output = Result<Page<T>>>,
{
    let Some(limit) = fetch_timeout else {
        return with_cancellation(fetch, cancel).await;
    };

    let bounded = async move {
        match tokio::time::timeout(limit, fetch).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(
                    target: TRACING_TARGET_SEGMENT,
                    timeout_ms = limit.as_millis(),
                    "Segment fetch timed out"
                );
                Err(Error::timeout(limit))
            }
        }
    };

    with_cancellation(bounded, cancel).await
}
