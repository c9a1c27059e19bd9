//! Page-fetch capabilities.

use std::future::Future;
use std::marker::PhantomData;

use crate::{ContinuationToken, Page, Result};

/// Something that can fetch one page of a segmented operation.
///
/// The first call receives `None`; every later call receives the token of the
/// page fetched just before it.
#[async_trait::async_trait]
pub trait PageSource: Send {
    /// Element type of the pages.
    type Item: Send;

    /// Fetches the page that `continuation` points at.
    async fn fetch_page(
        &mut self,
        continuation: Option<ContinuationToken>,
    ) -> Result<Page<Self::Item>>;
}

/// [`PageSource`] backed by a closure, see [`page_fn`].
pub struct PageFn<F, T> {
    fetch: F,
    _marker: PhantomData<fn() -> T>,
}

/// Creates a [`PageSource`] from a closure returning a page future.
///
/// # Example
/// ```ignore
/// let source = page_fn(|token| client.list(token));
/// let all = Segmented::new(source).collect().await?;
/// ```
pub fn page_fn<F, Fut, T>(fetch: F) -> PageFn<F, T>
where
    F: FnMut(Option<ContinuationToken>) -> Fut + Send,
    Fut: Future<Output = Result<Page<T>>> + Send,
    T: Send,
{
    PageFn {
        fetch,
        _marker: PhantomData,
    }
}

#[async_trait::async_trait]
impl<F, Fut, T> PageSource for PageFn<F, T>
where
    F: FnMut(Option<ContinuationToken>) -> Fut + Send,
    Fut: Future<Output = Result<Page<T>>> + Send,
    T: Send,
{
    type Item = T;

    async fn fetch_page(&mut self, continuation: Option<ContinuationToken>) -> Result<Page<T>> {
        (self.fetch)(continuation).await
    }
}

impl<F, T> std::fmt::Debug for PageFn<F, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFn").finish_non_exhaustive()
    }
}
