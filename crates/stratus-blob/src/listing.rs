//! Segmented blob listings.

use stratus_core::{
    Collected, ContinuationToken, Page, PageSource, Progress, Result, SegmentConfig, Segmented,
    from_callback, validate_page_size,
};

use crate::TRACING_TARGET;
use crate::client::ListBlobs;
use crate::model::{BlobRequestOptions, ListBlobItem};

/// [`PageSource`] over the segments of a blob listing.
pub struct BlobListing<'a, C: ?Sized> {
    client: &'a C,
    page_size: u32,
    options: BlobRequestOptions,
}

impl<'a, C: ListBlobs + ?Sized> BlobListing<'a, C> {
    /// Creates a listing over `client`, rejecting unsupported page sizes.
    pub fn new(client: &'a C, page_size: u32, options: BlobRequestOptions) -> Result<Self> {
        validate_page_size(page_size)?;

        Ok(Self {
            client,
            page_size,
            options,
        })
    }
}

#[async_trait::async_trait]
impl<'a, C: ListBlobs + ?Sized> PageSource for BlobListing<'a, C> {
    type Item = ListBlobItem;

    async fn fetch_page(
        &mut self,
        continuation: Option<ContinuationToken>,
    ) -> Result<Page<ListBlobItem>> {
        tracing::trace!(
            target: TRACING_TARGET,
            source = self.client.name(),
            page_size = self.page_size,
            resumed = continuation.is_some(),
            "Requesting blob listing segment"
        );

        let segment = from_callback(|done| {
            self.client.begin_list_blobs_segmented(
                self.page_size,
                continuation,
                &self.options,
                done,
            )
        })
        .await?;

        Ok(segment.into_page())
    }
}

impl<C: ListBlobs + ?Sized> std::fmt::Debug for BlobListing<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobListing")
            .field("source", &self.client.name())
            .field("page_size", &self.page_size)
            .field("options", &self.options)
            .finish()
    }
}

/// Async listing operations for containers and directories.
#[async_trait::async_trait]
pub trait ListBlobsExt: ListBlobs {
    /// Prepares a segmented listing.
    ///
    /// Attach progress, cancellation or a timeout to the returned driver, then
    /// either collect it or consume it as a stream of pages.
    fn list_blobs(
        &self,
        page_size: u32,
        options: BlobRequestOptions,
    ) -> Result<Segmented<'_, BlobListing<'_, Self>>> {
        Ok(Segmented::new(BlobListing::new(self, page_size, options)?))
    }

    /// Prepares a segmented listing from a [`SegmentConfig`].
    ///
    /// The page size and fetch timeout both come from `config`, which is
    /// validated before any segment is requested.
    fn list_blobs_with(
        &self,
        config: &SegmentConfig,
        options: BlobRequestOptions,
    ) -> Result<Segmented<'_, BlobListing<'_, Self>>> {
        self.list_blobs(config.page_size, options)?
            .with_config(config)
    }

    /// Lists every blob, following continuation tokens until the last segment.
    ///
    /// `progress` receives each segment as soon as it arrives.
    async fn list_blobs_segmented<'a>(
        &'a self,
        page_size: u32,
        options: Option<BlobRequestOptions>,
        progress: Option<&'a dyn Progress<ListBlobItem>>,
    ) -> Result<Collected<ListBlobItem>> {
        let listed = self
            .list_blobs(page_size, options.unwrap_or_default())?
            .with_optional_progress(progress)
            .collect()
            .await?;

        tracing::debug!(
            target: TRACING_TARGET,
            source = self.name(),
            blobs = listed.len(),
            segments = listed.pages(),
            "Listed blobs"
        );

        Ok(listed)
    }
}

impl<T: ListBlobs + ?Sized> ListBlobsExt for T {}
