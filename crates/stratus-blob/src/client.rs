//! Callback-style blob storage client surface.
//!
//! These traits describe what a blob storage SDK must offer: every operation
//! is started by a `begin_*` call that receives a [`Completion`] and returns a
//! [`CancelHook`]. The async adapters in this crate are implemented for every
//! type that implements them.

use bytes::Bytes;
use stratus_core::{CancelHook, Completion, ContinuationToken, Page};

use crate::model::{
    BlobAttributes, BlobContainerPermissions, BlobRequestOptions, ListBlobItem, Metadata,
};

/// One segment of a blob listing as returned by the storage client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSegment<T> {
    /// Entries of this segment.
    pub results: Vec<T>,
    /// Whether the service reports further segments.
    pub has_more_results: bool,
    /// Token to request the next segment with.
    pub continuation: Option<ContinuationToken>,
}

impl<T> ResultSegment<T> {
    /// Creates a segment.
    pub fn new(
        results: Vec<T>,
        has_more_results: bool,
        continuation: Option<ContinuationToken>,
    ) -> Self {
        Self {
            results,
            has_more_results,
            continuation,
        }
    }

    /// Converts the segment into a [`Page`].
    pub fn into_page(self) -> Page<T> {
        Page::from_segment(self.results, self.has_more_results, self.continuation)
    }
}

/// Anything that can list blobs one segment at a time.
pub trait ListBlobs: Send + Sync {
    /// Name used in logs, such as the container name or directory prefix.
    fn name(&self) -> &str;

    /// Starts fetching the listing segment `continuation` points at.
    fn begin_list_blobs_segmented(
        &self,
        page_size: u32,
        continuation: Option<ContinuationToken>,
        options: &BlobRequestOptions,
        done: Completion<ResultSegment<ListBlobItem>>,
    ) -> CancelHook;
}

/// A blob container.
pub trait BlobContainer: ListBlobs {
    /// Starts creating the container; completes with `true` if it was created.
    fn begin_create_if_not_exists(&self, done: Completion<bool>) -> CancelHook;

    /// Starts replacing the container's access settings.
    fn begin_set_permissions(
        &self,
        permissions: &BlobContainerPermissions,
        options: &BlobRequestOptions,
        done: Completion<()>,
    ) -> CancelHook;
}

/// A virtual directory inside a container.
pub trait BlobDirectory: ListBlobs {
    /// Full prefix of the directory, including the trailing delimiter.
    fn prefix(&self) -> &str;
}

/// A single blob.
pub trait Blob: Send + Sync {
    /// Blob name relative to its container.
    fn name(&self) -> &str;

    /// Starts downloading the full blob content.
    fn begin_download(&self, done: Completion<Bytes>) -> CancelHook;

    /// Starts replacing the blob content.
    fn begin_upload(&self, content: Bytes, done: Completion<()>) -> CancelHook;

    /// Starts deleting the blob; fails if it does not exist.
    fn begin_delete(&self, done: Completion<()>) -> CancelHook;

    /// Starts deleting the blob; completes with `true` if it existed.
    fn begin_delete_if_exists(&self, done: Completion<bool>) -> CancelHook;

    /// Starts replacing the blob's metadata.
    fn begin_set_metadata(&self, metadata: &Metadata, done: Completion<()>) -> CancelHook;

    /// Starts reading the blob's properties and metadata.
    fn begin_fetch_attributes(&self, done: Completion<BlobAttributes>) -> CancelHook;
}
