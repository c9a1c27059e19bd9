#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for blob storage operations.
pub const TRACING_TARGET: &str = "stratus_blob";

mod blob;
mod client;
mod container;
mod listing;
mod model;

#[doc(hidden)]
pub mod prelude;

pub use blob::BlobExt;
pub use client::{Blob, BlobContainer, BlobDirectory, ListBlobs, ResultSegment};
pub use container::BlobContainerExt;
pub use listing::{BlobListing, ListBlobsExt};
pub use model::{
    BlobAttributes, BlobContainerPermissions, BlobItem, BlobRequestOptions, ListBlobItem,
    ListingDetails, Metadata, PublicAccess, SharedAccessPolicy,
};
