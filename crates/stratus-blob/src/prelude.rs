//! Prelude module for convenient imports.

pub use crate::blob::BlobExt;
pub use crate::client::{Blob, BlobContainer, BlobDirectory, ListBlobs};
pub use crate::container::BlobContainerExt;
pub use crate::listing::ListBlobsExt;
pub use crate::model::{
    BlobAttributes, BlobContainerPermissions, BlobRequestOptions, ListBlobItem, Metadata,
    PublicAccess,
};
