//! Blob storage data types.

use std::collections::BTreeMap;
use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// User-defined name/value pairs attached to a blob.
pub type Metadata = BTreeMap<String, String>;

/// One entry of a blob listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListBlobItem {
    /// A stored blob.
    Blob(BlobItem),
    /// A virtual directory, only produced by hierarchical listings.
    Directory {
        /// Full prefix of the directory, including the trailing delimiter.
        prefix: String,
    },
}

impl ListBlobItem {
    /// Returns the blob name or the directory prefix.
    pub fn name(&self) -> &str {
        match self {
            Self::Blob(blob) => &blob.name,
            Self::Directory { prefix } => prefix,
        }
    }

    /// Returns true for virtual directories.
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }

    /// Returns the blob entry, if this is one.
    pub fn as_blob(&self) -> Option<&BlobItem> {
        match self {
            Self::Blob(blob) => Some(blob),
            Self::Directory { .. } => None,
        }
    }
}

/// A blob as reported by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobItem {
    /// Blob name relative to its container.
    pub name: String,
    /// Size in bytes.
    pub content_length: u64,
    /// Content type / MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Last modification time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
    /// Metadata, only populated when the listing asked for it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl BlobItem {
    /// Creates a listing entry with the given name and size.
    pub fn new(name: impl Into<String>, content_length: u64) -> Self {
        Self {
            name: name.into(),
            content_length,
            content_type: None,
            last_modified: None,
            metadata: Metadata::new(),
        }
    }
}

/// Properties and metadata of a single blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobAttributes {
    /// Size in bytes.
    pub content_length: u64,
    /// Content type / MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Entity tag of the current blob version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Last modification time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
    /// User-defined metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

/// Which optional details a listing should include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDetails {
    /// Include blob metadata.
    #[serde(default)]
    pub metadata: bool,
    /// Include snapshots.
    #[serde(default)]
    pub snapshots: bool,
    /// Include uncommitted blobs.
    #[serde(default)]
    pub uncommitted_blobs: bool,
}

/// Per-request options passed through to the storage client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRequestOptions {
    /// List every blob under the prefix instead of grouping by directory.
    #[serde(default)]
    pub use_flat_listing: bool,
    /// Optional listing details.
    #[serde(default)]
    pub listing_details: ListingDetails,
    /// Server-side timeout for each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_timeout: Option<Duration>,
}

impl BlobRequestOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists every blob under the prefix.
    pub fn with_flat_listing(mut self) -> Self {
        self.use_flat_listing = true;
        self
    }

    /// Includes blob metadata in listings.
    pub fn with_metadata(mut self) -> Self {
        self.listing_details.metadata = true;
        self
    }

    /// Sets the server-side request timeout.
    pub fn with_server_timeout(mut self, timeout: Duration) -> Self {
        self.server_timeout = Some(timeout);
        self
    }
}

/// Anonymous read access level of a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PublicAccess {
    /// No anonymous access.
    #[default]
    Off,
    /// Anonymous clients may list and read blobs.
    Container,
    /// Anonymous clients may read blobs but not list them.
    Blob,
}

/// A stored access policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedAccessPolicy {
    /// Permission letters, e.g. `"rwdl"`.
    pub permissions: String,
    /// Start of the validity window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_on: Option<Timestamp>,
    /// End of the validity window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<Timestamp>,
}

/// Access settings of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobContainerPermissions {
    /// Anonymous access level.
    #[serde(default)]
    pub public_access: PublicAccess,
    /// Stored access policies by identifier.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub shared_access_policies: BTreeMap<String, SharedAccessPolicy>,
}

impl BlobContainerPermissions {
    /// Creates permissions with the given public access level.
    pub fn new(public_access: PublicAccess) -> Self {
        Self {
            public_access,
            shared_access_policies: BTreeMap::new(),
        }
    }

    /// Adds a stored access policy.
    pub fn with_policy(mut self, id: impl Into<String>, policy: SharedAccessPolicy) -> Self {
        self.shared_access_policies.insert(id.into(), policy);
        self
    }
}
