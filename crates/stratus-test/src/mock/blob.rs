//! Mock blob storage.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use jiff::Timestamp;
use stratus_blob::{
    Blob, BlobAttributes, BlobContainer, BlobContainerPermissions, BlobDirectory, BlobItem,
    BlobRequestOptions, ListBlobItem, ListBlobs, Metadata, ResultSegment,
};
use stratus_core::{CancelHook, Completion, ContinuationToken, Error, Result};

use super::{MockStats, MockStorageConfig, dispatch, lock, segment};

const DELIMITER: char = '/';

#[derive(Debug, Clone)]
struct StoredBlob {
    content: Bytes,
    metadata: Metadata,
    version: u64,
    last_modified: Timestamp,
}

#[derive(Debug, Default)]
struct ContainerState {
    exists: bool,
    blobs: BTreeMap<String, StoredBlob>,
    permissions: BlobContainerPermissions,
    next_version: u64,
}

impl ContainerState {
    fn require_exists(&self, container: &str) -> Result<()> {
        if self.exists {
            Ok(())
        } else {
            Err(Error::not_found(format!("container `{container}` does not exist")))
        }
    }

    fn write(&mut self, name: &str, content: Bytes) {
        self.next_version += 1;
        let metadata = self
            .blobs
            .remove(name)
            .map(|blob| blob.metadata)
            .unwrap_or_default();

        self.blobs.insert(
            name.to_owned(),
            StoredBlob {
                content,
                metadata,
                version: self.next_version,
                last_modified: Timestamp::now(),
            },
        );
    }

    /// Entries below `prefix`, grouped by directory unless `flat` is set.
    fn entries(&self, prefix: &str, options: &BlobRequestOptions) -> Vec<ListBlobItem> {
        let mut entries = Vec::new();

        for (name, blob) in self.blobs.range(prefix.to_owned()..) {
            let Some(rest) = name.strip_prefix(prefix) else {
                break;
            };

            if !options.use_flat_listing
                && let Some(index) = rest.find(DELIMITER)
            {
                let directory = format!("{prefix}{}", &rest[..=index]);
                if entries.last().map(ListBlobItem::name) != Some(directory.as_str()) {
                    entries.push(ListBlobItem::Directory { prefix: directory });
                }
                continue;
            }

            let mut item = BlobItem::new(name.clone(), blob.content.len() as u64);
            item.last_modified = Some(blob.last_modified);
            if options.listing_details.metadata {
                item.metadata = blob.metadata.clone();
            }
            entries.push(ListBlobItem::Blob(item));
        }

        entries
    }
}

#[derive(Debug)]
struct Shared {
    name: String,
    config: MockStorageConfig,
    stats: Arc<MockStats>,
    state: Mutex<ContainerState>,
}

impl Shared {
    fn list(
        &self,
        prefix: &str,
        page_size: u32,
        continuation: Option<ContinuationToken>,
        options: &BlobRequestOptions,
        done: Completion<ResultSegment<ListBlobItem>>,
    ) -> CancelHook {
        let result = match self.stats.record_segment() {
            Some(error) => Err(error),
            None => {
                let state = lock(&self.state);
                state.require_exists(&self.name).and_then(|()| {
                    let entries = state.entries(prefix, options);
                    let size = self.config.segment_size(page_size);
                    let (results, next) = segment(&entries, continuation.as_ref(), size)?;
                    Ok(ResultSegment::new(results, next.is_some(), next))
                })
            }
        };

        dispatch(&self.config, &self.stats, done, result)
    }

    /// Records a request, runs `operation` against the state and delivers its result.
    fn run<T, F>(&self, done: Completion<T>, operation: F) -> CancelHook
    where
        T: Send + 'static,
        F: FnOnce(&mut ContainerState) -> Result<T>,
    {
        self.stats.record();
        let result = operation(&mut lock(&self.state));
        dispatch(&self.config, &self.stats, done, result)
    }
}

/// In-memory blob container.
///
/// Clones share the same store.
#[derive(Debug, Clone)]
pub struct MockBlobContainer {
    shared: Arc<Shared>,
}

impl MockBlobContainer {
    /// Creates a container that does not exist yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, MockStorageConfig::default())
    }

    /// Creates a container that does not exist yet, using `config`.
    pub fn with_config(name: impl Into<String>, config: MockStorageConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                config,
                stats: Arc::default(),
                state: Mutex::default(),
            }),
        }
    }

    /// Stores a blob directly, creating the container if needed.
    pub fn insert_blob(&self, name: impl Into<String>, content: impl Into<Bytes>) {
        let mut state = lock(&self.shared.state);
        state.exists = true;
        state.write(&name.into(), content.into());
    }

    /// Returns a handle to the blob called `name`.
    pub fn blob(&self, name: impl Into<String>) -> MockBlob {
        MockBlob {
            shared: Arc::clone(&self.shared),
            name: name.into(),
        }
    }

    /// Returns the virtual directory `prefix`, with a trailing delimiter added if missing.
    pub fn directory(&self, prefix: impl Into<String>) -> MockBlobDirectory {
        let mut prefix = prefix.into();
        if !prefix.ends_with(DELIMITER) {
            prefix.push(DELIMITER);
        }

        MockBlobDirectory {
            shared: Arc::clone(&self.shared),
            prefix,
        }
    }

    /// Returns true once the container has been created.
    pub fn exists(&self) -> bool {
        lock(&self.shared.state).exists
    }

    /// Access policies last set on the container.
    pub fn permissions(&self) -> BlobContainerPermissions {
        lock(&self.shared.state).permissions.clone()
    }

    /// Names of every stored blob, in order.
    pub fn blob_names(&self) -> Vec<String> {
        lock(&self.shared.state).blobs.keys().cloned().collect()
    }

    /// Counters shared by the container and every handle derived from it.
    pub fn stats(&self) -> &MockStats {
        &self.shared.stats
    }
}

impl ListBlobs for MockBlobContainer {
    fn name(&self) -> &str {
        &self.shared.name
    }

    fn begin_list_blobs_segmented(
        &self,
        page_size: u32,
        continuation: Option<ContinuationToken>,
        options: &BlobRequestOptions,
        done: Completion<ResultSegment<ListBlobItem>>,
    ) -> CancelHook {
        self.shared
            .list("", page_size, continuation, options, done)
    }
}

impl BlobContainer for MockBlobContainer {
    fn begin_create_if_not_exists(&self, done: Completion<bool>) -> CancelHook {
        self.shared.run(done, |state| {
            let created = !state.exists;
            state.exists = true;
            Ok(created)
        })
    }

    fn begin_set_permissions(
        &self,
        permissions: &BlobContainerPermissions,
        _options: &BlobRequestOptions,
        done: Completion<()>,
    ) -> CancelHook {
        let name = &self.shared.name;
        self.shared.run(done, |state| {
            state.require_exists(name)?;
            state.permissions = permissions.clone();
            Ok(())
        })
    }
}

/// Virtual directory of a [`MockBlobContainer`].
#[derive(Debug, Clone)]
pub struct MockBlobDirectory {
    shared: Arc<Shared>,
    prefix: String,
}

impl ListBlobs for MockBlobDirectory {
    fn name(&self) -> &str {
        &self.prefix
    }

    fn begin_list_blobs_segmented(
        &self,
        page_size: u32,
        continuation: Option<ContinuationToken>,
        options: &BlobRequestOptions,
        done: Completion<ResultSegment<ListBlobItem>>,
    ) -> CancelHook {
        self.shared
            .list(&self.prefix, page_size, continuation, options, done)
    }
}

impl BlobDirectory for MockBlobDirectory {
    fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Blob handle of a [`MockBlobContainer`].
///
/// The blob itself need not exist.
#[derive(Debug, Clone)]
pub struct MockBlob {
    shared: Arc<Shared>,
    name: String,
}

impl MockBlob {
    fn missing(&self) -> Error {
        Error::not_found(format!("blob `{}` does not exist", self.name))
    }
}

impl Blob for MockBlob {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_download(&self, done: Completion<Bytes>) -> CancelHook {
        self.shared.run(done, |state| {
            state.require_exists(&self.shared.name)?;
            state
                .blobs
                .get(&self.name)
                .map(|blob| blob.content.clone())
                .ok_or_else(|| self.missing())
        })
    }

    fn begin_upload(&self, content: Bytes, done: Completion<()>) -> CancelHook {
        self.shared.run(done, |state| {
            state.require_exists(&self.shared.name)?;
            state.write(&self.name, content);
            Ok(())
        })
    }

    fn begin_delete(&self, done: Completion<()>) -> CancelHook {
        self.shared.run(done, |state| {
            state.require_exists(&self.shared.name)?;
            state
                .blobs
                .remove(&self.name)
                .map(|_| ())
                .ok_or_else(|| self.missing())
        })
    }

    fn begin_delete_if_exists(&self, done: Completion<bool>) -> CancelHook {
        self.shared.run(done, |state| {
            state.require_exists(&self.shared.name)?;
            Ok(state.blobs.remove(&self.name).is_some())
        })
    }

    fn begin_set_metadata(&self, metadata: &Metadata, done: Completion<()>) -> CancelHook {
        self.shared.run(done, |state| {
            state.require_exists(&self.shared.name)?;
            let blob = state.blobs.get_mut(&self.name).ok_or_else(|| self.missing())?;
            blob.metadata = metadata.clone();
            Ok(())
        })
    }

    fn begin_fetch_attributes(&self, done: Completion<BlobAttributes>) -> CancelHook {
        self.shared.run(done, |state| {
            state.require_exists(&self.shared.name)?;
            let blob = state.blobs.get(&self.name).ok_or_else(|| self.missing())?;

            Ok(BlobAttributes {
                content_length: blob.content.len() as u64,
                content_type: None,
                etag: Some(format!("\"0x{:X}\"", blob.version)),
                last_modified: Some(blob.last_modified),
                metadata: blob.metadata.clone(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listed(container: &MockBlobContainer, prefix: &str, flat: bool) -> Vec<String> {
        let mut options = BlobRequestOptions::new();
        options.use_flat_listing = flat;

        lock(&container.shared.state)
            .entries(prefix, &options)
            .iter()
            .map(|item| item.name().to_owned())
            .collect()
    }

    #[test]
    fn hierarchical_listing_groups_directories() {
        let container = MockBlobContainer::new("data");
        container.insert_blob("a.txt", "a");
        container.insert_blob("logs/1.txt", "1");
        container.insert_blob("logs/2.txt", "2");
        container.insert_blob("logs/old/0.txt", "0");

        assert_eq!(listed(&container, "", false), vec!["a.txt", "logs/"]);
        assert_eq!(
            listed(&container, "logs/", false),
            vec!["logs/1.txt", "logs/2.txt", "logs/old/"]
        );
        assert_eq!(listed(&container, "", true).len(), 4);
    }

    #[test]
    fn prefix_does_not_match_siblings() {
        let container = MockBlobContainer::new("data");
        container.insert_blob("log", "x");
        container.insert_blob("logs/1.txt", "1");
        container.insert_blob("logz", "z");

        assert_eq!(listed(&container, "logs/", true), vec!["logs/1.txt"]);
    }

    #[test]
    fn directory_prefix_gets_delimiter() {
        let container = MockBlobContainer::new("data");
        assert_eq!(container.directory("logs").prefix(), "logs/");
        assert_eq!(container.directory("logs/").prefix(), "logs/");
    }
}
