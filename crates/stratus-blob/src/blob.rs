//! Async single-blob operations.

use bytes::Bytes;
use stratus_core::{Error, Result, from_callback};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::TRACING_TARGET;
use crate::client::Blob;
use crate::model::{BlobAttributes, Metadata};

/// Async operations on a [`Blob`].
#[async_trait::async_trait]
pub trait BlobExt: Blob {
    /// Downloads the blob and writes its content to `writer`.
    ///
    /// Returns the number of bytes written.
    async fn download_to<W>(&self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let content = from_callback(|done| self.begin_download(done)).await?;

        writer.write_all(&content).await.map_err(local_io)?;
        writer.flush().await.map_err(local_io)?;

        tracing::debug!(
            target: TRACING_TARGET,
            blob = self.name(),
            size = content.len(),
            "Blob downloaded"
        );

        Ok(content.len() as u64)
    }

    /// Reads `reader` to the end and uploads it as the blob content.
    ///
    /// Returns the number of bytes uploaded.
    async fn upload_from<R>(&self, reader: &mut R) -> Result<u64>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await.map_err(local_io)?;

        let size = buffer.len() as u64;
        let content = Bytes::from(buffer);
        from_callback(|done| self.begin_upload(content, done)).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            blob = self.name(),
            size,
            "Blob uploaded"
        );

        Ok(size)
    }

    /// Deletes the blob, failing if it does not exist.
    async fn delete(&self) -> Result<()> {
        from_callback(|done| self.begin_delete(done)).await?;

        tracing::debug!(target: TRACING_TARGET, blob = self.name(), "Blob deleted");
        Ok(())
    }

    /// Deletes the blob if it exists.
    ///
    /// Returns `true` if this call deleted it.
    async fn delete_if_exists(&self) -> Result<bool> {
        from_callback(|done| self.begin_delete_if_exists(done)).await
    }

    /// Replaces the blob's metadata.
    async fn set_metadata(&self, metadata: &Metadata) -> Result<()> {
        from_callback(|done| self.begin_set_metadata(metadata, done)).await
    }

    /// Reads the blob's properties and metadata.
    async fn fetch_attributes(&self) -> Result<BlobAttributes> {
        from_callback(|done| self.begin_fetch_attributes(done)).await
    }
}

impl<T: Blob + ?Sized> BlobExt for T {}

fn local_io(error: std::io::Error) -> Error {
    Error::from(error).with_message("local stream I/O failed")
}
