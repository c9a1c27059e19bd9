//! Async container operations.

use stratus_core::{Result, from_callback};

use crate::TRACING_TARGET;
use crate::client::BlobContainer;
use crate::model::{BlobContainerPermissions, BlobRequestOptions};

/// Async operations on a [`BlobContainer`].
///
/// Listing lives in [`ListBlobsExt`](crate::ListBlobsExt), shared with directories.
#[async_trait::async_trait]
pub trait BlobContainerExt: BlobContainer {
    /// Creates the container unless it already exists.
    ///
    /// Returns `true` if this call created it.
    async fn create_if_not_exists(&self) -> Result<bool> {
        let created = from_callback(|done| self.begin_create_if_not_exists(done)).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            container = self.name(),
            created,
            "Ensured container exists"
        );

        Ok(created)
    }

    /// Replaces the container's access settings.
    async fn set_permissions(
        &self,
        permissions: &BlobContainerPermissions,
        options: Option<BlobRequestOptions>,
    ) -> Result<()> {
        let options = options.unwrap_or_default();
        from_callback(|done| self.begin_set_permissions(permissions, &options, done)).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            container = self.name(),
            public_access = %permissions.public_access,
            policies = permissions.shared_access_policies.len(),
            "Container permissions updated"
        );

        Ok(())
    }
}

impl<T: BlobContainer + ?Sized> BlobContainerExt for T {}
