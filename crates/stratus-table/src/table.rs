//! Async table operations and segmented queries.

use std::marker::PhantomData;

use stratus_core::{
    CancellationToken, Collected, ContinuationToken, Page, PageSource, Progress, Result, Segmented,
    from_callback, with_cancellation,
};

use crate::TRACING_TARGET;
use crate::client::TableClient;
use crate::entity::{TableEntity, convert};
use crate::query::TableQuery;

/// [`PageSource`] over the segments of a table query.
///
/// Entities are read as [`DynamicTableEntity`](crate::DynamicTableEntity)
/// and converted to `T` page by page.
pub struct TableQuerySource<'a, C: ?Sized, T> {
    client: &'a C,
    query: &'a TableQuery,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, C: TableClient + ?Sized, T> TableQuerySource<'a, C, T> {
    /// Creates a source running `query` against `client`.
    pub fn new(client: &'a C, query: &'a TableQuery) -> Result<Self> {
        query.validate()?;

        Ok(Self {
            client,
            query,
            _marker: PhantomData,
        })
    }
}

#[async_trait::async_trait]
impl<'a, C, T> PageSource for TableQuerySource<'a, C, T>
where
    C: TableClient + ?Sized,
    T: TableEntity + Send + 'static,
{
    type Item = T;

    async fn fetch_page(&mut self, continuation: Option<ContinuationToken>) -> Result<Page<T>> {
        tracing::trace!(
            target: TRACING_TARGET,
            table = self.client.name(),
            resumed = continuation.is_some(),
            "Requesting query segment"
        );

        let segment = from_callback(|done| {
            self.client
                .begin_execute_query_segmented(self.query, continuation, done)
        })
        .await?;

        segment.into_page().try_map(convert::<T>)
    }
}

impl<C: TableClient + ?Sized, T> std::fmt::Debug for TableQuerySource<'_, C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableQuerySource")
            .field("table", &self.client.name())
            .field("query", &self.query)
            .finish()
    }
}

/// Async operations on a [`TableClient`].
#[async_trait::async_trait]
pub trait TableClientExt: TableClient {
    /// Creates the table, failing if it already exists.
    async fn create(&self, cancel: Option<&CancellationToken>) -> Result<()> {
        with_cancellation(async { from_callback(|done| self.begin_create(done)).await }, cancel)
            .await?;

        tracing::debug!(target: TRACING_TARGET, table = self.name(), "Table created");
        Ok(())
    }

    /// Creates the table unless it already exists.
    ///
    /// Returns `true` if this call created it.
    async fn create_if_not_exists(&self, cancel: Option<&CancellationToken>) -> Result<bool> {
        let created = with_cancellation(
            async { from_callback(|done| self.begin_create_if_not_exists(done)).await },
            cancel,
        )
        .await?;

        tracing::debug!(
            target: TRACING_TARGET,
            table = self.name(),
            created,
            "Ensured table exists"
        );

        Ok(created)
    }

    /// Prepares a segmented query.
    ///
    /// Attach progress, cancellation or a timeout to the returned driver, then
    /// either collect it or consume it as a stream of pages.
    fn query<'a, T>(
        &'a self,
        query: &'a TableQuery,
    ) -> Result<Segmented<'a, TableQuerySource<'a, Self, T>>>
    where
        T: TableEntity + Send + 'static,
    {
        Ok(Segmented::new(TableQuerySource::new(self, query)?))
    }

    /// Runs `query` to completion, following continuation tokens until the
    /// last segment.
    ///
    /// `progress` receives each segment after conversion to `T`.
    async fn execute_query_segmented<'a, T>(
        &'a self,
        query: &'a TableQuery,
        progress: Option<&'a dyn Progress<T>>,
    ) -> Result<Collected<T>>
    where
        T: TableEntity + Send + 'static,
    {
        let entities = self
            .query::<T>(query)?
            .with_optional_progress(progress)
            .collect()
            .await?;

        tracing::debug!(
            target: TRACING_TARGET,
            table = self.name(),
            entities = entities.len(),
            segments = entities.pages(),
            "Query complete"
        );

        Ok(entities)
    }
}

impl<C: TableClient + ?Sized> TableClientExt for C {}
