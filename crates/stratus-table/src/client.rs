//! Callback-style table storage client surface.
//!
//! Every operation is started by a `begin_*` call that receives a
//! [`Completion`] and returns a [`CancelHook`].

use stratus_core::{CancelHook, Completion, ContinuationToken};

use crate::entity::DynamicTableEntity;
use crate::query::{TableQuery, TableQuerySegment};
use crate::response::SaveChangesResponse;

/// A single table.
pub trait TableClient: Send + Sync {
    /// Table name, used in logs.
    fn name(&self) -> &str;

    /// Starts creating the table; fails if it already exists.
    fn begin_create(&self, done: Completion<()>) -> CancelHook;

    /// Starts creating the table; completes with `true` if it was created.
    fn begin_create_if_not_exists(&self, done: Completion<bool>) -> CancelHook;

    /// Starts fetching the query segment `continuation` points at.
    fn begin_execute_query_segmented(
        &self,
        query: &TableQuery,
        continuation: Option<ContinuationToken>,
        done: Completion<TableQuerySegment<DynamicTableEntity>>,
    ) -> CancelHook;
}

/// A unit of work that tracks entity changes until they are saved.
pub trait TableServiceContext: Send + Sync {
    /// Number of changes waiting to be saved.
    fn pending_changes(&self) -> usize;

    /// Starts sending every pending change.
    fn begin_save_changes(&self, done: Completion<SaveChangesResponse>) -> CancelHook;
}

/// A typed query bound to its table.
pub trait TableServiceQuery<T>: Send + Sync {
    /// Starts fetching the result segment `continuation` points at.
    fn begin_execute_segmented(
        &self,
        continuation: Option<ContinuationToken>,
        done: Completion<TableQuerySegment<T>>,
    ) -> CancelHook;
}
