//! Prelude module for convenient imports.

pub use crate::client::{TableClient, TableServiceContext, TableServiceQuery};
pub use crate::entity::{DynamicTableEntity, EntityProperty, TableEntity};
pub use crate::query::{QueryComparison, TableQuery};
pub use crate::response::SaveChangesResponse;
pub use crate::service::{TableServiceContextExt, TableServiceQueryExt};
pub use crate::table::TableClientExt;
