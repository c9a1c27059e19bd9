#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for table storage operations.
pub const TRACING_TARGET: &str = "stratus_table";

mod client;
mod entity;
mod query;
mod response;
mod service;
mod table;

#[doc(hidden)]
pub mod prelude;

pub use client::{TableClient, TableServiceContext, TableServiceQuery};
pub use entity::{DynamicTableEntity, EntityProperty, TableEntity};
pub use query::{MAX_TAKE, QueryComparison, TableQuery, TableQuerySegment};
pub use response::{ChangeResult, SaveChangesResponse};
pub use service::{ServiceQuerySource, TableServiceContextExt, TableServiceQueryExt};
pub use table::{TableClientExt, TableQuerySource};
