#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for segmented fetch aggregation.
///
/// Use this target for logging page fetches, progress, and aggregation outcomes.
pub const TRACING_TARGET_SEGMENT: &str = "stratus_core::segment";

/// Tracing target for the callback-to-future bridge.
///
/// Use this target for logging completions and cancellation hooks.
pub const TRACING_TARGET_CALLBACK: &str = "stratus_core::callback";

mod callback;
mod config;
mod error;
mod page;
mod progress;
mod segment;
mod source;
mod token;

#[doc(hidden)]
pub mod prelude;

pub use callback::{CancelHook, Completion, Pending, from_callback, with_cancellation};
pub use config::{MAX_PAGE_SIZE, SegmentConfig, validate_page_size};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use page::Page;
pub use progress::{Progress, ProgressChannel};
pub use segment::{Collected, PageStream, Segmented};
pub use source::{PageFn, PageSource, page_fn};
pub use token::ContinuationToken;
// Re-exported so callers do not need a direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
