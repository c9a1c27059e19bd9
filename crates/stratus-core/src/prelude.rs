//! Prelude module for convenient imports.

pub use crate::callback::{CancelHook, Completion, from_callback};
pub use crate::config::SegmentConfig;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::page::Page;
pub use crate::progress::{Progress, ProgressChannel};
pub use crate::segment::{Collected, Segmented};
pub use crate::source::{PageSource, page_fn};
pub use crate::token::ContinuationToken;
pub use crate::CancellationToken;
