//! A single segment of a paginated listing or query.

use crate::token::ContinuationToken;
use crate::{Result, TRACING_TARGET_SEGMENT};

/// One bounded batch of results plus the state needed to fetch the next one.
///
/// A page has more results after it exactly when it carries a continuation
/// token. Services that report an explicit "has more" flag go through
/// [`Page::from_segment`], which folds the flag into the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    items: Vec<T>,
    continuation: Option<ContinuationToken>,
}

impl<T> Page<T> {
    /// Creates a page from a token-terminated segment.
    ///
    /// A `None` token marks the final page.
    pub fn new(items: Vec<T>, continuation: Option<ContinuationToken>) -> Self {
        Self {
            items,
            continuation,
        }
    }

    /// Creates the final page of a sequence.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    /// Creates a page from a flag-terminated segment.
    ///
    /// When the flag says there is nothing more, any token is discarded. When
    /// the flag claims more results but no token came back, the page is
    /// treated as final, since resuming without a token would restart from the
    /// first page.
    pub fn from_segment(
        items: Vec<T>,
        has_more: bool,
        continuation: Option<ContinuationToken>,
    ) -> Self {
        let continuation = match (has_more, continuation) {
            (true, Some(token)) => Some(token),
            (true, None) => {
                tracing::warn!(
                    target: TRACING_TARGET_SEGMENT,
                    items = items.len(),
                    "Segment reports more results without a continuation token, stopping"
                );
                None
            }
            (false, _) => None,
        };

        Self::new(items, continuation)
    }

    /// Returns the items in this page, in service order.
    #[inline]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Returns the token to request the next page with, if any.
    #[inline]
    pub fn continuation(&self) -> Option<&ContinuationToken> {
        self.continuation.as_ref()
    }

    /// Returns true if another page follows this one.
    #[inline]
    pub fn has_more(&self) -> bool {
        self.continuation.is_some()
    }

    /// Returns the number of items in this page.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if this page carries no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consumes the page and returns its items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Consumes the page and returns both the items and the token.
    pub fn into_parts(self) -> (Vec<T>, Option<ContinuationToken>) {
        (self.items, self.continuation)
    }

    /// Maps the items to a different type, keeping the token.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            continuation: self.continuation,
        }
    }

    /// Maps the items with a fallible conversion, failing on the first error.
    pub fn try_map<U, F>(self, f: F) -> Result<Page<U>>
    where
        F: FnMut(T) -> Result<U>,
    {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_>>()?,
            continuation: self.continuation,
        })
    }
}
