//! Table queries and their result segments.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use stratus_core::{ContinuationToken, Error, Page, Result};

/// Largest number of entities a single query segment may return.
pub const MAX_TAKE: u32 = 1000;

/// Comparison operators of a filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueryComparison {
    /// Equal to (`eq`).
    #[strum(serialize = "eq")]
    Equal,
    /// Not equal to (`ne`).
    #[strum(serialize = "ne")]
    NotEqual,
    /// Greater than (`gt`).
    #[strum(serialize = "gt")]
    GreaterThan,
    /// Greater than or equal to (`ge`).
    #[strum(serialize = "ge")]
    GreaterThanOrEqual,
    /// Less than (`lt`).
    #[strum(serialize = "lt")]
    LessThan,
    /// Less than or equal to (`le`).
    #[strum(serialize = "le")]
    LessThanOrEqual,
}

/// A query against a single table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableQuery {
    /// Filter expression, e.g. `PartitionKey eq 'sensors'`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Properties to return; all when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    /// Maximum number of entities per segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<u32>,
}

impl TableQuery {
    /// Creates a query returning every entity of the table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the results to entities matching `filter`.
    /// 
    /// Build the expression with [`filter_condition`](Self::filter_condition)
    /// and [`and`](Self::and).
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Projects the results onto `columns`.
    pub fn with_select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Limits the number of entities returned per segment.
    pub fn with_take(mut self, take: u32) -> Self {
        self.take = Some(take);
        self
    }

    /// Builds a filter condition comparing a property with a string literal.
    ///
    /// Single quotes inside `value` are escaped.
    pub fn filter_condition(property: &str, comparison: QueryComparison, value: &str) -> String {
        format!("{property} {comparison} '{}'", value.replace('\'', "''"))
    }

    /// Joins two filter conditions with `and`.
    pub fn and(left: &str, right: &str) -> String {
        format!("({left}) and ({right})")
    }

    /// Checks the query before it is sent.
    pub fn validate(&self) -> Result<()> {
        match self.take {
            Some(take) if take == 0 || take > MAX_TAKE => Err(Error::invalid_input(format!(
                "take must be between 1 and {MAX_TAKE}, got {take}"
            ))),
            _ => Ok(()),
        }
    }
}

/// One segment of query results as returned by the table client.
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuerySegment<T> {
    /// Entities in this segment, in service order.
    pub results: Vec<T>,
    /// Token to request the next segment with; `None` on the last segment.
    pub continuation: Option<ContinuationToken>,
}

impl<T> TableQuerySegment<T> {
    /// Creates a segment from its results and continuation token.
    pub fn new(results: Vec<T>, continuation: Option<ContinuationToken>) -> Self {
        Self {
            results,
            continuation,
        }
    }

    /// Converts the segment into a [`Page`].
    pub fn into_page(self) -> Page<T> {
        Page::new(self.results, self.continuation)
    }
}

#[cfg(test)]
mod tests {
    use stratus_core::ErrorKind;

    use super::*;

    #[test]
    fn filter_condition_escapes_quotes() {
        let filter = TableQuery::filter_condition("Name", QueryComparison::Equal, "o'brien");
        assert_eq!(filter, "Name eq 'o''brien'");
    }

    #[test]
    fn combined_filters() {
        let left = TableQuery::filter_condition("PartitionKey", QueryComparison::Equal, "a");
        let right = TableQuery::filter_condition("RowKey", QueryComparison::GreaterThan, "m");

        assert_eq!(
            TableQuery::and(&left, &right),
            "(PartitionKey eq 'a') and (RowKey gt 'm')"
        );
    }

    #[test]
    fn take_bounds() {
        assert!(TableQuery::new().validate().is_ok());
        assert!(TableQuery::new().with_take(MAX_TAKE).validate().is_ok());

        let error = TableQuery::new().with_take(0).validate().unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
        assert!(TableQuery::new().with_take(MAX_TAKE + 1).validate().is_err());
    }

    #[test]
    fn segment_token_drives_page() {
        let last = TableQuerySegment::new(vec![1, 2], None).into_page();
        let more = TableQuerySegment::new(vec![3], Some(ContinuationToken::new("t"))).into_page();

        assert!(!last.has_more());
        assert!(more.has_more());
    }

    #[test]
    fn select_columns() {
        let query = TableQuery::new().with_select(["Name", "Value"]);
        assert_eq!(query.select.as_deref(), Some(&["Name".to_owned(), "Value".to_owned()][..]));
    }
}
