//! Results of batched entity changes.

use serde::{Deserialize, Serialize};

/// Outcome of one entity operation inside a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeResult {
    /// HTTP status the service answered the operation with.
    pub status: u16,
    /// Entity tag of the written entity, absent for deletes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl ChangeResult {
    /// Creates the result of one operation.
    pub fn new(status: u16, etag: Option<String>) -> Self {
        Self { status, etag }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result of saving the pending changes of a table service context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveChangesResponse {
    /// Per-operation results, in the order the changes were tracked.
    #[serde(default)]
    pub results: Vec<ChangeResult>,
}

impl SaveChangesResponse {
    /// Wraps the per-operation results of a batch.
    pub fn new(results: Vec<ChangeResult>) -> Self {
        Self { results }
    }

    /// Number of operations that were sent.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if no operation was sent.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns true if every operation succeeded.
    pub fn is_success(&self) -> bool {
        self.results.iter().all(ChangeResult::is_success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_requires_every_operation() {
        let ok = SaveChangesResponse::new(vec![
            ChangeResult::new(201, Some("W/\"1\"".into())),
            ChangeResult::new(204, None),
        ]);
        let partial = SaveChangesResponse::new(vec![
            ChangeResult::new(204, None),
            ChangeResult::new(409, None),
        ]);

        assert!(ok.is_success());
        assert!(!partial.is_success());
        assert!(SaveChangesResponse::default().is_empty());
    }
}
