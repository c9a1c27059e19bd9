//! In-memory implementations of the blob and table client traits.
//!
//! Every mock answers `begin_*` calls from shared in-memory state. State
//! changes are applied when the operation begins; only the delivery of the
//! result is delayed when latency is configured.

mod blob;
mod table;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub use blob::{MockBlob, MockBlobContainer, MockBlobDirectory};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use stratus_core::{CancelHook, Completion, ContinuationToken, Error, ErrorKind, Result};
pub use table::{MockTable, MockTableServiceContext, MockTableServiceQuery};

/// Configuration for the mock storage services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MockStorageConfig {
    /// Simulated latency of every operation in milliseconds (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "mock-latency-ms", env = "STRATUS_MOCK_LATENCY_MS")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,

    /// Largest segment returned, whatever page size is requested (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "mock-max-segment", env = "STRATUS_MOCK_MAX_SEGMENT")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_segment: Option<u32>,
}

impl MockStorageConfig {
    /// Delays every result by `latency`, saturating at `u64::MAX` milliseconds.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency_ms = Some(u64::try_from(latency.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Caps every listing or query segment at `max_segment` entries.
    pub fn with_max_segment(mut self, max_segment: u32) -> Self {
        self.max_segment = Some(max_segment);
        self
    }

    fn latency(&self) -> Option<Duration> {
        self.latency_ms.map(Duration::from_millis)
    }

    fn segment_size(&self, requested: u32) -> usize {
        let size = match self.max_segment {
            Some(max) => requested.min(max),
            None => requested,
        };
        size.max(1) as usize
    }
}

/// Request counters of a mock service.
#[derive(Debug, Default)]
pub struct MockStats {
    requests: AtomicUsize,
    segment_requests: AtomicUsize,
    cancellations: AtomicUsize,
    fail_segment_at: Mutex<Option<(usize, ErrorKind)>>,
}

impl MockStats {
    /// Number of operations started.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of listing or query segments requested.
    pub fn segment_requests(&self) -> usize {
        self.segment_requests.load(Ordering::SeqCst)
    }

    /// Number of operations whose cancel hook fired.
    pub fn cancellations(&self) -> usize {
        self.cancellations.load(Ordering::SeqCst)
    }

    /// Makes the `request`-th segment request (1-based) fail with `kind`.
    pub fn fail_segment_at(&self, request: usize, kind: ErrorKind) {
        *lock(&self.fail_segment_at) = Some((request, kind));
    }

    fn record(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    /// Counts a segment request and returns the injected failure, if any.
    fn record_segment(&self) -> Option<Error> {
        self.record();
        let request = self.segment_requests.fetch_add(1, Ordering::SeqCst) + 1;

        match *lock(&self.fail_segment_at) {
            Some((at, kind)) if at == request => Some(
                Error::new(kind).with_message(format!("injected failure at segment {request}")),
            ),
            _ => None,
        }
    }
}

/// Delivers `result` to `done`, immediately or after the configured latency.
fn dispatch<T>(
    config: &MockStorageConfig,
    stats: &Arc<MockStats>,
    done: Completion<T>,
    result: Result<T>,
) -> CancelHook
where
    T: Send + 'static,
{
    let Some(latency) = config.latency() else {
        done.complete(result);
        return CancelHook::none();
    };

    let task = tokio::spawn(async move {
        tokio::time::sleep(latency).await;
        done.complete(result);
    });

    let stats = Arc::clone(stats);
    CancelHook::new(move || {
        task.abort();
        stats.cancellations.fetch_add(1, Ordering::SeqCst);
    })
}

/// Returns the window of `entries` a segment request covers.
fn segment<T: Clone>(
    entries: &[T],
    continuation: Option<&ContinuationToken>,
    size: usize,
) -> Result<(Vec<T>, Option<ContinuationToken>)> {
    let start = match continuation {
        Some(token) => parse_offset(token)?,
        None => 0,
    };

    let end = (start + size).min(entries.len());
    let window = entries.get(start..end).unwrap_or_default().to_vec();
    let next = (end < entries.len()).then(|| ContinuationToken::new(end.to_string()));

    Ok((window, next))
}

fn parse_offset(token: &ContinuationToken) -> Result<usize> {
    std::str::from_utf8(token.as_bytes())
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| Error::invalid_input("malformed continuation token"))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_follow_offsets() {
        let entries: Vec<u32> = (0..5).collect();

        let (first, token) = segment(&entries, None, 2).unwrap();
        assert_eq!(first, vec![0, 1]);

        let (second, token) = segment(&entries, token.as_ref(), 2).unwrap();
        assert_eq!(second, vec![2, 3]);

        let (last, token) = segment(&entries, token.as_ref(), 2).unwrap();
        assert_eq!(last, vec![4]);
        assert!(token.is_none());
    }

    #[test]
    fn malformed_token_is_rejected() {
        let error = segment(&[1], Some(&ContinuationToken::new("zz")), 1).unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn injected_failure_hits_one_request() {
        let stats = MockStats::default();
        stats.fail_segment_at(2, ErrorKind::Network);

        assert!(stats.record_segment().is_none());
        assert_eq!(stats.record_segment().map(|e| e.kind), Some(ErrorKind::Network));
        assert!(stats.record_segment().is_none());
        assert_eq!(stats.segment_requests(), 3);
    }

    #[test]
    fn latency_saturates() {
        let config = MockStorageConfig::default().with_latency(Duration::MAX);
        assert_eq!(config.latency_ms, Some(u64::MAX));

        let config = MockStorageConfig::default().with_latency(Duration::from_millis(250));
        assert_eq!(config.latency(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn segment_size_is_capped() {
        let config = MockStorageConfig::default().with_max_segment(10);

        assert_eq!(config.segment_size(5000), 10);
        assert_eq!(config.segment_size(3), 3);
        assert_eq!(MockStorageConfig::default().segment_size(5000), 5000);
    }
}
