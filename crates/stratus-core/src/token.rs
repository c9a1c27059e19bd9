//! Opaque continuation tokens.

use bytes::Bytes;
use derive_more::From;

/// Marker returned by a storage service to resume a segmented operation.
///
/// The token is owned by the remote service. It is only ever compared, cloned,
/// and passed back verbatim; nothing here inspects or builds one.
#[derive(Clone, PartialEq, Eq, Hash, From)]
pub struct ContinuationToken(Bytes);

impl ContinuationToken {
    /// Wraps the raw bytes handed out by the service.
    pub fn new(raw: impl Into<Bytes>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw bytes to pass back to the service.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the token and returns the raw bytes.
    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl std::fmt::Debug for ContinuationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinuationToken")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_contents() {
        let token = ContinuationToken::new("marker-secret");
        let debug = format!("{token:?}");

        assert!(!debug.contains("marker-secret"));
        assert!(debug.contains("13"));
    }

    #[test]
    fn equality_is_bytewise() {
        let a = ContinuationToken::new(vec![1u8, 2, 3]);
        let b = ContinuationToken::from(Bytes::from_static(&[1, 2, 3]));

        assert_eq!(a, b);
        assert_eq!(a.as_bytes(), &[1, 2, 3]);
    }
}
