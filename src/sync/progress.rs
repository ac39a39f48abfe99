//! Per-artifact transfer progress

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Report interval when the total size is unknown
pub const UNKNOWN_SIZE_STEP: u64 = 16 * 1024 * 1024;

/// Percentage step between reports when the total size is known
pub const PERCENT_STEP: u64 = 10;

/// Byte counter for one transfer.
///
/// Cloned into the body stream; each clone updates the same counter. A
/// tracing event is emitted every `PERCENT_STEP` percent of a known total, or
/// every `UNKNOWN_SIZE_STEP` bytes otherwise.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    key: String,
    total: Option<u64>,
    transferred: AtomicU64,
}

impl TransferProgress {
    pub fn new(key: impl Into<String>, total: Option<u64>) -> Self {
        Self {
            inner: Arc::new(Inner {
                key: key.into(),
                total: total.filter(|t| *t > 0),
                transferred: AtomicU64::new(0),
            }),
        }
    }

    /// Record `n` more bytes
    pub fn advance(&self, n: u64) {
        let before = self.inner.transferred.fetch_add(n, Ordering::Relaxed);
        let after = before + n;
        if self.bucket_of(before) != self.bucket_of(after) {
            self.report(after);
        }
    }

    pub fn transferred(&self) -> u64 {
        self.inner.transferred.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> Option<u64> {
        self.inner.total
    }

    /// Percent complete, if the total is known
    pub fn percent(&self) -> Option<u64> {
        self.inner
            .total
            .map(|total| (self.transferred().min(total) * 100) / total)
    }

    /// Emit the final event
    pub fn finish(&self) {
        tracing::info!(
            key = %self.inner.key,
            bytes = self.transferred(),
            "transfer complete"
        );
    }

    fn bucket_of(&self, bytes: u64) -> u64 {
        match self.inner.total {
            Some(total) => (bytes.min(total) * 100 / total) / PERCENT_STEP,
            None => bytes / UNKNOWN_SIZE_STEP,
        }
    }

    fn report(&self, bytes: u64) {
        match self.inner.total {
            Some(total) => tracing::info!(
                key = %self.inner.key,
                bytes,
                total,
                "transferring {}%",
                bytes.min(total) * 100 / total
            ),
            None => tracing::info!(key = %self.inner.key, bytes, "transferring"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_across_clones() {
        let progress = TransferProgress::new("a.tgz", Some(100));
        let clone = progress.clone();
        progress.advance(30);
        clone.advance(25);
        assert_eq!(progress.transferred(), 55);
        assert_eq!(progress.percent(), Some(55));
    }

    #[test]
    fn test_unknown_total() {
        let progress = TransferProgress::new("a.tgz", None);
        progress.advance(UNKNOWN_SIZE_STEP + 1);
        assert_eq!(progress.percent(), None);
        assert_eq!(progress.transferred(), UNKNOWN_SIZE_STEP + 1);
    }

    #[test]
    fn test_zero_total_treated_as_unknown() {
        let progress = TransferProgress::new("empty", Some(0));
        assert_eq!(progress.total(), None);
    }

    #[test]
    fn test_percent_capped_when_source_overruns() {
        let progress = TransferProgress::new("a.tgz", Some(10));
        progress.advance(25);
        assert_eq!(progress.percent(), Some(100));
    }
}
