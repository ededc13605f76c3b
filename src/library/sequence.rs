use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing request tokens for a view. A fetch records the
/// token it was issued with; when its response arrives, the result is
/// applied only if that token is still the latest. This replaces implicit
/// last-callback-wins with explicit sequencing, so a stale response can
/// never overwrite a newer one.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token, invalidating all previously issued ones.
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a result carrying this token should still be applied.
    pub fn is_current(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_issue_invalidates_older_token() {
        let seq = RequestSequencer::new();
        let first = seq.issue();
        assert!(seq.is_current(first));

        let second = seq.issue();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn stale_response_after_two_navigations_is_discarded() {
        let seq = RequestSequencer::new();
        let a = seq.issue();
        let b = seq.issue();
        let c = seq.issue();

        // Responses arrive out of order: c, then a, then b.
        assert!(seq.is_current(c));
        assert!(!seq.is_current(a));
        assert!(!seq.is_current(b));
    }
}
