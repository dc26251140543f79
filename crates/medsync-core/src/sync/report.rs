//! Summary of one sync pass

use std::fmt;

use serde::Serialize;

/// What a sync pass changed, by decision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Remote-only records materialized locally
    pub pulled: usize,
    /// Local-only records created remotely
    pub pushed: usize,
    /// Records where the remote copy was newer
    pub updated_local: usize,
    /// Records where the local copy was newer
    pub updated_remote: usize,
    /// Tombstones cleared after the remote delete was confirmed
    pub purged: usize,
    /// Records with equal timestamps on both sides
    pub unchanged: usize,
}

impl SyncReport {
    /// True when the pass changed nothing on either side
    pub fn is_converged(&self) -> bool {
        self.changed() == 0
    }

    /// Number of records that changed on either side
    pub fn changed(&self) -> usize {
        self.pulled + self.pushed + self.updated_local + self.updated_remote + self.purged
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pulled, {} pushed, {} updated locally, {} updated remotely, {} purged, {} unchanged",
            self.pulled,
            self.pushed,
            self.updated_local,
            self.updated_remote,
            self.purged,
            self.unchanged
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_converged() {
        assert!(SyncReport::default().is_converged());
    }

    #[test]
    fn test_unchanged_does_not_count_as_change() {
        let report = SyncReport {
            unchanged: 4,
            ..Default::default()
        };
        assert!(report.is_converged());

        let report = SyncReport {
            purged: 1,
            unchanged: 4,
            ..Default::default()
        };
        assert!(!report.is_converged());
        assert_eq!(report.changed(), 1);
    }

    #[test]
    fn test_display() {
        let report = SyncReport {
            pulled: 1,
            pushed: 2,
            ..Default::default()
        };
        assert_eq!(
            report.to_string(),
            "1 pulled, 2 pushed, 0 updated locally, 0 updated remotely, 0 purged, 0 unchanged"
        );
    }
}
