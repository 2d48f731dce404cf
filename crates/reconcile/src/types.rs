//! Core types shared by every reconciliation operation

use serde::{Deserialize, Serialize};

/// Default number of concurrent remote mutations.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Outcome counts of a pull, push or delete.
///
/// Both the generic engine and the alert rules adapter report this shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Items pulled, pushed or deleted (or that would be, in a dry run).
    pub succeeded: usize,
    /// Items whose remote call failed.
    pub failed: usize,
}

impl Summary {
    pub fn new(succeeded: usize, failed: usize) -> Self {
        Self { succeeded, failed }
    }

    /// Check if every attempted item succeeded
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of items attempted
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &Summary) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}

/// Options shared by every mutating operation
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just count what would happen
    pub dry_run: bool,
    /// Abort on the first per-item failure
    pub stop_on_error: bool,
    /// Maximum number of remote calls in flight
    pub max_concurrency: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            stop_on_error: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_merge() {
        let mut a = Summary::new(2, 1);
        a.merge(&Summary::new(3, 0));
        assert_eq!(a, Summary::new(5, 1));
        assert_eq!(a.total(), 6);
        assert!(!a.is_success());
    }
}
