//! Collection run models

use std::collections::HashSet;

use super::{Observation, ObservationDate};

/// Outcome of one Collector sweep, handed to the Writer and then the Verifier.
///
/// Every input asset lands in exactly one of `success`, `failed` or `skipped`.
/// `skipped` is never filled today; it is reserved for pre-filtering.
#[derive(Debug, Clone)]
pub struct CollectionResult {
    pub success: Vec<Observation>,
    pub failed: Vec<i64>,
    pub skipped: Vec<i64>,
    pub target_date: ObservationDate,
}

impl CollectionResult {
    pub fn new(target_date: ObservationDate) -> Self {
        Self {
            success: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            target_date,
        }
    }

    /// True when no asset id appears twice across the three outcome lists
    pub fn is_partitioned(&self) -> bool {
        let mut seen = HashSet::new();
        self.success
            .iter()
            .map(|o| o.asset_id)
            .chain(self.failed.iter().copied())
            .chain(self.skipped.iter().copied())
            .all(|id| seen.insert(id))
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            target_date: self.target_date,
            succeeded: self.success.len(),
            failed: self.failed.len(),
            skipped: self.skipped.len(),
        }
    }
}

/// Counts logged at the end of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub target_date: ObservationDate,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}
