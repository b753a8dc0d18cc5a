//! Caps the number of open loads per terminal per calendar month.

use super::synthesizer::{LoadStatus, NewLoad};
use chrono::Datelike;
use std::collections::HashMap;

pub const DEFAULT_OPEN_LOAD_CAP: u32 = 10;

/// Tracks admitted open loads per `(terminal, year, month)`.
///
/// Loads proposed as open beyond the cap are downgraded to covered; no load
/// is ever dropped.
#[derive(Debug)]
pub struct LoadQuotaEnforcer {
    cap: u32,
    open_counts: HashMap<(i32, i32, u32), u32>,
    downgraded: u64,
}

impl Default for LoadQuotaEnforcer {
    fn default() -> Self {
        Self::new(DEFAULT_OPEN_LOAD_CAP)
    }
}

impl LoadQuotaEnforcer {
    pub fn new(cap: u32) -> Self {
        Self {
            cap,
            open_counts: HashMap::new(),
            downgraded: 0,
        }
    }

    /// Returns the status the load is admitted with.
    pub fn admit(
        &mut self,
        terminal_id: i32,
        year: i32,
        month: u32,
        proposed: LoadStatus,
    ) -> LoadStatus {
        if proposed != LoadStatus::Open {
            return proposed;
        }

        let count = self.open_counts.entry((terminal_id, year, month)).or_insert(0);
        if *count < self.cap {
            *count += 1;
            LoadStatus::Open
        } else {
            self.downgraded += 1;
            LoadStatus::Covered
        }
    }

    /// Applies the quota to a load draft in place, keyed by its pickup month.
    pub fn enforce(&mut self, load: &mut NewLoad) {
        load.status = self.admit(
            load.org.terminal_id,
            load.pickup_at.year(),
            load.pickup_at.month(),
            load.status,
        );
    }

    pub fn open_count(&self, terminal_id: i32, year: i32, month: u32) -> u32 {
        self.open_counts
            .get(&(terminal_id, year, month))
            .copied()
            .unwrap_or(0)
    }

    pub fn downgraded(&self) -> u64 {
        self.downgraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_is_downgraded_not_dropped() {
        let mut quota = LoadQuotaEnforcer::default();
        let admitted: Vec<LoadStatus> = (0..15)
            .map(|_| quota.admit(1, 2024, 3, LoadStatus::Open))
            .collect();

        assert_eq!(admitted.len(), 15);
        assert_eq!(admitted.iter().filter(|s| **s == LoadStatus::Open).count(), 10);
        assert_eq!(quota.downgraded(), 5);
        assert_eq!(quota.open_count(1, 2024, 3), 10);
    }

    #[test]
    fn counters_are_per_terminal_and_month() {
        let mut quota = LoadQuotaEnforcer::new(1);
        assert_eq!(quota.admit(1, 2024, 3, LoadStatus::Open), LoadStatus::Open);
        assert_eq!(quota.admit(1, 2024, 3, LoadStatus::Open), LoadStatus::Covered);
        assert_eq!(quota.admit(2, 2024, 3, LoadStatus::Open), LoadStatus::Open);
        assert_eq!(quota.admit(1, 2024, 4, LoadStatus::Open), LoadStatus::Open);
        assert_eq!(quota.admit(1, 2025, 3, LoadStatus::Open), LoadStatus::Open);
    }

    #[test]
    fn covered_loads_bypass_the_counter() {
        let mut quota = LoadQuotaEnforcer::new(0);
        assert_eq!(quota.admit(1, 2024, 3, LoadStatus::Covered), LoadStatus::Covered);
        assert_eq!(quota.open_count(1, 2024, 3), 0);
        assert_eq!(quota.downgraded(), 0);
    }
}
