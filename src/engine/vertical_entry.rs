//! Vertical equivalence class (component C), keyed by DFG-path hash.
//!
//! Mirrors `vertical_entry` in `afl-fuzz.h`: seeds that touch the same
//! set of DFG nodes (same `dfg_path_hash`) are grouped so the scheduler
//! can pick among them without conflating genuinely different paths.
//! The reference struct links seeds with an intrusive linked list and a
//! manual hashmap keyed on `value_map`; here both become plain
//! `FxHashMap`/`Vec<SeedId>` over the arena in `queue.rs`.

use super::ids::SeedId;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct VerticalEntry {
    pub dfg_path_hash: u64,
    /// Seeds still eligible for selection.
    active: Vec<SeedId>,
    /// Seeds retired from selection but kept for permanence/dedup lookups.
    old: Vec<SeedId>,
    /// valuation_hash -> seed already admitted with that exact valuation.
    value_map: FxHashMap<u64, SeedId>,
    pub use_count: u64,
    /// Adjusted score of the most recently added seed, used by `Horizontal`
    /// mode to match an entry to an interval-tree bucket.
    last_adjusted: f64,
}

impl VerticalEntry {
    pub fn new(dfg_path_hash: u64) -> Self {
        Self {
            dfg_path_hash,
            active: Vec::new(),
            old: Vec::new(),
            value_map: FxHashMap::default(),
            use_count: 0,
            last_adjusted: 0.0,
        }
    }

    pub fn last_adjusted(&self) -> f64 {
        self.last_adjusted
    }

    pub fn set_last_adjusted(&mut self, adjusted: f64) {
        self.last_adjusted = adjusted;
    }

    /// Testable property 3: within one entry, a given valuation hash maps
    /// to at most one admitted seed.
    pub fn seen_valuation(&self, valuation_hash: u64) -> Option<SeedId> {
        self.value_map.get(&valuation_hash).copied()
    }

    pub fn add(&mut self, valuation_hash: u64, id: SeedId) {
        self.active.push(id);
        self.value_map.insert(valuation_hash, id);
    }

    pub fn active(&self) -> &[SeedId] {
        &self.active
    }

    pub fn old(&self) -> &[SeedId] {
        &self.old
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.old.is_empty()
    }

    /// Move every active seed to the old tier, e.g. when the entry's
    /// bucket's productivity collapses and the scheduler moves on. Seeds
    /// are never dropped from the arena, only from the active list.
    /// Every active seed's valuation_hash is dropped from `value_map`
    /// (spec.md section 4.D `insert_to_old`), since every key in
    /// `value_map` belongs to a currently-active seed.
    pub fn retire_all(&mut self) {
        self.old.append(&mut self.active);
        self.value_map.clear();
    }

    /// Retires a single seed, removing its valuation_hash from
    /// `value_map` so the same valuation can be re-admitted on this path
    /// later (spec.md section 4.D `insert_to_old`).
    pub fn retire(&mut self, id: SeedId) {
        if let Some(pos) = self.active.iter().position(|&s| s == id) {
            let seed = self.active.remove(pos);
            self.value_map.retain(|_, &mut v| v != seed);
            self.old.push(seed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_map_dedups_within_an_entry() {
        let mut entry = VerticalEntry::new(0xABCD);
        entry.add(1, SeedId(0));
        assert_eq!(entry.seen_valuation(1), Some(SeedId(0)));
        assert_eq!(entry.seen_valuation(2), None);
        assert_eq!(entry.active(), &[SeedId(0)]);
    }

    #[test]
    fn retiring_moves_seed_from_active_to_old_without_losing_it() {
        let mut entry = VerticalEntry::new(1);
        entry.add(10, SeedId(3));
        entry.add(20, SeedId(4));
        entry.retire(SeedId(3));
        assert_eq!(entry.active(), &[SeedId(4)]);
        assert_eq!(entry.old(), &[SeedId(3)]);
        assert!(!entry.is_empty());
    }

    #[test]
    fn retiring_a_seed_frees_its_valuation_hash_for_reuse() {
        let mut entry = VerticalEntry::new(1);
        entry.add(10, SeedId(3));
        assert_eq!(entry.seen_valuation(10), Some(SeedId(3)));
        entry.retire(SeedId(3));
        assert_eq!(entry.seen_valuation(10), None);
    }

    #[test]
    fn retire_all_empties_active_into_old() {
        let mut entry = VerticalEntry::new(1);
        entry.add(1, SeedId(0));
        entry.add(2, SeedId(1));
        entry.retire_all();
        assert!(entry.active().is_empty());
        assert_eq!(entry.old().len(), 2);
    }

    #[test]
    fn retire_all_clears_the_entire_value_map() {
        let mut entry = VerticalEntry::new(1);
        entry.add(1, SeedId(0));
        entry.add(2, SeedId(1));
        entry.retire_all();
        assert_eq!(entry.seen_valuation(1), None);
        assert_eq!(entry.seen_valuation(2), None);
    }
}
