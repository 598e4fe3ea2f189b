//! Vertical manager (component D): owns every `VerticalEntry`, the
//! interval tree over their proximity buckets, and the HOR/VER/EXP mode
//! switch.
//!
//! Grounded on `vertical_manager` in `afl-fuzz.h` and the `VerticalMode`
//! enum (`M_HOR = 0`, `M_VER = 1`, `M_EXP = 2`). The reference source
//! keeps `vertical_entry` records in a manual hashmap plus a
//! singly-linked "old" list; here the arena in this struct plays both
//! roles, indexed by the stable `EntryId`.

use super::clock::Clock;
use super::ids::EntryId;
use super::interval_tree::IntervalTree;
use super::vertical_entry::VerticalEntry;
use rand::Rng;
use rustc_hash::FxHashMap;
use std::time::Duration;

/// Scheduling mode, mirroring `VerticalMode` in the reference source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Horizontal: spread attempts across many vertical entries, biased
    /// by the interval tree.
    Horizontal,
    /// Vertical: concentrate on the head of the sorted active list.
    Vertical,
    /// Exploration: retry retired (`old`) seeds to rescue stalled paths.
    Exploration,
}

/// Hysteresis thresholds (spec.md section 4.D).
pub const T_HOR: Duration = Duration::from_secs(60);
pub const T_VER: Duration = Duration::from_secs(30);
pub const T_EXP: Duration = Duration::from_secs(20);
/// Picks from the current VER entry allowed before giving up on it.
pub const K_VER: u32 = 8;

pub struct VerticalManager {
    map: FxHashMap<u64, EntryId>,
    arena: Vec<VerticalEntry>,
    /// Entries with at least one active seed, sorted ascending by
    /// `use_count` (spec.md section 4.C "sorted insertion").
    head: Vec<EntryId>,
    /// Entries whose active tier has been fully retired.
    old: Vec<EntryId>,
    tree: IntervalTree,

    mode: Mode,
    prev_time: Duration,
    /// The entry `Vertical` mode is currently exploiting.
    current_ver_entry: Option<EntryId>,
    /// Picks from `current_ver_entry` since its last admitted seed.
    ver_uses_without_admission: u32,
    /// Set when an admission lands on a seed drawn from `old` while in
    /// `Exploration` mode; consumed by the next `select_mode` call.
    admitted_from_old: bool,
}

impl VerticalManager {
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            arena: Vec::new(),
            head: Vec::new(),
            old: Vec::new(),
            tree: IntervalTree::new(),
            mode: Mode::Horizontal,
            prev_time: Duration::ZERO,
            current_ver_entry: None,
            ver_uses_without_admission: 0,
            admitted_from_old: false,
        }
    }

    pub fn tree(&self) -> &IntervalTree {
        &self.tree
    }

    pub fn entry(&self, id: EntryId) -> &VerticalEntry {
        &self.arena[id.index()]
    }

    pub fn entry_mut(&mut self, id: EntryId) -> &mut VerticalEntry {
        &mut self.arena[id.index()]
    }

    /// Pure mode read; transitions only happen in [`select_mode`].
    pub fn get_mode(&self) -> Mode {
        self.mode
    }

    /// Look up or create the vertical entry for `dfg_path_hash`, crediting
    /// the interval tree bucket for `adjusted` with `original`. Returns
    /// the entry id and whether this created a brand-new entry.
    pub fn lookup_or_insert(&mut self, dfg_path_hash: u64, adjusted: f64, original: u64) -> (EntryId, bool) {
        let bucket = IntervalTree::quantize(adjusted);
        self.tree.insert(bucket, original);

        if let Some(&id) = self.map.get(&dfg_path_hash) {
            return (id, false);
        }

        let id = EntryId(self.arena.len() as u32);
        self.arena.push(VerticalEntry::new(dfg_path_hash));
        self.map.insert(dfg_path_hash, id);
        self.sorted_insert(id);
        (id, true)
    }

    /// Splice `id` into `head`, ordered ascending by `use_count` then
    /// descending by the entry's most recent `adjusted` score, per
    /// spec.md section 4.C.
    pub fn sorted_insert(&mut self, id: EntryId) {
        if let Some(pos) = self.head.iter().position(|&e| e == id) {
            self.head.remove(pos);
        }
        let use_count = self.entry(id).use_count;
        let adjusted = self.entry(id).last_adjusted();
        let pos = self
            .head
            .iter()
            .position(|&e| {
                let other = self.entry(e);
                other.use_count > use_count || (other.use_count == use_count && other.last_adjusted() < adjusted)
            })
            .unwrap_or(self.head.len());
        self.head.insert(pos, id);
    }

    /// Record an admission against the entry it landed in, resetting the
    /// VER stall counter and the EXP "admitted from old" trigger.
    pub fn note_admission(&mut self, id: EntryId, drawn_from_old: bool) {
        if self.mode == Mode::Vertical && self.current_ver_entry == Some(id) {
            self.ver_uses_without_admission = 0;
        }
        if self.mode == Mode::Exploration && drawn_from_old {
            self.admitted_from_old = true;
        }
        self.sorted_insert(id);
    }

    pub fn insert_to_old(&mut self, id: EntryId) {
        if let Some(pos) = self.head.iter().position(|&e| e == id) {
            self.head.remove(pos);
        }
        self.entry_mut(id).retire_all();
        if !self.old.contains(&id) {
            self.old.push(id);
        }
        if self.current_ver_entry == Some(id) {
            self.current_ver_entry = None;
        }
    }

    fn fleet_median_use_count(&self) -> u64 {
        if self.head.is_empty() {
            return 0;
        }
        let mut counts: Vec<u64> = self.head.iter().map(|&e| self.entry(e).use_count).collect();
        counts.sort_unstable();
        counts[counts.len() / 2]
    }

    /// Re-evaluate the mode given the current clock reading, per the
    /// transition rules in spec.md section 4.D.
    pub fn select_mode(&mut self, clock: &dyn Clock) -> Mode {
        let now = clock.now();
        let elapsed = now.saturating_sub(self.prev_time);

        match self.mode {
            Mode::Horizontal => {
                let median = self.fleet_median_use_count();
                // At or below, not strictly below: with a single active
                // entry its own use_count trivially equals the median, and
                // spec.md doesn't say a lone entry should be ineligible.
                let eligible = self.head.iter().any(|&e| self.entry(e).use_count <= median);
                if elapsed > T_HOR && eligible {
                    self.mode = Mode::Vertical;
                    self.prev_time = now;
                    self.current_ver_entry = self.head.first().copied();
                    self.ver_uses_without_admission = 0;
                }
            }
            Mode::Vertical => {
                if self.ver_uses_without_admission > K_VER || elapsed > T_VER {
                    self.mode = Mode::Exploration;
                    self.prev_time = now;
                    self.admitted_from_old = false;
                }
            }
            Mode::Exploration => {
                if elapsed > T_EXP || self.admitted_from_old {
                    self.mode = Mode::Horizontal;
                    self.prev_time = now;
                    self.admitted_from_old = false;
                }
            }
        }

        self.mode
    }

    /// Pick a vertical entry to draw a seed from, per the current mode.
    pub fn select_entry<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<EntryId> {
        match self.mode {
            Mode::Horizontal => {
                let bucket = self.tree.select(rng);
                self.entries_in_bucket_or_head(bucket, rng)
            }
            Mode::Vertical => {
                let id = self
                    .current_ver_entry
                    .filter(|&e| !self.entry(e).active().is_empty())
                    .or_else(|| self.head.iter().find(|&&e| !self.entry(e).active().is_empty()).copied());
                if let Some(id) = id {
                    self.current_ver_entry = Some(id);
                    self.ver_uses_without_admission += 1;
                }
                id
            }
            Mode::Exploration => {
                if self.old.is_empty() {
                    self.mode = Mode::Horizontal;
                    self.select_entry(rng)
                } else {
                    let idx = rng.random_range(0..self.old.len());
                    Some(self.old[idx])
                }
            }
        }
    }

    /// Among entries with an active seed whose adjusted score quantizes
    /// into `bucket`, pick the one with the lowest `use_count`; fall back
    /// to any head entry with active seeds if none quantize into it.
    fn entries_in_bucket_or_head<R: Rng + ?Sized>(&self, bucket: usize, _rng: &mut R) -> Option<EntryId> {
        let in_bucket = self.head.iter().find(|&&e| {
            let entry = self.entry(e);
            !entry.active().is_empty() && IntervalTree::quantize(entry.last_adjusted()) == bucket
        });
        in_bucket
            .copied()
            .or_else(|| self.head.iter().find(|&&e| !self.entry(e).active().is_empty()).copied())
    }

    pub fn head_len(&self) -> usize {
        self.head.len()
    }

    /// Snapshot of `head` in its current sort order, for tests and the
    /// `inspect` CLI.
    pub fn head_order(&self) -> Vec<EntryId> {
        self.head.clone()
    }

    pub fn old_len(&self) -> usize {
        self.old.len()
    }
}

impl Default for VerticalManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::FakeClock;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn lookup_or_insert_dedups_by_dfg_path_hash() {
        let mut mgr = VerticalManager::new();
        let (a, created_a) = mgr.lookup_or_insert(0xAAAA, 0.5, 10);
        let (b, created_b) = mgr.lookup_or_insert(0xAAAA, 0.6, 12);
        assert!(created_a);
        assert!(!created_b);
        assert_eq!(a, b);
        assert_eq!(mgr.head_len(), 1);
    }

    // spec.md section 4.C: head stays sorted ascending by use_count; a
    // stale sort key (one not re-spliced after changing) would leave a
    // now-higher-use_count entry ahead of a lower one.
    #[test]
    fn sorted_insert_reorders_head_when_use_count_changes() {
        let mut mgr = VerticalManager::new();
        let (a, _) = mgr.lookup_or_insert(1, 0.1, 1);
        let (b, _) = mgr.lookup_or_insert(2, 0.1, 1);
        assert_eq!(mgr.head_order(), vec![a, b]);

        mgr.entry_mut(a).use_count += 5;
        mgr.sorted_insert(a);
        assert_eq!(mgr.head_order(), vec![b, a]);
    }

    // Scenario S4: after T_hor seconds with an eligible entry, HOR -> VER.
    #[test]
    fn mode_switches_to_vertical_after_t_hor_with_eligible_entry() {
        let clock = FakeClock::new();
        let mut mgr = VerticalManager::new();
        mgr.lookup_or_insert(1, 0.1, 1);
        assert_eq!(mgr.get_mode(), Mode::Horizontal);

        clock.advance(T_HOR + Duration::from_secs(1));
        assert_eq!(mgr.select_mode(&clock), Mode::Vertical);
    }

    // Scenario S5: K_ver picks from the VER entry without an admission
    // pushes the manager into Exploration.
    #[test]
    fn stalling_in_vertical_mode_falls_to_exploration() {
        let clock = FakeClock::new();
        let mut mgr = VerticalManager::new();
        mgr.lookup_or_insert(1, 0.1, 1);
        clock.advance(T_HOR + Duration::from_secs(1));
        assert_eq!(mgr.select_mode(&clock), Mode::Vertical);

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..=K_VER {
            mgr.select_entry(&mut rng);
        }
        assert_eq!(mgr.select_mode(&clock), Mode::Exploration);
    }

    // Scenario S6: with `old` empty, Exploration falls through to HOR.
    #[test]
    fn exploration_falls_through_to_horizontal_when_old_is_empty() {
        let mut mgr = VerticalManager::new();
        mgr.lookup_or_insert(1, 0.1, 1);
        // Force exploration mode directly for the test.
        mgr.mode = Mode::Exploration;
        let mut rng = StdRng::seed_from_u64(4);
        let picked = mgr.select_entry(&mut rng);
        assert!(picked.is_some());
        assert_eq!(mgr.get_mode(), Mode::Horizontal);
    }

    #[test]
    fn insert_to_old_moves_entry_out_of_head() {
        let mut mgr = VerticalManager::new();
        let (id, _) = mgr.lookup_or_insert(5, 0.2, 2);
        mgr.insert_to_old(id);
        assert_eq!(mgr.head_len(), 0);
        assert_eq!(mgr.old_len(), 1);
    }
}
