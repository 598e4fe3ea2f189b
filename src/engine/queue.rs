//! Seed queue (component F): an append-only arena of admitted seeds.
//!
//! Slot indices are stable for the lifetime of the run. A seed dropped
//! from its vertical entry's active list (promoted to `old_entries`) is
//! never removed here -- queue slots outlive active membership so logs
//! and replays stay valid (spec.md section 4.F).

use super::ids::SeedId;
use super::scorer::ProximityScore;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Seed {
    pub id: SeedId,
    pub input: Vec<u8>,
    pub dfg_path_hash: u64,
    pub valuation_hash: u64,
    pub original: u64,
    pub adjusted: f64,
    pub covered: u32,
    pub use_count: u32,
    pub created_at: Duration,
}

impl Seed {
    pub fn from_score(id: SeedId, input: Vec<u8>, score: &ProximityScore, created_at: Duration) -> Self {
        Self {
            id,
            input,
            dfg_path_hash: score.dfg_path_hash,
            valuation_hash: score.valuation_hash,
            original: score.original,
            adjusted: score.adjusted,
            covered: score.covered,
            use_count: 0,
            created_at,
        }
    }
}

#[derive(Debug, Default)]
pub struct SeedQueue {
    seeds: Vec<Seed>,
}

impl SeedQueue {
    pub fn new() -> Self {
        Self { seeds: Vec::new() }
    }

    pub fn push(&mut self, input: Vec<u8>, score: &ProximityScore, created_at: Duration) -> SeedId {
        let id = SeedId(self.seeds.len() as u32);
        self.seeds.push(Seed::from_score(id, input, score, created_at));
        id
    }

    pub fn get(&self, id: SeedId) -> &Seed {
        &self.seeds[id.index()]
    }

    pub fn get_mut(&mut self, id: SeedId) -> &mut Seed {
        &mut self.seeds[id.index()]
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seed> {
        self.seeds.iter()
    }
}
