//! Proximity scorer (component B): turns a raw DFG hit-count vector into
//! the `(original, adjusted, covered, sparse, dense)` tuple spec.md section
//! 4.B describes, plus the two stable hashes derived from the dense map.

use super::hash::{hash_indices, hash_values};

/// Upper bound on the number of DFG nodes a single run can track (spec.md
/// section 6): `DAFL_DFG_SCORE` files with at least this many lines are a
/// fatal configuration error, not silently truncated.
pub const DFG_MAP_SIZE: usize = 65536;

/// Static per-DFG-node metadata, loaded once from the `DAFL_DFG_SCORE` file
/// (see spec.md section 6). Index `i` is the DFG node whose `file:line`
/// appeared on line `i` of that file.
#[derive(Debug, Clone, Default)]
pub struct DfgMap {
    /// Static score assigned to each DFG node by the instrumentation.
    pub score: Vec<u32>,
    /// Static path-count assigned to each DFG node.
    pub count: Vec<u64>,
}

impl DfgMap {
    pub fn len(&self) -> usize {
        self.score.len()
    }

    pub fn is_empty(&self) -> bool {
        self.score.is_empty()
    }

    fn score_at(&self, idx: usize) -> u32 {
        self.score.get(idx).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct ProximityScore {
    pub original: u64,
    pub adjusted: f64,
    pub covered: u32,
    pub sparse: Vec<u64>,
    pub dense: Vec<(u32, u64)>,
    pub dfg_path_hash: u64,
    pub valuation_hash: u64,
}

/// Computes proximity scores against a fixed `DfgMap`, tracking the
/// running-max normalizer used to bring `original` into `[0, 1)`.
///
/// The reference source leaves the normalization undocumented; spec.md
/// fixes it to running-max, with the explicit policy that a normalizer
/// update does *not* retroactively re-bucket seeds scored before it.
#[derive(Debug, Clone)]
pub struct ProximityScorer {
    dfg_map: DfgMap,
    normalizer: u64,
}

const ADJUSTED_EPSILON: f64 = 1e-9;

impl ProximityScorer {
    pub fn new(dfg_map: DfgMap) -> Self {
        Self {
            dfg_map,
            normalizer: 1,
        }
    }

    pub fn dfg_map(&self) -> &DfgMap {
        &self.dfg_map
    }

    /// Score a raw hit-count vector (index = DFG node, value = hit count).
    pub fn score(&mut self, hits: &[u64]) -> ProximityScore {
        let mut original: u64 = 0;
        let mut covered: u32 = 0;
        let mut dense = Vec::new();

        for (idx, &hit) in hits.iter().enumerate() {
            if hit == 0 {
                continue;
            }
            covered += 1;
            let static_score = self.dfg_map.score_at(idx) as u64;
            original = original.saturating_add(static_score.saturating_mul(hit));
            dense.push((idx as u32, hit));
        }
        // dense is already built in ascending index order since `hits` is iterated in order.

        let adjusted = (original as f64 / self.normalizer as f64).min(1.0 - ADJUSTED_EPSILON);
        self.normalizer = self.normalizer.max(original.max(1));

        let dfg_path_hash = hash_indices(&dense);
        let valuation_hash = hash_values(&dense);

        ProximityScore {
            original,
            adjusted,
            covered,
            sparse: hits.to_vec(),
            dense,
            dfg_path_hash,
            valuation_hash,
        }
    }
}
