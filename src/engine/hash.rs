//! Fast mixing hashes for dfg-path and valuation fingerprints.
//!
//! Spec only requires a fast hash that is stable within a single run
//! (see spec.md section 4.B). We reuse `rustc_hash::FxHasher`, already a
//! dependency of the teacher crate, rather than pulling in `fnv`/`xxhash`.

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Hash of the set of touched DFG indices (the dfg-path fingerprint).
pub fn hash_indices(dense: &[(u32, u64)]) -> u64 {
    let mut h = FxHasher::default();
    for &(idx, _) in dense {
        h.write_u32(idx);
    }
    h.finish()
}

/// Hash of the (index, count) pairs observed along a DFG path (the
/// valuation fingerprint: distinguishes executions sharing a path but
/// diverging in loop counts).
pub fn hash_values(dense: &[(u32, u64)]) -> u64 {
    let mut h = FxHasher::default();
    for &(idx, count) in dense {
        h.write_u32(idx);
        h.write_u64(count);
    }
    h.finish()
}
