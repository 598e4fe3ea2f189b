//! Admission controller (component E): decides whether a freshly scored
//! candidate joins the seed corpus, per one of seven policies mirroring
//! `AddQueueMode` in `afl-fuzz.h`.

use super::ids::SeedId;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionPolicy {
    /// Admit candidates that open a new edge in the global coverage bitmap.
    Default,
    /// Admit only candidates whose valuation hash hasn't been seen before, globally.
    UniqueValue,
    /// Admit only candidates whose valuation hash hasn't been seen before on its DFG path.
    UniqueValuePerPath,
    /// Admit everything.
    All,
    /// Admit nothing (scoring-only / measurement mode).
    None,
    /// `UniqueValuePerPath`, but only while the scheduler is in vertical mode.
    UniqueValuePerPathInVertical,
    /// `UniqueValuePerPathInVertical`, plus `Default`'s new-edge rule.
    UniqueValuePerPathInVerticalPlusDefault,
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub input: Vec<u8>,
    pub hits: Vec<u64>,
    pub new_edges: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit,
    /// Rejected, but the candidate still gets half-weight credit in the
    /// interval tree for having been "useful" (touched a known path).
    RejectUseful,
    Reject,
}

#[derive(Debug, Default)]
pub struct AdmissionController {
    policy_value_hashes: FxHashSet<u64>,
}

impl AdmissionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// `seen_in_path` is `Some(existing seed)` when `valuation_hash` has
    /// already been recorded for this candidate's vertical entry.
    pub fn decide(
        &mut self,
        policy: AdmissionPolicy,
        candidate: &Candidate,
        valuation_hash: u64,
        seen_in_path: Option<SeedId>,
        in_vertical_mode: bool,
    ) -> Decision {
        let globally_seen = self.policy_value_hashes.contains(&valuation_hash);

        let decision = match policy {
            // ALL(3) = DEFAULT(0) or UNIQUE_VAL_PER_PATH(2).
            AdmissionPolicy::All => {
                if candidate.new_edges || seen_in_path.is_none() {
                    Decision::Admit
                } else {
                    Decision::RejectUseful
                }
            }
            AdmissionPolicy::None => Decision::Reject,
            AdmissionPolicy::Default => {
                if candidate.new_edges {
                    Decision::Admit
                } else {
                    Decision::RejectUseful
                }
            }
            AdmissionPolicy::UniqueValue => {
                if globally_seen {
                    Decision::RejectUseful
                } else {
                    Decision::Admit
                }
            }
            AdmissionPolicy::UniqueValuePerPath => {
                if seen_in_path.is_some() {
                    Decision::RejectUseful
                } else {
                    Decision::Admit
                }
            }
            // Admit only when Mode is VER and (2) holds; otherwise reject.
            AdmissionPolicy::UniqueValuePerPathInVertical => {
                if in_vertical_mode && seen_in_path.is_none() {
                    Decision::Admit
                } else {
                    Decision::RejectUseful
                }
            }
            // (5) or DEFAULT(0).
            AdmissionPolicy::UniqueValuePerPathInVerticalPlusDefault => {
                if candidate.new_edges || (in_vertical_mode && seen_in_path.is_none()) {
                    Decision::Admit
                } else {
                    Decision::RejectUseful
                }
            }
        };

        if decision == Decision::Admit {
            self.policy_value_hashes.insert(valuation_hash);
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(new_edges: bool) -> Candidate {
        Candidate {
            input: vec![1, 2, 3],
            hits: vec![1, 0, 1],
            new_edges,
        }
    }

    #[test]
    fn default_policy_admits_only_new_edges() {
        let mut ctrl = AdmissionController::new();
        assert_eq!(
            ctrl.decide(AdmissionPolicy::Default, &candidate(true), 1, None, false),
            Decision::Admit
        );
        assert_eq!(
            ctrl.decide(AdmissionPolicy::Default, &candidate(false), 2, None, false),
            Decision::RejectUseful
        );
    }

    #[test]
    fn none_policy_always_rejects() {
        let mut ctrl = AdmissionController::new();
        assert_eq!(
            ctrl.decide(AdmissionPolicy::None, &candidate(true), 1, None, false),
            Decision::Reject
        );
    }

    #[test]
    fn unique_value_rejects_repeat_valuation_globally() {
        let mut ctrl = AdmissionController::new();
        assert_eq!(
            ctrl.decide(AdmissionPolicy::UniqueValue, &candidate(false), 7, None, false),
            Decision::Admit
        );
        assert_eq!(
            ctrl.decide(AdmissionPolicy::UniqueValue, &candidate(false), 7, None, false),
            Decision::RejectUseful
        );
    }

    #[test]
    fn unique_value_per_path_only_checks_local_path() {
        let mut ctrl = AdmissionController::new();
        // Same valuation hash, but no prior sighting on this path: admitted.
        assert_eq!(
            ctrl.decide(AdmissionPolicy::UniqueValuePerPath, &candidate(false), 7, None, false),
            Decision::Admit
        );
        assert_eq!(
            ctrl.decide(
                AdmissionPolicy::UniqueValuePerPath,
                &candidate(false),
                7,
                Some(SeedId(0)),
                false
            ),
            Decision::RejectUseful
        );
    }

    #[test]
    fn unique_value_per_path_in_vertical_only_admits_in_vertical_mode_with_new_valuation() {
        let mut ctrl = AdmissionController::new();
        // Outside VER mode, the admit condition is false regardless of
        // seen_in_path: the policy only admits while exploiting a path.
        assert_eq!(
            ctrl.decide(AdmissionPolicy::UniqueValuePerPathInVertical, &candidate(false), 7, None, false),
            Decision::RejectUseful
        );
        // In VER mode with a fresh valuation on this path: admitted.
        assert_eq!(
            ctrl.decide(AdmissionPolicy::UniqueValuePerPathInVertical, &candidate(false), 7, None, true),
            Decision::Admit
        );
        // In VER mode but the valuation already exists on this path: rejected.
        assert_eq!(
            ctrl.decide(
                AdmissionPolicy::UniqueValuePerPathInVertical,
                &candidate(false),
                8,
                Some(SeedId(0)),
                true
            ),
            Decision::RejectUseful
        );
    }

    // Testable property 6: admitting the same (edge_bitmap, dfg_vector)
    // twice yields exactly one queue entry under policies 1, 2, 3, 5, 6.
    #[test]
    fn all_policy_rejects_a_repeat_valuation_on_the_same_path_without_new_edges() {
        let mut ctrl = AdmissionController::new();
        assert_eq!(
            ctrl.decide(AdmissionPolicy::All, &candidate(false), 7, None, false),
            Decision::Admit
        );
        assert_eq!(
            ctrl.decide(AdmissionPolicy::All, &candidate(false), 7, Some(SeedId(0)), false),
            Decision::RejectUseful
        );
    }

    #[test]
    fn unique_value_per_path_in_vertical_plus_default_falls_back_to_default_outside_vertical() {
        let mut ctrl = AdmissionController::new();
        // HOR mode, no new edge, valuation already on this path: both (5)
        // and (0) are false, so this must reject.
        assert_eq!(
            ctrl.decide(
                AdmissionPolicy::UniqueValuePerPathInVerticalPlusDefault,
                &candidate(false),
                7,
                Some(SeedId(0)),
                false
            ),
            Decision::RejectUseful
        );
        // HOR mode, but the candidate opened a new edge: (0) holds.
        assert_eq!(
            ctrl.decide(
                AdmissionPolicy::UniqueValuePerPathInVerticalPlusDefault,
                &candidate(true),
                8,
                Some(SeedId(0)),
                false
            ),
            Decision::Admit
        );
        // VER mode with a fresh valuation on this path: (5) holds.
        assert_eq!(
            ctrl.decide(
                AdmissionPolicy::UniqueValuePerPathInVerticalPlusDefault,
                &candidate(false),
                9,
                None,
                true
            ),
            Decision::Admit
        );
    }
}
