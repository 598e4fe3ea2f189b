//! Top-level scheduler: owns one of each component and exposes the
//! `submit` / `select_mode` / `select_entry` / `pick_seed` operations
//! spec.md section 5 describes as the scheduler's concurrency-free
//! control loop. A CLI replay driver (see `commands::run`) calls these
//! directly in place of forking and executing a target.

use super::admission::{AdmissionController, AdmissionPolicy, Candidate, Decision};
use super::clock::Clock;
use super::ids::{EntryId, SeedId};
use super::queue::SeedQueue;
use super::scorer::{DfgMap, ProximityScorer};
use super::vertical_manager::{Mode, VerticalManager};
use rand::Rng;

pub struct Scheduler {
    scorer: ProximityScorer,
    manager: VerticalManager,
    queue: SeedQueue,
    admission: AdmissionController,
    clock: Box<dyn Clock>,
    policy: AdmissionPolicy,
    /// Set by `pick_seed` when the drawn entry came from `Exploration`
    /// mode's `old` list, consumed by the next `submit` to feed
    /// `VerticalManager::note_admission`'s "admitted from old" trigger.
    last_pick_was_exploration: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Admitted(SeedId),
    Rejected,
}

impl Scheduler {
    pub fn new(dfg_map: DfgMap, policy: AdmissionPolicy, clock: Box<dyn Clock>) -> Self {
        Self {
            scorer: ProximityScorer::new(dfg_map),
            manager: VerticalManager::new(),
            queue: SeedQueue::new(),
            admission: AdmissionController::new(),
            clock,
            policy,
            last_pick_was_exploration: false,
        }
    }

    pub fn select_mode(&mut self) -> Mode {
        self.manager.select_mode(self.clock.as_ref())
    }

    pub fn select_entry<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<EntryId> {
        let mode_before = self.manager.get_mode();
        let picked = self.manager.select_entry(rng);
        self.last_pick_was_exploration = mode_before == Mode::Exploration && picked.is_some();
        picked
    }

    /// Pick a seed to mutate next: selects a mode, an entry within that
    /// mode, then a seed within the entry's active tier (lowest
    /// `use_count`, per spec.md section 4.C).
    pub fn pick_seed<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<SeedId> {
        self.select_mode();
        let entry_id = self.select_entry(rng)?;
        let entry = self.manager.entry_mut(entry_id);
        entry.use_count += 1;

        let active = entry.active();
        if active.is_empty() {
            // Reached only via Exploration mode drawing an entry from
            // `old`; that entry is deliberately unlinked from `head`
            // (spec.md section 4.D `insert_to_old`), so it must not be
            // re-spliced back in here.
            return None;
        }
        let mut best = active[0];
        let mut best_use_count = self.queue.get(best).use_count;
        for &candidate in &active[1..] {
            let use_count = self.queue.get(candidate).use_count;
            if use_count < best_use_count {
                best = candidate;
                best_use_count = use_count;
            }
        }
        self.queue.get_mut(best).use_count += 1;
        // Re-splice: use_count just changed, so head's ascending order
        // (spec.md section 4.C) would otherwise go stale.
        self.manager.sorted_insert(entry_id);
        Some(best)
    }

    /// Score and (per the configured policy) admit a candidate, updating
    /// the interval tree, the owning vertical entry, and the seed queue.
    pub fn submit(&mut self, input: Vec<u8>, hits: &[u64], new_edges: bool) -> SubmitOutcome {
        let score = self.scorer.score(hits);
        let candidate = Candidate {
            input: input.clone(),
            hits: hits.to_vec(),
            new_edges,
        };

        let (entry_id, _created) = self.manager.lookup_or_insert(score.dfg_path_hash, score.adjusted, score.original);
        let seen_in_path = self.manager.entry(entry_id).seen_valuation(score.valuation_hash);
        let in_vertical_mode = self.manager.get_mode() == Mode::Vertical;

        let decision = self
            .admission
            .decide(self.policy, &candidate, score.valuation_hash, seen_in_path, in_vertical_mode);

        let outcome = match decision {
            Decision::Admit => {
                let id = self.queue.push(input, &score, self.clock.now());
                let entry = self.manager.entry_mut(entry_id);
                entry.add(score.valuation_hash, id);
                entry.set_last_adjusted(score.adjusted);
                self.manager.note_admission(entry_id, self.last_pick_was_exploration);
                SubmitOutcome::Admitted(id)
            }
            // The bucket credit already happened in lookup_or_insert; a
            // rejected-but-useful candidate gets no further credit, since
            // double-crediting would bias the tree toward noisy paths.
            Decision::RejectUseful => SubmitOutcome::Rejected,
            Decision::Reject => SubmitOutcome::Rejected,
        };
        self.last_pick_was_exploration = false;
        outcome
    }

    pub fn queue(&self) -> &SeedQueue {
        &self.queue
    }

    pub fn manager(&self) -> &VerticalManager {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::FakeClock;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::rc::Rc;
    use std::time::Duration;

    fn scheduler_with_clock(policy: AdmissionPolicy) -> (Scheduler, Rc<FakeClock>) {
        let clock = Rc::new(FakeClock::new());
        struct RcClock(Rc<FakeClock>);
        impl Clock for RcClock {
            fn now(&self) -> Duration {
                self.0.now()
            }
        }
        let dfg_map = DfgMap {
            score: vec![10, 5, 5, 20],
            count: vec![1, 1, 1, 1],
        };
        let sched = Scheduler::new(dfg_map, policy, Box::new(RcClock(clock.clone())));
        (sched, clock)
    }

    // Scenario S1-ish: distinct DFG paths land in distinct vertical
    // entries and are both admitted under policy DEFAULT when each opens
    // a new edge.
    #[test]
    fn submit_admits_new_edge_candidates_and_groups_by_dfg_path() {
        let (mut sched, _clock) = scheduler_with_clock(AdmissionPolicy::Default);
        let outcome_a = sched.submit(b"a".to_vec(), &[1, 0, 0, 0], true);
        let outcome_b = sched.submit(b"b".to_vec(), &[0, 0, 0, 1], true);
        assert!(matches!(outcome_a, SubmitOutcome::Admitted(_)));
        assert!(matches!(outcome_b, SubmitOutcome::Admitted(_)));
        assert_eq!(sched.manager().head_len(), 2);
        assert_eq!(sched.queue().len(), 2);
    }

    #[test]
    fn submit_rejects_without_new_edges_under_default_policy() {
        let (mut sched, _clock) = scheduler_with_clock(AdmissionPolicy::Default);
        let outcome = sched.submit(b"a".to_vec(), &[1, 0, 0, 0], false);
        assert_eq!(outcome, SubmitOutcome::Rejected);
        assert_eq!(sched.queue().len(), 0);
    }

    #[test]
    fn unique_value_per_path_rejects_repeat_valuation_on_same_path() {
        let (mut sched, _clock) = scheduler_with_clock(AdmissionPolicy::UniqueValuePerPath);
        let first = sched.submit(b"a".to_vec(), &[1, 0, 0, 0], false);
        let second = sched.submit(b"a-dup".to_vec(), &[1, 0, 0, 0], false);
        assert!(matches!(first, SubmitOutcome::Admitted(_)));
        assert_eq!(second, SubmitOutcome::Rejected);
    }

    // Scenario S4: after T_hor seconds with an eligible entry, the
    // scheduler flips into Vertical mode.
    #[test]
    fn select_mode_enters_vertical_after_t_hor_elapses() {
        let (mut sched, clock) = scheduler_with_clock(AdmissionPolicy::All);
        sched.submit(vec![0u8], &[1, 0, 0, 0], false);
        clock.advance(Duration::from_secs(61));
        assert_eq!(sched.select_mode(), Mode::Vertical);
    }

    #[test]
    fn pick_seed_returns_a_seed_once_one_is_admitted() {
        let (mut sched, _clock) = scheduler_with_clock(AdmissionPolicy::All);
        sched.submit(vec![1u8], &[1, 0, 0, 0], false);
        let mut rng = StdRng::seed_from_u64(99);
        let picked = sched.pick_seed(&mut rng);
        assert!(picked.is_some());
    }

    // spec.md section 4.C: picking a seed bumps its entry's use_count, so
    // the entry must be re-spliced to keep head's ascending-use_count
    // order current for the next selection.
    #[test]
    fn pick_seed_keeps_head_sorted_by_use_count() {
        let (mut sched, _clock) = scheduler_with_clock(AdmissionPolicy::All);
        sched.submit(vec![1u8], &[1, 0, 0, 0], true);
        sched.submit(vec![2u8], &[0, 1, 0, 0], true);
        let mut rng = StdRng::seed_from_u64(7);

        let order_before = sched.manager().head_order();
        sched.pick_seed(&mut rng);
        let order_after = sched.manager().head_order();

        let use_counts: Vec<u64> = order_after.iter().map(|&id| sched.manager().entry(id).use_count).collect();
        assert!(use_counts.windows(2).all(|w| w[0] <= w[1]));
        assert_ne!(order_before, order_after, "picking a seed should move its entry behind unpicked entries");
    }
}
