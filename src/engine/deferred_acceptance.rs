use crate::core::event::StepEvent;
use crate::core::participant::ParticipantId;
use crate::core::preference::{PreferenceTable, ValidationError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from driving the engine outside its state machine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("step called before start")]
    NotStarted,
    #[error("engine already started")]
    AlreadyStarted,
    #[error("matching already terminated in round {round}")]
    AlreadyTerminated { round: u32 },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Result of one engine step: the events it emitted and the state the
/// presentation layer queries after every step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// Round the step's proposal belongs to.
    pub round: u32,
    /// Tentatively matched pairs after the step.
    pub matched_count: usize,
    /// True once every proposer holds a match.
    pub terminated: bool,
    /// Events in emission order: the proposal, any rejections, an
    /// acceptance, a round advance, a terminal marker.
    pub events: Vec<StepEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Running,
    Terminated,
}

/// The Gale–Shapley deferred-acceptance state machine.
///
/// Lifecycle: construct with [`MatchingEngine::new`], transition to
/// running with [`start`](MatchingEngine::start), then call
/// [`step`](MatchingEngine::step) repeatedly, one proposal per call,
/// until a report comes back with `terminated` set. Stepping before
/// `start` or after termination is an error and mutates nothing.
///
/// Participant names are interned to dense indices at `start`, and every
/// rank lookup is precomputed, so a step is O(1) apart from the pointer
/// scan past already-matched proposers.
///
/// # Examples
///
/// ```
/// use pairing_engine::core::participant::ParticipantId;
/// use pairing_engine::core::preference::PreferenceTable;
/// use pairing_engine::engine::MatchingEngine;
///
/// let id = ParticipantId::new;
/// let proposers: PreferenceTable = [
///     (id("A"), vec![id("X"), id("Y")]),
///     (id("B"), vec![id("X"), id("Y")]),
/// ]
/// .into_iter()
/// .collect();
/// let proposees: PreferenceTable = [
///     (id("X"), vec![id("A"), id("B")]),
///     (id("Y"), vec![id("A"), id("B")]),
/// ]
/// .into_iter()
/// .collect();
///
/// let mut engine = MatchingEngine::new();
/// engine.start(&proposers, &proposees).unwrap();
/// let reports = engine.run_to_completion().unwrap();
/// assert!(reports.last().unwrap().terminated);
/// assert_eq!(engine.matched_pairs().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    phase: Phase,
    /// Proposing side in turn order; indices below refer into this.
    proposers: Vec<ParticipantId>,
    /// Receiving side; indices below refer into this.
    proposees: Vec<ParticipantId>,
    /// Proposer index -> ranked proposee indices, best first.
    proposer_prefs: Vec<Vec<usize>>,
    /// Proposee index -> proposer index -> rank in that proposee's list.
    proposee_rank: Vec<Vec<usize>>,
    /// Proposer -> tentatively held proposee.
    matches: Vec<Option<usize>>,
    /// Proposee -> proposer currently holding it.
    holder: Vec<Option<usize>>,
    /// Proposee -> rank of its current holder; `None` is worse than any rank.
    held_rank: Vec<Option<usize>>,
    /// Proposer -> index of the next proposee to propose to.
    next_proposal: Vec<usize>,
    round: u32,
    /// Index into `proposers` for the next turn; wraps at a round boundary.
    pointer: usize,
    matched_count: usize,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
            proposers: Vec::new(),
            proposees: Vec::new(),
            proposer_prefs: Vec::new(),
            proposee_rank: Vec::new(),
            matches: Vec::new(),
            holder: Vec::new(),
            held_rank: Vec::new(),
            next_proposal: Vec::new(),
            round: 0,
            pointer: 0,
            matched_count: 0,
        }
    }

    /// Initialize a run from the proposing side's and receiving side's
    /// preference tables.
    ///
    /// Both tables are validated against each other before any state is
    /// committed; on error the engine stays uninitialized and a corrected
    /// `start` may be attempted again.
    pub fn start(
        &mut self,
        proposers: &PreferenceTable,
        proposees: &PreferenceTable,
    ) -> Result<(), EngineError> {
        match self.phase {
            Phase::Uninitialized => {}
            Phase::Running | Phase::Terminated => return Err(EngineError::AlreadyStarted),
        }
        proposers.validate_against(proposees)?;
        proposees.validate_against(proposers)?;

        let n = proposers.len();
        let proposer_index: HashMap<&ParticipantId, usize> = proposers
            .members()
            .iter()
            .enumerate()
            .map(|(i, m)| (m, i))
            .collect();
        let proposee_index: HashMap<&ParticipantId, usize> = proposees
            .members()
            .iter()
            .enumerate()
            .map(|(j, m)| (m, j))
            .collect();

        // Validation guarantees every list is a permutation of the
        // opposite side, so the index lookups below cannot miss.
        self.proposer_prefs = proposers
            .iter()
            .map(|(_, list)| list.iter().map(|entry| proposee_index[entry]).collect())
            .collect();
        self.proposee_rank = proposees
            .iter()
            .map(|(_, list)| {
                let mut ranks = vec![0; n];
                for (rank, entry) in list.iter().enumerate() {
                    ranks[proposer_index[entry]] = rank;
                }
                ranks
            })
            .collect();

        self.proposers = proposers.members().to_vec();
        self.proposees = proposees.members().to_vec();
        self.matches = vec![None; n];
        self.holder = vec![None; n];
        self.held_rank = vec![None; n];
        self.next_proposal = vec![0; n];
        self.round = 1;
        self.pointer = 0;
        self.matched_count = 0;
        self.phase = Phase::Running;
        debug!("run started: {n} proposers, {n} proposees");
        Ok(())
    }

    /// Execute exactly one proposal and report what happened.
    ///
    /// The turn pointer first skips proposers that already hold a match;
    /// if it runs off the end of the proposer list the round counter
    /// advances, the pointer wraps, and the scan continues — a round
    /// boundary never consumes the step, so the new round's first
    /// proposal lands in the same call that advanced the round.
    pub fn step(&mut self) -> Result<StepReport, EngineError> {
        match self.phase {
            Phase::Uninitialized => return Err(EngineError::NotStarted),
            Phase::Terminated => {
                return Err(EngineError::AlreadyTerminated { round: self.round })
            }
            Phase::Running => {}
        }
        let n = self.proposers.len();

        // While running, at least one proposer is unmatched, so this scan
        // wraps at most once before it finds a turn to give out.
        let mut advanced_round = false;
        loop {
            if self.pointer >= n {
                self.round += 1;
                self.pointer = 0;
                advanced_round = true;
                debug!("round {} begins", self.round);
                continue;
            }
            if self.matches[self.pointer].is_none() {
                break;
            }
            self.pointer += 1;
        }

        let p = self.pointer;
        let cursor = self.next_proposal[p];
        // An unmatched proposer cannot have exhausted its list: if it had,
        // all proposees (hence all proposers) would already be matched.
        debug_assert!(cursor < n, "unmatched proposer exhausted its list");
        let q = self.proposer_prefs[p][cursor];
        self.next_proposal[p] = cursor + 1;

        let mut events = vec![StepEvent::Proposal {
            proposer: self.proposers[p].clone(),
            proposee: self.proposees[q].clone(),
        }];

        let rank = self.proposee_rank[q][p];
        let accepted = match self.held_rank[q] {
            None => true,
            Some(held) => rank < held,
        };

        let mut terminated = false;
        if accepted {
            if let Some(prev) = self.holder[q] {
                self.matches[prev] = None;
                self.matched_count -= 1;
                debug!(
                    "{} bumps {} from {}",
                    self.proposers[p], self.proposers[prev], self.proposees[q]
                );
                events.push(StepEvent::Rejected {
                    proposer: self.proposers[prev].clone(),
                    proposee: self.proposees[q].clone(),
                });
            }
            self.holder[q] = Some(p);
            self.held_rank[q] = Some(rank);
            self.matches[p] = Some(q);
            self.matched_count += 1;
            events.push(StepEvent::Paired {
                proposer: self.proposers[p].clone(),
                proposee: self.proposees[q].clone(),
            });
            if self.matched_count == n {
                self.phase = Phase::Terminated;
                terminated = true;
                debug!("matching complete after round {}", self.round);
            }
        } else {
            debug!(
                "{} refuses {} (rank {} vs held {:?})",
                self.proposees[q], self.proposers[p], rank, self.held_rank[q]
            );
            events.push(StepEvent::Rejected {
                proposer: self.proposers[p].clone(),
                proposee: self.proposees[q].clone(),
            });
        }

        if advanced_round {
            events.push(StepEvent::RoundAdvanced { round: self.round });
        }
        if terminated {
            events.push(StepEvent::Terminated);
        } else {
            self.pointer += 1;
        }

        Ok(StepReport {
            round: self.round,
            matched_count: self.matched_count,
            terminated,
            events,
        })
    }

    /// Step until termination, collecting every report.
    pub fn run_to_completion(&mut self) -> Result<Vec<StepReport>, EngineError> {
        let mut reports = Vec::new();
        loop {
            let report = self.step()?;
            let done = report.terminated;
            reports.push(report);
            if done {
                return Ok(reports);
            }
        }
    }

    // --- Queries for the presentation layer ---

    /// Current round number; 0 before `start`.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    pub fn matched_count(&self) -> usize {
        self.matched_count
    }

    /// The proposing side in turn order. Empty before `start`.
    pub fn proposers(&self) -> &[ParticipantId] {
        &self.proposers
    }

    /// The receiving side. Empty before `start`.
    pub fn proposees(&self) -> &[ParticipantId] {
        &self.proposees
    }

    /// Currently matched `(proposer, proposee)` pairs in proposer turn order.
    pub fn matched_pairs(&self) -> Vec<(ParticipantId, ParticipantId)> {
        self.matches
            .iter()
            .enumerate()
            .filter_map(|(p, m)| {
                m.map(|q| (self.proposers[p].clone(), self.proposees[q].clone()))
            })
            .collect()
    }

    /// The proposee a proposer currently holds, if any.
    pub fn match_of(&self, proposer: &ParticipantId) -> Option<&ParticipantId> {
        let p = self.proposers.iter().position(|m| m == proposer)?;
        self.matches[p].map(|q| &self.proposees[q])
    }

    /// Audit the internal bookkeeping: the match relation must be an
    /// injective partial function, recorded held ranks must equal the
    /// holder's actual rank, and the matched count must agree.
    pub fn is_consistent(&self) -> bool {
        let mut held = 0;
        for (q, holder) in self.holder.iter().enumerate() {
            match holder {
                Some(p) => {
                    held += 1;
                    if self.matches[*p] != Some(q) {
                        return false;
                    }
                    if self.held_rank[q] != Some(self.proposee_rank[q][*p]) {
                        return false;
                    }
                }
                None => {
                    if self.held_rank[q].is_some() {
                        return false;
                    }
                }
            }
        }
        for (p, m) in self.matches.iter().enumerate() {
            if let Some(q) = m {
                if self.holder[*q] != Some(p) {
                    return false;
                }
            }
        }
        held == self.matched_count
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    fn table(rows: &[(&str, &[&str])]) -> PreferenceTable {
        rows.iter()
            .map(|&(owner, list)| (id(owner), list.iter().map(|s| id(*s)).collect()))
            .collect()
    }

    fn started(proposers: &PreferenceTable, proposees: &PreferenceTable) -> MatchingEngine {
        let mut engine = MatchingEngine::new();
        engine.start(proposers, proposees).unwrap();
        engine
    }

    #[test]
    fn test_agreeing_proposers_scenario() {
        // A and B both want X first; X and Y both rank A first.
        let proposers = table(&[("A", &["X", "Y"]), ("B", &["X", "Y"])]);
        let proposees = table(&[("X", &["A", "B"]), ("Y", &["A", "B"])]);
        let mut engine = started(&proposers, &proposees);

        let r1 = engine.step().unwrap();
        assert_eq!(
            r1.events,
            vec![
                StepEvent::Proposal { proposer: id("A"), proposee: id("X") },
                StepEvent::Paired { proposer: id("A"), proposee: id("X") },
            ]
        );
        assert_eq!(r1.round, 1);
        assert_eq!(r1.matched_count, 1);

        let r2 = engine.step().unwrap();
        assert_eq!(
            r2.events,
            vec![
                StepEvent::Proposal { proposer: id("B"), proposee: id("X") },
                StepEvent::Rejected { proposer: id("B"), proposee: id("X") },
            ]
        );
        assert_eq!(r2.matched_count, 1);

        let r3 = engine.step().unwrap();
        assert_eq!(
            r3.events,
            vec![
                StepEvent::Proposal { proposer: id("B"), proposee: id("Y") },
                StepEvent::Paired { proposer: id("B"), proposee: id("Y") },
                StepEvent::RoundAdvanced { round: 2 },
                StepEvent::Terminated,
            ]
        );
        assert!(r3.terminated);
        assert!(engine.is_terminated());
        assert_eq!(
            engine.matched_pairs(),
            vec![(id("A"), id("X")), (id("B"), id("Y"))]
        );
    }

    #[test]
    fn test_displacement_scenario() {
        // X prefers B, so B bumps A; A re-offers to Y in the next round.
        let proposers = table(&[("A", &["X", "Y"]), ("B", &["X", "Y"])]);
        let proposees = table(&[("X", &["B", "A"]), ("Y", &["A", "B"])]);
        let mut engine = started(&proposers, &proposees);

        let r1 = engine.step().unwrap();
        assert_eq!(
            r1.events,
            vec![
                StepEvent::Proposal { proposer: id("A"), proposee: id("X") },
                StepEvent::Paired { proposer: id("A"), proposee: id("X") },
            ]
        );

        let r2 = engine.step().unwrap();
        assert_eq!(
            r2.events,
            vec![
                StepEvent::Proposal { proposer: id("B"), proposee: id("X") },
                StepEvent::Rejected { proposer: id("A"), proposee: id("X") },
                StepEvent::Paired { proposer: id("B"), proposee: id("X") },
            ]
        );
        assert_eq!(r2.matched_count, 1);
        assert_eq!(engine.match_of(&id("A")), None);

        let r3 = engine.step().unwrap();
        assert_eq!(
            r3.events,
            vec![
                StepEvent::Proposal { proposer: id("A"), proposee: id("Y") },
                StepEvent::Paired { proposer: id("A"), proposee: id("Y") },
                StepEvent::RoundAdvanced { round: 2 },
                StepEvent::Terminated,
            ]
        );
        assert_eq!(
            engine.matched_pairs(),
            vec![(id("A"), id("Y")), (id("B"), id("X"))]
        );
    }

    #[test]
    fn test_step_before_start_fails() {
        let mut engine = MatchingEngine::new();
        assert!(matches!(engine.step(), Err(EngineError::NotStarted)));
    }

    #[test]
    fn test_step_after_termination_fails_without_mutation() {
        let proposers = table(&[("A", &["X"])]);
        let proposees = table(&[("X", &["A"])]);
        let mut engine = started(&proposers, &proposees);
        let report = engine.step().unwrap();
        assert!(report.terminated);

        let pairs = engine.matched_pairs();
        let round = engine.round();
        assert!(matches!(
            engine.step(),
            Err(EngineError::AlreadyTerminated { round: 1 })
        ));
        assert_eq!(engine.matched_pairs(), pairs);
        assert_eq!(engine.round(), round);
        assert!(engine.is_consistent());
    }

    #[test]
    fn test_double_start_fails() {
        let proposers = table(&[("A", &["X"])]);
        let proposees = table(&[("X", &["A"])]);
        let mut engine = started(&proposers, &proposees);
        assert!(matches!(
            engine.start(&proposers, &proposees),
            Err(EngineError::AlreadyStarted)
        ));
    }

    #[test]
    fn test_failed_start_leaves_engine_usable() {
        let bad = table(&[("A", &["X", "X"]), ("B", &["X", "Y"])]);
        let proposees = table(&[("X", &["A", "B"]), ("Y", &["A", "B"])]);
        let mut engine = MatchingEngine::new();
        assert!(engine.start(&bad, &proposees).is_err());
        assert_eq!(engine.round(), 0);

        let good = table(&[("A", &["X", "Y"]), ("B", &["X", "Y"])]);
        assert!(engine.start(&good, &proposees).is_ok());
        assert_eq!(engine.round(), 1);
    }

    #[test]
    fn test_run_to_completion_is_bounded_and_consistent() {
        // Worst-case-ish 4x4 instance; bound is n^2 steps.
        let proposers = table(&[
            ("A", &["W", "X", "Y", "Z"]),
            ("B", &["W", "X", "Y", "Z"]),
            ("C", &["W", "X", "Y", "Z"]),
            ("D", &["W", "X", "Y", "Z"]),
        ]);
        let proposees = table(&[
            ("W", &["D", "C", "B", "A"]),
            ("X", &["D", "C", "B", "A"]),
            ("Y", &["D", "C", "B", "A"]),
            ("Z", &["D", "C", "B", "A"]),
        ]);
        let mut engine = started(&proposers, &proposees);
        let reports = engine.run_to_completion().unwrap();
        assert!(reports.len() <= 16);
        assert!(engine.is_consistent());
        assert_eq!(engine.matched_count(), 4);
        assert_eq!(engine.matched_pairs().len(), 4);
    }

    #[test]
    fn test_one_proposal_event_per_step() {
        let proposers = table(&[("A", &["X", "Y"]), ("B", &["Y", "X"])]);
        let proposees = table(&[("X", &["A", "B"]), ("Y", &["B", "A"])]);
        let mut engine = started(&proposers, &proposees);
        for report in engine.run_to_completion().unwrap() {
            let proposals = report
                .events
                .iter()
                .filter(|e| matches!(e, StepEvent::Proposal { .. }))
                .count();
            assert_eq!(proposals, 1);
        }
    }
}
