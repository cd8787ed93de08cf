use crate::core::event::StepEvent;
use crate::core::participant::ParticipantId;
use crate::engine::deferred_acceptance::{MatchingEngine, StepReport};
use serde::{Deserialize, Serialize};

/// Aggregated view of a finished (or abandoned) run, built from the
/// per-step reports: what the interactive transcript shows, in one value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of `step()` calls observed.
    pub steps: usize,
    /// Highest round reached.
    pub rounds: u32,
    /// Total proposals issued (one per step).
    pub proposals: usize,
    /// Refusals plus bumped former holders.
    pub rejections: usize,
    /// Tentative acceptances, including ones later undone by a bump.
    pub pairings: usize,
    /// Whether the run reached the terminal state.
    pub terminated: bool,
    /// Matched pairs at the end of the observed reports.
    pub final_pairs: Vec<(ParticipantId, ParticipantId)>,
}

impl RunSummary {
    /// Summarize a run from its step reports and the engine that produced
    /// them.
    pub fn from_run(reports: &[StepReport], engine: &MatchingEngine) -> Self {
        let mut rejections = 0;
        let mut pairings = 0;
        for report in reports {
            for event in &report.events {
                match event {
                    StepEvent::Rejected { .. } => rejections += 1,
                    StepEvent::Paired { .. } => pairings += 1,
                    _ => {}
                }
            }
        }
        RunSummary {
            steps: reports.len(),
            rounds: reports.last().map(|r| r.round).unwrap_or(0),
            proposals: reports.len(),
            rejections,
            pairings,
            terminated: engine.is_terminated(),
            final_pairs: engine.matched_pairs(),
        }
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Matching Summary ===")?;
        writeln!(f, "Steps:      {}", self.steps)?;
        writeln!(f, "Rounds:     {}", self.rounds)?;
        writeln!(f, "Proposals:  {}", self.proposals)?;
        writeln!(f, "Rejections: {}", self.rejections)?;
        writeln!(f, "Pairings:   {}", self.pairings)?;
        writeln!(f, "Terminated: {}", self.terminated)?;
        writeln!(f, "\nMatches:")?;
        for (proposer, proposee) in &self.final_pairs {
            writeln!(f, "  {proposer} and {proposee}")?;
        }
        Ok(())
    }
}
