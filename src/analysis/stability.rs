use crate::core::participant::ParticipantId;
use crate::core::preference::PreferenceTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A proposer and proposee who are not matched to each other but would
/// both prefer each other over their current partners.
///
/// A matching is stable exactly when no such pair exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingPair {
    pub proposer: ParticipantId,
    pub proposee: ParticipantId,
}

impl fmt::Display for BlockingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.proposer, self.proposee)
    }
}

/// Find every blocking pair of a (possibly partial) matching.
///
/// For each proposer, every proposee ranked above its current partner is
/// checked: if that proposee also ranks the proposer above its own
/// current partner, the pair blocks. An unmatched participant prefers
/// any partner over staying unmatched.
///
/// Deferred acceptance provably produces a matching with no blocking
/// pairs; this audit exists so callers (and the test suite) can verify
/// an outcome independently of the engine's bookkeeping.
pub fn find_blocking_pairs(
    proposers: &PreferenceTable,
    proposees: &PreferenceTable,
    matching: &[(ParticipantId, ParticipantId)],
) -> Vec<BlockingPair> {
    let proposer_partner: HashMap<&ParticipantId, &ParticipantId> =
        matching.iter().map(|(m, w)| (m, w)).collect();
    let proposee_partner: HashMap<&ParticipantId, &ParticipantId> =
        matching.iter().map(|(m, w)| (w, m)).collect();

    let mut blocking = Vec::new();
    for (proposer, list) in proposers.iter() {
        // Rank of the current partner; past-the-end when unmatched.
        let partner_rank = proposer_partner
            .get(proposer)
            .and_then(|w| list.iter().position(|entry| entry == *w))
            .unwrap_or(list.len());

        for candidate in &list[..partner_rank] {
            let candidate_list = match proposees.list(candidate) {
                Some(l) => l,
                None => continue,
            };
            let candidate_partner_rank = proposee_partner
                .get(candidate)
                .and_then(|m| candidate_list.iter().position(|entry| entry == *m))
                .unwrap_or(candidate_list.len());
            let proposer_rank = candidate_list
                .iter()
                .position(|entry| entry == proposer)
                .unwrap_or(candidate_list.len());

            if proposer_rank < candidate_partner_rank {
                blocking.push(BlockingPair {
                    proposer: proposer.clone(),
                    proposee: candidate.clone(),
                });
            }
        }
    }
    blocking
}

/// Returns true if the matching has no blocking pair.
pub fn is_stable(
    proposers: &PreferenceTable,
    proposees: &PreferenceTable,
    matching: &[(ParticipantId, ParticipantId)],
) -> bool {
    find_blocking_pairs(proposers, proposees, matching).is_empty()
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

    #[test]
    fn test_stable_matching_has_no_blocking_pairs() {
        let proposers = table(&[("A", &["X", "Y"]), ("B", &["X", "Y"])]);
        let proposees = table(&[("X", &["A", "B"]), ("Y", &["A", "B"])]);
        let matching = vec![(id("A"), id("X")), (id("B"), id("Y"))];
        assert!(is_stable(&proposers, &proposees, &matching));
    }

    #[test]
    fn test_swapped_matching_is_blocked() {
        // A and X prefer each other over their assigned partners.
        let proposers = table(&[("A", &["X", "Y"]), ("B", &["X", "Y"])]);
        let proposees = table(&[("X", &["A", "B"]), ("Y", &["A", "B"])]);
        let matching = vec![(id("A"), id("Y")), (id("B"), id("X"))];
        let blocking = find_blocking_pairs(&proposers, &proposees, &matching);
        assert_eq!(
            blocking,
            vec![BlockingPair {
                proposer: id("A"),
                proposee: id("X"),
            }]
        );
    }

    #[test]
    fn test_empty_matching_is_blocked_everywhere() {
        let proposers = table(&[("A", &["X"])]);
        let proposees = table(&[("X", &["A"])]);
        let blocking = find_blocking_pairs(&proposers, &proposees, &[]);
        assert_eq!(blocking.len(), 1);
        assert!(!is_stable(&proposers, &proposees, &[]));
    }

    #[test]
    fn test_partial_matching() {
        // B is unmatched; (B, Y) blocks because Y is also unmatched.
        let proposers = table(&[("A", &["X", "Y"]), ("B", &["X", "Y"])]);
        let proposees = table(&[("X", &["A", "B"]), ("Y", &["A", "B"])]);
        let matching = vec![(id("A"), id("X"))];
        let blocking = find_blocking_pairs(&proposers, &proposees, &matching);
        assert!(blocking.contains(&BlockingPair {
            proposer: id("B"),
            proposee: id("Y"),
        }));
    }
}
