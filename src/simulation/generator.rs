//! Random preference generation.
//!
//! Produces, for every member of one side, an independent uniformly
//! distributed strict ranking of the opposite side. Rankings are built
//! with a Durstenfeld shuffle over a copy of the pool, so the caller's
//! slices are never reordered in place.

use crate::core::participant::ParticipantId;
use crate::core::preference::{MatchingInstance, PreferenceTable};
use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;

/// Errors from malformed generation inputs.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("cannot generate preferences for an empty side")]
    EmptySide,
    #[error("{name} appears more than once on one side")]
    DuplicateMember { name: ParticipantId },
    #[error("sides are not disjoint: {name} appears on both")]
    SidesOverlap { name: ParticipantId },
}

fn check_unique(side: &[ParticipantId]) -> Result<(), GeneratorError> {
    let mut seen: HashSet<&ParticipantId> = HashSet::with_capacity(side.len());
    for name in side {
        if !seen.insert(name) {
            return Err(GeneratorError::DuplicateMember { name: name.clone() });
        }
    }
    Ok(())
}

fn check_sides(
    owners: &[ParticipantId],
    pool: &[ParticipantId],
) -> Result<(), GeneratorError> {
    if owners.is_empty() || pool.is_empty() {
        return Err(GeneratorError::EmptySide);
    }
    check_unique(owners)?;
    check_unique(pool)?;
    let pool_set: HashSet<&ParticipantId> = pool.iter().collect();
    for name in owners {
        if pool_set.contains(name) {
            return Err(GeneratorError::SidesOverlap { name: name.clone() });
        }
    }
    Ok(())
}

/// Durstenfeld shuffle over a copy of `pool`: walk from the last index
/// down, swapping each element with a uniformly chosen one at or below
/// it. Uniform over all permutations, O(n).
fn shuffled<R: Rng>(pool: &[ParticipantId], rng: &mut R) -> Vec<ParticipantId> {
    let mut list = pool.to_vec();
    for i in (1..list.len()).rev() {
        let j = rng.gen_range(0..=i);
        list.swap(i, j);
    }
    list
}

/// Generate a preference table: one independent uniform permutation of
/// `pool` for every member of `owners`.
///
/// Rejects empty sides, duplicate names within a side, and overlapping
/// sides, before drawing any randomness.
pub fn generate_preferences<R: Rng>(
    owners: &[ParticipantId],
    pool: &[ParticipantId],
    rng: &mut R,
) -> Result<PreferenceTable, GeneratorError> {
    check_sides(owners, pool)?;
    Ok(owners
        .iter()
        .map(|owner| (owner.clone(), shuffled(pool, rng)))
        .collect())
}

/// Generate a complete instance with fresh random preferences on both
/// sides, using the thread-local RNG.
pub fn random_instance(
    side_a: &[ParticipantId],
    side_b: &[ParticipantId],
) -> Result<MatchingInstance, GeneratorError> {
    random_instance_with(side_a, side_b, &mut rand::thread_rng())
}

/// Generate a complete instance using a caller-supplied RNG, for
/// deterministic runs under a seeded generator.
pub fn random_instance_with<R: Rng>(
    side_a: &[ParticipantId],
    side_b: &[ParticipantId],
    rng: &mut R,
) -> Result<MatchingInstance, GeneratorError> {
    let table_a = generate_preferences(side_a, side_b, rng)?;
    let table_b = generate_preferences(side_b, side_a, rng)?;
    Ok(MatchingInstance::new(table_a, table_b))
}

/// Synthetic equal-size rosters for benchmarks, batch runs, and the CLI.
pub fn synthetic_sides(size: usize) -> (Vec<ParticipantId>, Vec<ParticipantId>) {
    let side_a = (0..size)
        .map(|i| ParticipantId::new(format!("A-{i:03}")))
        .collect();
    let side_b = (0..size)
        .map(|i| ParticipantId::new(format!("B-{i:03}")))
        .collect();
    (side_a, side_b)
}
