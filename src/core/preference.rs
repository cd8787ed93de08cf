use crate::core::participant::ParticipantId;
use chrono::{DateTime, Utc};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Errors arising from malformed preference data.
///
/// All validation happens before the engine mutates any run state, so a
/// failed validation leaves the caller free to correct the input and retry.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("participant side cannot be empty")]
    EmptySide,
    #[error("sides must have equal size: {proposers} proposers vs {proposees} proposees")]
    SizeMismatch { proposers: usize, proposees: usize },
    #[error("participant sets are not disjoint: {name} appears on both sides")]
    SidesOverlap { name: ParticipantId },
    #[error("preference list for {owner} has {actual} entries, expected {expected}")]
    ListLengthMismatch {
        owner: ParticipantId,
        expected: usize,
        actual: usize,
    },
    #[error("preference list for {owner} ranks {entry} more than once")]
    DuplicateEntry {
        owner: ParticipantId,
        entry: ParticipantId,
    },
    #[error("preference list for {owner} ranks {entry}, which is not on the opposite side")]
    UnknownEntry {
        owner: ParticipantId,
        entry: ParticipantId,
    },
}

/// One side of a matching instance: each member's strict ranking of the
/// entire opposite side, best first.
///
/// Member order is insertion order and is preserved through serialization;
/// the engine gives proposers their turns in exactly this order, so two
/// runs over the same table replay identically.
///
/// # Examples
///
/// ```
/// use pairing_engine::core::participant::ParticipantId;
/// use pairing_engine::core::preference::PreferenceTable;
///
/// let mut table = PreferenceTable::new();
/// table.insert(
///     ParticipantId::new("Ada"),
///     vec![ParticipantId::new("Xia"), ParticipantId::new("Yuri")],
/// );
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.list(&ParticipantId::new("Ada")).unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceTable {
    /// Members in insertion order. Every member has an entry in `lists`.
    members: Vec<ParticipantId>,
    lists: HashMap<ParticipantId, Vec<ParticipantId>>,
}

impl PreferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a member's ranked list. A repeated owner keeps
    /// its original position in the member order.
    pub fn insert(&mut self, owner: ParticipantId, ranked: Vec<ParticipantId>) {
        if !self.lists.contains_key(&owner) {
            self.members.push(owner.clone());
        }
        self.lists.insert(owner, ranked);
    }

    /// Members of this side, in insertion (turn) order.
    pub fn members(&self) -> &[ParticipantId] {
        &self.members
    }

    /// The ranked list for one member, best first.
    pub fn list(&self, owner: &ParticipantId) -> Option<&[ParticipantId]> {
        self.lists.get(owner).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &ParticipantId) -> bool {
        self.lists.contains_key(name)
    }

    /// Iterate `(owner, ranked list)` pairs in member turn order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &[ParticipantId])> + '_ {
        self.members
            .iter()
            .map(move |m| (m, self.lists[m].as_slice()))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Validate this table as the proposing side against the opposite side.
    ///
    /// Checks that both sides are non-empty and equal-size, that no name
    /// appears on both sides, and that every member's list is a strict
    /// permutation of the opposite side's members.
    pub fn validate_against(&self, opposite: &PreferenceTable) -> Result<(), ValidationError> {
        if self.is_empty() || opposite.is_empty() {
            return Err(ValidationError::EmptySide);
        }
        if self.len() != opposite.len() {
            return Err(ValidationError::SizeMismatch {
                proposers: self.len(),
                proposees: opposite.len(),
            });
        }
        for member in &self.members {
            if opposite.contains(member) {
                return Err(ValidationError::SidesOverlap {
                    name: member.clone(),
                });
            }
        }
        for member in &self.members {
            let list = &self.lists[member];
            if list.len() != opposite.len() {
                return Err(ValidationError::ListLengthMismatch {
                    owner: member.clone(),
                    expected: opposite.len(),
                    actual: list.len(),
                });
            }
            let mut seen: HashMap<&ParticipantId, ()> = HashMap::with_capacity(list.len());
            for entry in list {
                if !opposite.contains(entry) {
                    return Err(ValidationError::UnknownEntry {
                        owner: member.clone(),
                        entry: entry.clone(),
                    });
                }
                if seen.insert(entry, ()).is_some() {
                    return Err(ValidationError::DuplicateEntry {
                        owner: member.clone(),
                        entry: entry.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl FromIterator<(ParticipantId, Vec<ParticipantId>)> for PreferenceTable {
    fn from_iter<T: IntoIterator<Item = (ParticipantId, Vec<ParticipantId>)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (owner, ranked) in iter {
            table.insert(owner, ranked);
        }
        table
    }
}

// Serialized as a plain owner -> list map; entry order on the wire is the
// member turn order, which `Deserialize` reads back in sequence.
impl Serialize for PreferenceTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.members.len()))?;
        for member in &self.members {
            map.serialize_entry(member, &self.lists[member])?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PreferenceTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = PreferenceTable;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of participant names to ranked name lists")
            }
            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut table = PreferenceTable::new();
                while let Some((owner, ranked)) =
                    access.next_entry::<ParticipantId, Vec<ParticipantId>>()?
                {
                    if table.contains(&owner) {
                        return Err(de::Error::custom(format!(
                            "duplicate preference list for {owner}"
                        )));
                    }
                    table.insert(owner, ranked);
                }
                Ok(table)
            }
        }
        deserializer.deserialize_map(V)
    }
}

/// Which of an instance's two sides proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "a"),
            Side::B => write!(f, "b"),
        }
    }
}

/// A complete, symmetric matching instance: both sides' preference tables.
///
/// The instance does not privilege either side — the caller decides at
/// start time which side proposes, and the deferred-acceptance outcome is
/// optimal for whichever side that is. Instances are immutable once
/// created; the engine copies what it needs at `start`.
///
/// # Examples
///
/// ```
/// use pairing_engine::core::participant::ParticipantId;
/// use pairing_engine::core::preference::{MatchingInstance, PreferenceTable, Side};
///
/// let a: PreferenceTable = [
///     ("Ada", vec!["Xia", "Yuri"]),
///     ("Grace", vec!["Yuri", "Xia"]),
/// ]
/// .into_iter()
/// .map(|(o, l)| {
///     (
///         ParticipantId::new(o),
///         l.into_iter().map(ParticipantId::new).collect(),
///     )
/// })
/// .collect();
/// let b: PreferenceTable = [
///     ("Xia", vec!["Ada", "Grace"]),
///     ("Yuri", vec!["Grace", "Ada"]),
/// ]
/// .into_iter()
/// .map(|(o, l)| {
///     (
///         ParticipantId::new(o),
///         l.into_iter().map(ParticipantId::new).collect(),
///     )
/// })
/// .collect();
///
/// let instance = MatchingInstance::new(a, b);
/// assert!(instance.validate().is_ok());
/// let (proposers, _) = instance.tables_for(Side::B);
/// assert_eq!(proposers.members()[0].as_str(), "Xia");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingInstance {
    /// Unique identifier for this instance.
    id: Uuid,
    /// When this instance was created.
    created_at: DateTime<Utc>,
    side_a: PreferenceTable,
    side_b: PreferenceTable,
}

impl MatchingInstance {
    pub fn new(side_a: PreferenceTable, side_b: PreferenceTable) -> Self {
        Self::with_id(Uuid::new_v4(), side_a, side_b)
    }

    /// Create an instance with a specific ID (useful for testing / determinism).
    pub fn with_id(id: Uuid, side_a: PreferenceTable, side_b: PreferenceTable) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            side_a,
            side_b,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn side_a(&self) -> &PreferenceTable {
        &self.side_a
    }

    pub fn side_b(&self) -> &PreferenceTable {
        &self.side_b
    }

    /// The `(proposers, proposees)` tables for a run where `proposing`
    /// is the side that makes offers.
    pub fn tables_for(&self, proposing: Side) -> (&PreferenceTable, &PreferenceTable) {
        match proposing {
            Side::A => (&self.side_a, &self.side_b),
            Side::B => (&self.side_b, &self.side_a),
        }
    }

    /// Validate both directions of the instance.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.side_a.validate_against(&self.side_b)?;
        self.side_b.validate_against(&self.side_a)
    }
}
