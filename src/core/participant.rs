use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a participant on either side of a matching run.
///
/// A participant belongs to exactly one of the two disjoint sides of an
/// instance (the proposing side or the receiving side) and is referred
/// to by name everywhere in the public API. Engine internals translate
/// names to dense indices at start time.
///
/// # Examples
///
/// ```
/// use pairing_engine::core::participant::ParticipantId;
///
/// let ada = ParticipantId::new("Ada");
/// let grace = ParticipantId::new("Grace");
/// assert_ne!(ada, grace);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create a new participant identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the string representation of this participant.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
