use crate::core::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One observable state transition inside a single engine step.
///
/// The engine performs no rendering of its own; it reports each step as a
/// short sequence of these events and leaves the presentation to the
/// caller. Per step the order is: the proposal, any rejections (a bumped
/// former holder first, then a refused proposer), an acceptance if one
/// occurred, a round advance if the step crossed a round boundary, and a
/// terminal marker if the run completed.
///
/// The serialized form is the wire contract consumed by front ends:
///
/// ```
/// use pairing_engine::core::event::StepEvent;
/// use pairing_engine::core::participant::ParticipantId;
///
/// let event = StepEvent::Proposal {
///     proposer: ParticipantId::new("Ada"),
///     proposee: ParticipantId::new("Xia"),
/// };
/// let json = serde_json::to_string(&event).unwrap();
/// assert_eq!(json, r#"{"kind":"proposal","proposer":"Ada","proposee":"Xia"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepEvent {
    /// A proposer offered itself to the next proposee on its list.
    Proposal {
        proposer: ParticipantId,
        proposee: ParticipantId,
    },
    /// A proposer was refused, or a former holder was bumped.
    Rejected {
        proposer: ParticipantId,
        proposee: ParticipantId,
    },
    /// The proposee tentatively accepted the proposer.
    Paired {
        proposer: ParticipantId,
        proposee: ParticipantId,
    },
    /// The proposer pointer wrapped and a new round began.
    RoundAdvanced { round: u32 },
    /// Every proposer holds a match; the run is over.
    Terminated,
}

impl fmt::Display for StepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepEvent::Proposal { proposer, proposee } => {
                write!(f, "{proposer} proposes to {proposee}")
            }
            StepEvent::Rejected { proposer, proposee } => {
                write!(f, "{proposee} rejects {proposer}")
            }
            StepEvent::Paired { proposer, proposee } => {
                write!(f, "{proposer} and {proposee} are paired")
            }
            StepEvent::RoundAdvanced { round } => write!(f, "round {round} begins"),
            StepEvent::Terminated => write!(f, "matching complete"),
        }
    }
}
