use pairing_engine::analysis::stability::{find_blocking_pairs, is_stable};
use pairing_engine::analysis::summary::RunSummary;
use pairing_engine::core::event::StepEvent;
use pairing_engine::core::participant::ParticipantId;
use pairing_engine::core::preference::{MatchingInstance, PreferenceTable, Side};
use pairing_engine::engine::deferred_acceptance::{EngineError, MatchingEngine};
use pairing_engine::simulation::generator::{random_instance, synthetic_sides};
use uuid::Uuid;

fn id(s: &str) -> ParticipantId {
    ParticipantId::new(s)
}

fn table(rows: &[(&str, &[&str])]) -> PreferenceTable {
    rows.iter()
        .map(|&(owner, list)| (id(owner), list.iter().map(|s| id(*s)).collect()))
        .collect()
}

fn two_by_two(x_prefs: &[&str]) -> MatchingInstance {
    let a = table(&[("A", &["X", "Y"]), ("B", &["X", "Y"])]);
    let b = table(&[("X", x_prefs), ("Y", &["A", "B"])]);
    MatchingInstance::with_id(Uuid::nil(), a, b)
}

/// Full pipeline: generate → start → step to termination → audit.
#[test]
fn full_pipeline_random_instance() {
    let (side_a, side_b) = synthetic_sides(8);
    let instance = random_instance(&side_a, &side_b).unwrap();
    assert!(instance.validate().is_ok());

    let (proposers, proposees) = instance.tables_for(Side::A);
    let mut engine = MatchingEngine::new();
    engine.start(proposers, proposees).unwrap();
    let reports = engine.run_to_completion().unwrap();

    // Termination within |proposers| x |proposees| steps.
    assert!(reports.len() <= 64);
    assert!(engine.is_terminated());
    assert!(engine.is_consistent());

    // Perfect matching of equal-size sides.
    let pairs = engine.matched_pairs();
    assert_eq!(pairs.len(), 8);
    assert_eq!(engine.matched_count(), 8);

    // Independent stability audit.
    assert!(find_blocking_pairs(proposers, proposees, &pairs).is_empty());

    let summary = RunSummary::from_run(&reports, &engine);
    assert_eq!(summary.steps, reports.len());
    assert!(summary.terminated);
}

/// Scenario from the agreeing-proposers walkthrough: everyone ranks the
/// same favorites, so no match is ever broken.
#[test]
fn agreeing_proposers_transcript() {
    let instance = two_by_two(&["A", "B"]);
    let (proposers, proposees) = instance.tables_for(Side::A);
    let mut engine = MatchingEngine::new();
    engine.start(proposers, proposees).unwrap();

    let reports = engine.run_to_completion().unwrap();
    let all_events: Vec<StepEvent> = reports.into_iter().flat_map(|r| r.events).collect();
    assert_eq!(
        all_events,
        vec![
            StepEvent::Proposal { proposer: id("A"), proposee: id("X") },
            StepEvent::Paired { proposer: id("A"), proposee: id("X") },
            StepEvent::Proposal { proposer: id("B"), proposee: id("X") },
            StepEvent::Rejected { proposer: id("B"), proposee: id("X") },
            StepEvent::Proposal { proposer: id("B"), proposee: id("Y") },
            StepEvent::Paired { proposer: id("B"), proposee: id("Y") },
            StepEvent::RoundAdvanced { round: 2 },
            StepEvent::Terminated,
        ]
    );
    assert_eq!(
        engine.matched_pairs(),
        vec![(id("A"), id("X")), (id("B"), id("Y"))]
    );
}

/// Scenario with displacement: X prefers B, so A's tentative match is
/// broken and A is re-offered in the next round.
#[test]
fn displacement_transcript() {
    let instance = two_by_two(&["B", "A"]);
    let (proposers, proposees) = instance.tables_for(Side::A);
    let mut engine = MatchingEngine::new();
    engine.start(proposers, proposees).unwrap();

    let reports = engine.run_to_completion().unwrap();
    let all_events: Vec<StepEvent> = reports.into_iter().flat_map(|r| r.events).collect();
    assert_eq!(
        all_events,
        vec![
            StepEvent::Proposal { proposer: id("A"), proposee: id("X") },
            StepEvent::Paired { proposer: id("A"), proposee: id("X") },
            StepEvent::Proposal { proposer: id("B"), proposee: id("X") },
            StepEvent::Rejected { proposer: id("A"), proposee: id("X") },
            StepEvent::Paired { proposer: id("B"), proposee: id("X") },
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

/// Either side of the same instance can propose; both directions reach
/// a stable outcome.
#[test]
fn both_directions_are_stable() {
    let (side_a, side_b) = synthetic_sides(6);
    let instance = random_instance(&side_a, &side_b).unwrap();

    for side in [Side::A, Side::B] {
        let (proposers, proposees) = instance.tables_for(side);
        let mut engine = MatchingEngine::new();
        engine.start(proposers, proposees).unwrap();
        engine.run_to_completion().unwrap();
        assert!(
            is_stable(proposers, proposees, &engine.matched_pairs()),
            "side {side} run must be stable"
        );
    }
}

/// A run is fully determined by its preference tables: re-running a
/// deserialized instance replays the same transcript.
#[test]
fn instance_round_trip_replays_identically() {
    let (side_a, side_b) = synthetic_sides(5);
    let instance = random_instance(&side_a, &side_b).unwrap();
    let json = serde_json::to_string_pretty(&instance).unwrap();
    let restored: MatchingInstance = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.id(), instance.id());

    let run = |inst: &MatchingInstance| {
        let (proposers, proposees) = inst.tables_for(Side::A);
        let mut engine = MatchingEngine::new();
        engine.start(proposers, proposees).unwrap();
        let reports = engine.run_to_completion().unwrap();
        let events: Vec<StepEvent> = reports.into_iter().flat_map(|r| r.events).collect();
        (events, engine.matched_pairs())
    };

    assert_eq!(run(&instance), run(&restored));
}

/// The serialized event stream is the documented presentation contract.
#[test]
fn step_report_wire_shape() {
    let instance = two_by_two(&["B", "A"]);
    let (proposers, proposees) = instance.tables_for(Side::A);
    let mut engine = MatchingEngine::new();
    engine.start(proposers, proposees).unwrap();
    let reports = engine.run_to_completion().unwrap();

    let json = serde_json::to_string(&reports).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    let first = &parsed[0];
    assert_eq!(first["round"], 1);
    assert_eq!(first["events"][0]["kind"], "proposal");
    assert_eq!(first["events"][0]["proposer"], "A");
    assert_eq!(first["events"][0]["proposee"], "X");

    let last = parsed.as_array().unwrap().last().unwrap();
    assert_eq!(last["terminated"], true);
    assert_eq!(
        last["events"].as_array().unwrap().last().unwrap()["kind"],
        "terminated"
    );
}

/// Malformed preference data is rejected before any state is committed.
#[test]
fn malformed_instance_rejected_at_start() {
    // B's list misses Y.
    let a = table(&[("A", &["X", "Y"]), ("B", &["X", "X"])]);
    let b = table(&[("X", &["A", "B"]), ("Y", &["A", "B"])]);
    let mut engine = MatchingEngine::new();
    assert!(matches!(engine.start(&a, &b), Err(EngineError::Invalid(_))));
    assert_eq!(engine.round(), 0);
    assert!(matches!(engine.step(), Err(EngineError::NotStarted)));
}

/// Stepping a finished run is an error and leaves the outcome untouched.
#[test]
fn terminated_engine_rejects_steps() {
    let instance = two_by_two(&["A", "B"]);
    let (proposers, proposees) = instance.tables_for(Side::A);
    let mut engine = MatchingEngine::new();
    engine.start(proposers, proposees).unwrap();
    engine.run_to_completion().unwrap();

    let pairs = engine.matched_pairs();
    for _ in 0..3 {
        assert!(matches!(
            engine.step(),
            Err(EngineError::AlreadyTerminated { .. })
        ));
    }
    assert_eq!(engine.matched_pairs(), pairs);
    assert!(engine.is_consistent());
}
