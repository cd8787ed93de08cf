//! Basic stepwise matching example.
//!
//! Walks a tiny two-by-two instance where both proposers agree on their
//! favorite, showing one proposal per step and the final stable pairing.

use pairing_engine::analysis::stability::is_stable;
use pairing_engine::analysis::summary::RunSummary;
use pairing_engine::core::participant::ParticipantId;
use pairing_engine::core::preference::PreferenceTable;
use pairing_engine::engine::MatchingEngine;

fn table(rows: &[(&str, &[&str])]) -> PreferenceTable {
    rows.iter()
        .map(|&(owner, list)| {
            (
                ParticipantId::new(owner),
                list.iter().map(|s| ParticipantId::new(*s)).collect(),
            )
        })
        .collect()
}

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║  pairing-engine: Basic Stepwise Example  ║");
    println!("╚══════════════════════════════════════════╝\n");

    // Ada and Grace both rank Xia first; Xia and Yuri both rank Ada first.
    let proposers = table(&[("Ada", &["Xia", "Yuri"]), ("Grace", &["Xia", "Yuri"])]);
    let proposees = table(&[("Xia", &["Ada", "Grace"]), ("Yuri", &["Ada", "Grace"])]);

    let mut engine = MatchingEngine::new();
    engine.start(&proposers, &proposees).expect("valid instance");

    println!("Stepping until every proposer holds a match:\n");
    let mut reports = Vec::new();
    while !engine.is_terminated() {
        let report = engine.step().expect("engine is running");
        for event in &report.events {
            println!("  [round {}] {}", report.round, event);
        }
        reports.push(report);
    }

    println!();
    let summary = RunSummary::from_run(&reports, &engine);
    println!("{}", summary);

    println!(
        "Stable: {}",
        is_stable(&proposers, &proposees, &engine.matched_pairs())
    );
}
