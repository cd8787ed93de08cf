//! Displacement walkthrough.
//!
//! Shows a tentative match being broken: Grace bumps Ada from Xia, and
//! Ada gets a fresh offer in the next round. Deferred acceptance makes
//! every pairing provisional until the run terminates.

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
    println!("╔═══════════════════════════════════════════════╗");
    println!("║  pairing-engine: Displacement Walkthrough     ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    // Both proposers rank Xia first, but Xia prefers Grace — so Ada's
    // early success does not last.
    let proposers = table(&[("Ada", &["Xia", "Yuri"]), ("Grace", &["Xia", "Yuri"])]);
    let proposees = table(&[("Xia", &["Grace", "Ada"]), ("Yuri", &["Ada", "Grace"])]);

    println!("Preferences:");
    println!("  Ada:   Xia > Yuri        Xia:  Grace > Ada");
    println!("  Grace: Xia > Yuri        Yuri: Ada > Grace\n");

    let mut engine = MatchingEngine::new();
    engine.start(&proposers, &proposees).expect("valid instance");

    let mut step = 0;
    while !engine.is_terminated() {
        step += 1;
        let report = engine.step().expect("engine is running");
        println!("Step {} (round {}):", step, report.round);
        for event in &report.events {
            println!("  {}", event);
        }
        println!(
            "  -> {} of {} matched\n",
            report.matched_count,
            engine.proposers().len()
        );
    }

    println!("Final matching:");
    for (proposer, proposee) in engine.matched_pairs() {
        println!("  {} and {}", proposer, proposee);
    }
}
