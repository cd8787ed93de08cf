//! pairing-engine CLI
//!
//! Drive deferred-acceptance runs from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Run a random 6-per-side instance, side A proposing
//! pairing-engine run --size 6
//!
//! # Run an instance from a JSON file with side B proposing
//! pairing-engine run --input instance.json --proposers b
//!
//! # Generate a random instance for later runs
//! pairing-engine generate --size 8 --output instance.json
//!
//! # Aggregate statistics over many random runs
//! pairing-engine stats --runs 50 --size 10
//! ```

use pairing_engine::analysis::stability::is_stable;
use pairing_engine::analysis::summary::RunSummary;
use pairing_engine::core::event::StepEvent;
use pairing_engine::core::participant::ParticipantId;
use pairing_engine::core::preference::{MatchingInstance, Side};
use pairing_engine::engine::deferred_acceptance::{MatchingEngine, StepReport};
use pairing_engine::simulation::batch::{run_batch, BatchConfig};
use pairing_engine::simulation::generator::{random_instance, synthetic_sides};
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"pairing-engine — stepwise Gale-Shapley deferred-acceptance matching

USAGE:
    pairing-engine <COMMAND> [OPTIONS]

COMMANDS:
    run         Run one instance to completion, printing the transcript
    generate    Generate a random instance (JSON)
    stats       Run many random instances and aggregate statistics
    help        Show this message

OPTIONS (run):
    --input <FILE>      Path to a JSON instance file (default: random)
    --size <N>          Members per side for a random instance (default: 6)
    --proposers <SIDE>  Which side proposes: a or b (default: a)
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (generate):
    --size <N>          Members per side (default: 6)
    --side-a <LIST>     Comma-separated names for side A (overrides --size)
    --side-b <LIST>     Comma-separated names for side B (overrides --size)
    --output <FILE>     Write to file instead of stdout

OPTIONS (stats):
    --runs <N>          Number of random instances (default: 20)
    --size <N>          Members per side (default: 8)
    --format <FORMAT>   Output format: text (default) or json

EXAMPLES:
    pairing-engine run --size 6
    pairing-engine run --input instance.json --proposers b --format json
    pairing-engine generate --side-a Ada,Grace --side-b Xia,Yuri
    pairing-engine stats --runs 100 --size 12"#
    );
}

/// JSON output schema for `run --format json`.
#[derive(serde::Serialize)]
struct RunOutput {
    instance: String,
    proposing_side: Side,
    steps: Vec<StepReport>,
    summary: RunSummary,
    stable: bool,
}

fn load_instance(path: &str) -> MatchingInstance {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });

    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "id": "8c4a4…",
  "created_at": "2026-01-01T00:00:00Z",
  "side_a": {{ "Ada": ["Xia", "Yuri"], "Grace": ["Yuri", "Xia"] }},
  "side_b": {{ "Xia": ["Ada", "Grace"], "Yuri": ["Grace", "Ada"] }}
}}"#
        );
        process::exit(1);
    })
}

fn parse_side(value: &str) -> Side {
    match value {
        "a" | "A" => Side::A,
        "b" | "B" => Side::B,
        other => {
            eprintln!("--proposers must be 'a' or 'b', got '{}'", other);
            process::exit(1);
        }
    }
}

fn parse_names(list: &str) -> Vec<ParticipantId> {
    list.split(',')
        .map(|s| ParticipantId::new(s.trim()))
        .collect()
}

fn cmd_run(args: &[String]) {
    let mut input_path: Option<String> = None;
    let mut size = 6usize;
    let mut proposing = Side::A;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--size" => {
                i += 1;
                size = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--size requires a number");
                    process::exit(1);
                });
            }
            "--proposers" => {
                i += 1;
                proposing = parse_side(args.get(i).map(String::as_str).unwrap_or_else(|| {
                    eprintln!("--proposers requires 'a' or 'b'");
                    process::exit(1);
                }));
            }
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let instance = match input_path {
        Some(path) => load_instance(&path),
        None => {
            let (side_a, side_b) = synthetic_sides(size);
            random_instance(&side_a, &side_b).unwrap_or_else(|e| {
                eprintln!("Error generating instance: {}", e);
                process::exit(1);
            })
        }
    };

    let (proposers, proposees) = instance.tables_for(proposing);
    let mut engine = MatchingEngine::new();
    engine.start(proposers, proposees).unwrap_or_else(|e| {
        eprintln!("Error starting run: {}", e);
        process::exit(1);
    });
    let reports = engine.run_to_completion().unwrap_or_else(|e| {
        eprintln!("Error during run: {}", e);
        process::exit(1);
    });

    let summary = RunSummary::from_run(&reports, &engine);
    let stable = is_stable(proposers, proposees, &engine.matched_pairs());

    if format == "json" {
        let output = RunOutput {
            instance: instance.id().to_string(),
            proposing_side: proposing,
            steps: reports,
            summary,
            stable,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
    } else {
        println!(
            "Instance {} ({} per side), side {} proposes",
            instance.id(),
            proposers.len(),
            proposing
        );
        let mut current_round = 0;
        for report in &reports {
            if report.round != current_round {
                current_round = report.round;
                println!("\nRound {}", current_round);
            }
            for event in &report.events {
                match event {
                    // The round header above already covers these.
                    StepEvent::RoundAdvanced { .. } | StepEvent::Terminated => {}
                    other => println!("  {}", other),
                }
            }
        }
        println!();
        println!("{}", summary);
        println!("Stable: {}", stable);
    }
}

fn cmd_generate(args: &[String]) {
    let mut size = 6usize;
    let mut side_a: Option<Vec<ParticipantId>> = None;
    let mut side_b: Option<Vec<ParticipantId>> = None;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--size" => {
                i += 1;
                size = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--size requires a number");
                    process::exit(1);
                });
            }
            "--side-a" => {
                i += 1;
                side_a = Some(parse_names(args.get(i).map(String::as_str).unwrap_or_else(
                    || {
                        eprintln!("--side-a requires a comma-separated list");
                        process::exit(1);
                    },
                )));
            }
            "--side-b" => {
                i += 1;
                side_b = Some(parse_names(args.get(i).map(String::as_str).unwrap_or_else(
                    || {
                        eprintln!("--side-b requires a comma-separated list");
                        process::exit(1);
                    },
                )));
            }
            "--output" => {
                i += 1;
                output_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--output requires a file path");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let (names_a, names_b) = match (side_a, side_b) {
        (Some(a), Some(b)) => (a, b),
        (None, None) => synthetic_sides(size),
        _ => {
            eprintln!("--side-a and --side-b must be given together");
            process::exit(1);
        }
    };

    let instance = random_instance(&names_a, &names_b).unwrap_or_else(|e| {
        eprintln!("Error generating instance: {}", e);
        process::exit(1);
    });

    let json = serde_json::to_string_pretty(&instance).unwrap();
    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated instance {} with {} participants per side → {}",
            instance.id(),
            names_a.len(),
            path
        );
    } else {
        println!("{}", json);
    }
}

fn cmd_stats(args: &[String]) {
    let mut config = BatchConfig::default();
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                config.runs = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--runs requires a number");
                    process::exit(1);
                });
            }
            "--size" => {
                i += 1;
                config.side_size =
                    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--size requires a number");
                        process::exit(1);
                    });
            }
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let stats = run_batch(&config).unwrap_or_else(|e| {
        eprintln!("Error running batch: {}", e);
        process::exit(1);
    });

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats).unwrap());
    } else {
        println!("{}", stats);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "run" => cmd_run(rest),
        "generate" => cmd_generate(rest),
        "stats" => cmd_stats(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
