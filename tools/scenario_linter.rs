/// Scenario Linter — validates a scenario payload before shipping it.
///
/// Usage: scenario_linter <scenario.ron>

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::process;

use docket_engine::schema::scenario::ScenarioSet;
use docket_engine::schema::scene::{Directive, NextRef, SceneId};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: scenario_linter <scenario.ron>");
        process::exit(0);
    }

    let path = Path::new(&args[1]);
    let set = match ScenarioSet::load_from_ron(path) {
        Ok(set) => set,
        Err(e) => {
            eprintln!("ERROR: Failed to load scenario file: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} scenes, {} case profiles",
        set.scenes.len(),
        set.case_profiles.len()
    );

    let mut errors = Vec::new();
    if let Err(e) = set.validate() {
        errors.push(e.to_string());
    }
    let warnings = lint(&set);

    println!("\n=== Scenario Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if !errors.is_empty() {
        process::exit(1);
    }
}

/// Best-effort checks beyond structural validation: unreachable scenes,
/// conditions gated on flags nothing sets, dead non-terminal scenes, and
/// a pool/directive mismatch.
fn lint(set: &ScenarioSet) -> Vec<String> {
    let mut warnings = Vec::new();

    // Flags any SetFlag directive can raise.
    let mut settable: HashSet<&str> = HashSet::new();
    let mut uses_assign_case = false;
    for scene in set.scenes.values() {
        for option in &scene.options {
            if let NextRef::Directive(directive) = &option.next {
                match directive {
                    Directive::SetFlag { flag, .. } => {
                        settable.insert(flag.as_str());
                    }
                    Directive::AssignCase => uses_assign_case = true,
                    _ => {}
                }
            }
        }
    }

    // Reachability over literal targets plus every designated directive
    // target.
    let mut reachable: HashSet<SceneId> = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(set.start.clone());
    while let Some(id) = queue.pop_front() {
        if !reachable.insert(id.clone()) {
            continue;
        }
        let Some(scene) = set.get(&id) else { continue };
        for option in &scene.options {
            let targets = match &option.next {
                NextRef::Scene(target) => vec![target.clone()],
                NextRef::Directive(directive) => directive.designated_targets(),
            };
            for target in targets {
                if set.contains(&target) && !reachable.contains(&target) {
                    queue.push_back(target);
                }
            }
        }
    }

    let mut scene_ids: Vec<&SceneId> = set.scenes.keys().collect();
    scene_ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    for &id in &scene_ids {
        if !reachable.contains(id) {
            warnings.push(format!("scene \"{}\" is unreachable from the start scene", id));
        }
    }

    for &id in &scene_ids {
        let Some(scene) = set.get(id) else { continue };
        if scene.options.is_empty() && !scene.is_terminal() {
            warnings.push(format!(
                "scene \"{}\" has no options and no ending; playthroughs stall there",
                id
            ));
        }
        for (index, option) in scene.options.iter().enumerate() {
            if let Some(condition) = &option.condition {
                if !settable.contains(condition.as_str()) {
                    warnings.push(format!(
                        "scene \"{}\" option {} is gated on flag \"{}\" that no directive sets",
                        id, index, condition
                    ));
                }
            }
        }
    }

    if uses_assign_case && set.case_profiles.is_empty() {
        warnings.push(
            "graph uses AssignCase but the payload defines no case profiles; \
             the built-in pool will be used"
                .to_string(),
        );
    }
    if !uses_assign_case && !set.case_profiles.is_empty() {
        warnings.push("payload defines case profiles but no option assigns a case".to_string());
    }

    warnings
}
