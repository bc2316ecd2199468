/// Interactive terminal playthrough of a scenario file.
///
/// Usage: play <scenario.ron> [--seed <n>]

use std::io::{BufRead, Write};
use std::process;

use docket_engine::core::engine::{Engine, SceneView};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: play <scenario.ron> [--seed <n>]");
        process::exit(0);
    }

    let mut seed = 0u64;
    let mut i = 2;
    while i < args.len() {
        if args[i] == "--seed" && i + 1 < args.len() {
            i += 1;
            seed = args[i].parse().unwrap_or_else(|_| {
                eprintln!("ERROR: --seed expects an integer");
                process::exit(1);
            });
        }
        i += 1;
    }

    let mut engine = Engine::builder()
        .scenario_path(&args[1])
        .seed(seed)
        .build();

    let mut view = match engine.start() {
        Ok(view) => view,
        Err(_) => {
            eprintln!("ERROR: scenario is not ready; check the payload path");
            process::exit(1);
        }
    };

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print_view(&view);

        if view.ending.is_some() {
            print!("\nPlay again? [y/N] ");
            let _ = std::io::stdout().flush();
            match lines.next() {
                Some(Ok(answer)) if answer.trim().eq_ignore_ascii_case("y") => {
                    view = match engine.restart() {
                        Ok(view) => view,
                        Err(_) => break,
                    };
                    continue;
                }
                _ => break,
            }
        }

        print!("> ");
        let _ = std::io::stdout().flush();
        let Some(Ok(line)) = lines.next() else { break };
        let Ok(number) = line.trim().parse::<usize>() else {
            println!("Pick an option by number.");
            continue;
        };
        let Some(option) = number
            .checked_sub(1)
            .and_then(|i| view.options.get(i))
        else {
            println!("No such option.");
            continue;
        };
        view = match engine.choose(option.index) {
            Ok(view) => view,
            Err(_) => break,
        };
    }
}

fn print_view(view: &SceneView) {
    println!();
    for paragraph in &view.paragraphs {
        for span in &paragraph.spans {
            if span.bold {
                print!("{}{}{}", BOLD, span.text, RESET);
            } else {
                print!("{}", span.text);
            }
        }
        println!();
    }

    if let Some(risk) = view.risk {
        println!(
            "\n[risk assessment updated: flight {:+}, community harm {:+}]",
            risk.flight, risk.harm
        );
    }
    println!(
        "[flight risk {} | community harm {} | professionalism {}]",
        view.score.flight_risk, view.score.community_harm, view.score.professionalism
    );

    if let Some(ending) = &view.ending {
        println!("\n{}{}{}", BOLD, ending.message, RESET);
        println!("Moral: {}", ending.moral);
        return;
    }

    println!();
    for (number, option) in view.options.iter().enumerate() {
        println!("  {}. {}", number + 1, option.text);
    }
}
