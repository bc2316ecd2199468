/// Courtroom playthrough demo — drives the engine end to end on the
/// shipped scenario, always taking the first offered option.
///
/// Run with: cargo run --example courtroom_playthrough

use docket_engine::core::engine::Engine;
use docket_engine::recorder::MemoryRecorder;

fn main() {
    let recorder = MemoryRecorder::new();
    let mut engine = Engine::builder()
        .scenario_path("scenario_data/courtroom.ron")
        .seed(2026)
        .recorder(Box::new(recorder.clone()))
        .app_id("courtroom-demo")
        .build();

    let mut view = engine.start().expect("shipped scenario should load");

    loop {
        println!("--- {} ---", view.scene_id);
        for paragraph in &view.paragraphs {
            let line: String = paragraph
                .spans
                .iter()
                .map(|span| span.text.as_str())
                .collect();
            println!("{}", line);
        }
        if let Some(risk) = view.risk {
            println!(
                "(risk updated: flight {:+}, harm {:+})",
                risk.flight, risk.harm
            );
        }

        if let Some(ending) = &view.ending {
            println!("\n{}", ending.message);
            println!("Moral: {}", ending.moral);
            break;
        }

        let first = view
            .options
            .first()
            .expect("non-terminal scenes offer options")
            .clone();
        println!("\n> {}\n", first.text);
        view = engine.choose(first.index).expect("engine is playing");
    }

    println!("\n=== Story so far ===");
    for entry in engine.transcript() {
        println!("* {}", entry.choice_text);
    }
    println!(
        "\n{} choices recorded for user {}",
        recorder.len(),
        engine.user_id()
    );
}
