//! End-to-end walkthrough: infer field types from a raw dataset, generate
//! the default multimodal spec, derive all three outputs, then narrow them
//! with a selection coming from the visual view.
//!
//! Run with: cargo run -p triptych-app --example derive_demo

use triptych_app::app::{SelectionUpdate, TriptychApp};
use triptych_common::dataset::Dataset;
use triptych_common::row;
use triptych_common::types::ViewKind;
use triptych_spec::predicate::Predicate;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let dataset = Dataset::from_rows(vec![
        row! { "month" => "Jan", "region" => "east", "sales" => 12.0 },
        row! { "month" => "Jan", "region" => "west", "sales" => 7.0 },
        row! { "month" => "Feb", "region" => "east", "sales" => 9.0 },
        row! { "month" => "Feb", "region" => "west", "sales" => 14.0 },
        row! { "month" => "Mar", "region" => "east", "sales" => 21.0 },
        row! { "month" => "Mar", "region" => "west", "sales" => 3.0 },
    ]);

    let mut app = TriptychApp::from_dataset("sales", dataset)?
        .ok_or("no default spec for this dataset")?;

    println!("== spec ==");
    println!("{}", serde_json::to_string_pretty(app.spec())?);

    println!("\n== renderable chart ==");
    if let Some(render) = &app.outputs().render {
        println!("{}", serde_json::to_string_pretty(render)?);
    }

    println!("\n== structure ==");
    for field in &app.outputs().structure.fields {
        println!("  {} ({}): {}", field.name, field.measure_type, field.description);
    }

    println!("\n== timeline ==");
    for (unit, timeline) in &app.outputs().timelines {
        println!("unit {unit}: {} notes, {:.2}s", timeline.notes.len(), timeline.total_duration);
        for note in &timeline.notes {
            println!(
                "  t={:.2} dur={:.2} pitch={:?} announce={:?}",
                note.time, note.duration, note.pitch, note.announce
            );
        }
    }

    // A brush in the chart narrows the other two views.
    app.update_selection(SelectionUpdate {
        source: ViewKind::Visual,
        predicate: Some(Predicate::equal("region", "east")),
    })?;

    println!("\n== timeline after selecting region east ==");
    for (unit, timeline) in &app.outputs().timelines {
        println!("unit {unit}: {} notes", timeline.notes.len());
    }

    Ok(())
}
