use anyhow::Result;

use scholar_lib::recommendations::RecommendationEngine;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, session_id: Option<&str>, format: &OutputFormat) -> Result<()> {
    let graph = app.load_graph()?;
    let cards = app.list_cards()?;
    let sessions = app.list_sessions()?;

    let engine = RecommendationEngine::new(app.config.clone());
    let recommendations =
        engine.generate(&graph.concepts, &graph.links, &cards, session_id, &sessions);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&recommendations)?),
        OutputFormat::Plain => {
            if recommendations.is_empty() {
                println!("Nothing to recommend yet. Ingest some concepts or add cards first.");
                return Ok(());
            }

            for (i, rec) in recommendations.iter().enumerate() {
                let time = rec
                    .estimated_time
                    .map(|m| format!(", ~{} min", m))
                    .unwrap_or_default();
                println!("{}. {} [{}{}]", i + 1, rec.title, rec.priority.as_str(), time);
                println!("   {}", rec.description);
                println!("   Why: {}", rec.reason);
                for question in &rec.suggested_questions {
                    println!("   ? {}", question);
                }
            }
        }
    }

    Ok(())
}
