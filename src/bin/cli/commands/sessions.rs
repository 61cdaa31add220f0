use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use scholar_lib::sessions::{LearningSession, SessionSummary};

use crate::app::{truncate, App};
use crate::OutputFormat;

pub fn run_list(app: &App, format: &OutputFormat) -> Result<()> {
    let summaries: Vec<SessionSummary> =
        app.list_sessions()?.iter().map(SessionSummary::from).collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Plain => {
            if summaries.is_empty() {
                println!("No sessions.");
                return Ok(());
            }

            let title_width = summaries
                .iter()
                .map(|s| s.title.len())
                .max()
                .unwrap_or(5)
                .clamp(5, 40);
            println!(
                "{:<tw$} {:>8} {:>8} Updated",
                "Title",
                "Messages",
                "Concepts",
                tw = title_width
            );
            println!(
                "{} {} {} {}",
                "\u{2500}".repeat(title_width),
                "\u{2500}".repeat(8),
                "\u{2500}".repeat(8),
                "\u{2500}".repeat(16)
            );
            for summary in &summaries {
                println!(
                    "{:<tw$} {:>8} {:>8} {}",
                    truncate(&summary.title, title_width),
                    summary.message_count,
                    summary.concept_count,
                    summary.updated_at.format("%Y-%m-%d %H:%M"),
                    tw = title_width
                );
            }
        }
    }

    Ok(())
}

pub fn run_import(app: &App, file: &Path, format: &OutputFormat) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let session: LearningSession =
        serde_json::from_str(&content).context("Failed to parse session")?;
    app.sessions.save_session(&session).context("Failed to save session")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&SessionSummary::from(&session))?)
        }
        OutputFormat::Plain => println!("Stored session \"{}\" ({})", session.title, session.id),
    }

    Ok(())
}

pub fn run_delete(app: &App, id: &str, format: &OutputFormat) -> Result<()> {
    app.sessions.delete_session(id).context("Failed to delete session")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "deleted": id })),
        OutputFormat::Plain => println!("Deleted session {}", id),
    }

    Ok(())
}
