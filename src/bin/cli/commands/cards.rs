use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use scholar_lib::flashcards::algorithm::{format_interval, preview_intervals, ui_rating_to_quality};
use scholar_lib::flashcards::{
    cards_from_concepts, create_card, memory_strength, CardRating, Priority, ReviewCard,
};

use crate::app::{split_tags, truncate, App};
use crate::OutputFormat;

#[allow(clippy::too_many_arguments)]
pub fn run_add(
    app: &App,
    question: String,
    answer: String,
    session: String,
    concept: Option<String>,
    priority: Option<&str>,
    tags: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let priority = match priority {
        Some(p) => p.parse::<Priority>().map_err(anyhow::Error::msg)?,
        None => app.config.review.default_priority,
    };
    let card = create_card(
        question,
        answer,
        session,
        concept,
        Some(priority),
        tags.map(split_tags),
    );
    let card = app.cards.add_card(card).context("Failed to save card")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&card)?),
        OutputFormat::Plain => {
            println!("Created card: \"{}\"", card.question);
            println!("  ID: {}", card.id);
        }
    }

    Ok(())
}

pub fn run_list(app: &App, format: &OutputFormat) -> Result<()> {
    let cards = app.list_cards()?;
    print_cards(&cards, format, "No cards yet.")
}

pub fn run_due(app: &App, limit: Option<usize>, format: &OutputFormat) -> Result<()> {
    let mut due = app.cards.get_due_cards().context("Failed to load due cards")?;
    due.truncate(limit.unwrap_or(app.config.review.due_batch_size));

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = due
                .iter()
                .map(|card| {
                    serde_json::json!({
                        "id": card.id,
                        "question": card.question,
                        "priority": card.priority,
                        "memoryStrength": memory_strength(card),
                        "previewIntervals": preview_intervals(card),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if due.is_empty() {
                println!("Nothing due.");
                return Ok(());
            }

            for card in &due {
                let [again, hard, good, easy] = preview_intervals(card).map(format_interval);
                println!("{}  {}", short_id(&card.id), card.question);
                println!(
                    "          {} priority, strength {:.0}  Again {} / Hard {} / Good {} / Easy {}",
                    card.priority.as_str(),
                    memory_strength(card),
                    again,
                    hard,
                    good,
                    easy
                );
            }
            println!("\n{} card(s) due", due.len());
        }
    }

    Ok(())
}

pub fn run_review(
    app: &App,
    card_id: &str,
    rating: u8,
    ui: bool,
    time_ms: u64,
    format: &OutputFormat,
) -> Result<()> {
    let card = app.find_card(card_id)?;
    let quality = if ui { ui_rating_to_quality(rating) } else { rating };
    let updated = app
        .cards
        .submit_review(&card.id, quality, time_ms)
        .context("Failed to submit review")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&updated)?),
        OutputFormat::Plain => {
            println!("Reviewed \"{}\" with quality {}", updated.question, quality);
            println!(
                "  Next review in {} ({}), ease {:.2}",
                format_interval(updated.interval),
                updated.next_review_date.format("%Y-%m-%d"),
                updated.ease_factor
            );
        }
    }

    Ok(())
}

pub fn run_review_batch(app: &App, file: &Path, format: &OutputFormat) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let ratings: Vec<CardRating> =
        serde_json::from_str(&content).context("Failed to parse ratings")?;
    let cards = app.cards.submit_reviews(&ratings).context("Failed to submit reviews")?;

    let reviewed: Vec<&ReviewCard> = cards
        .iter()
        .filter(|c| ratings.iter().any(|r| r.card_id == c.id))
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reviewed)?),
        OutputFormat::Plain => {
            println!("Applied {} of {} rating(s)", reviewed.len(), ratings.len());
            for card in reviewed {
                println!(
                    "  {}  next in {}",
                    truncate(&card.question, 50),
                    format_interval(card.interval)
                );
            }
        }
    }

    Ok(())
}

pub fn run_stats(app: &App, format: &OutputFormat) -> Result<()> {
    let stats = app
        .cards
        .get_review_stats(app.config.recommendations.utc_offset_minutes)
        .context("Failed to compute review statistics")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Plain => {
            println!(
                "Cards:      {} ({} new, {} learning, {} mature)",
                stats.total_cards, stats.new_cards, stats.learning_cards, stats.mature_cards
            );
            println!("Due now:    {}", stats.due_cards);
            println!(
                "Today:      {} reviews, {} correct",
                stats.reviews_today, stats.correct_today
            );
            println!("Ease:       {:.2} average", stats.average_ease_factor);
            println!("Retention:  {:.0}%", stats.retention_rate * 100.0);
            println!("Streak:     {} day(s)", stats.streak_days);
        }
    }

    Ok(())
}

pub fn run_extract(app: &App, session: &str, format: &OutputFormat) -> Result<()> {
    let graph = app.load_graph()?;
    let existing = app.list_cards()?;
    let extracted = cards_from_concepts(&graph.concepts, &existing, session);
    let count = app.cards.add_cards(extracted.clone()).context("Failed to save cards")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&extracted)?),
        OutputFormat::Plain => {
            println!("Created {} card(s) from {} concept(s)", count, graph.concepts.len());
            for card in &extracted {
                println!("  {}  {}", short_id(&card.id), card.question);
            }
        }
    }

    Ok(())
}

pub fn run_import(app: &App, file: &Path, format: &OutputFormat) -> Result<()> {
    let count = app
        .cards
        .import_cards(file)
        .with_context(|| format!("Failed to import cards from {}", file.display()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "imported": count })),
        OutputFormat::Plain => println!("Imported {} card(s)", count),
    }

    Ok(())
}

pub fn run_export(app: &App, file: &Path, format: &OutputFormat) -> Result<()> {
    let count = app
        .cards
        .export_cards(file)
        .with_context(|| format!("Failed to export cards to {}", file.display()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "exported": count })),
        OutputFormat::Plain => println!("Exported {} card(s) to {}", count, file.display()),
    }

    Ok(())
}

pub fn run_delete(app: &App, card_id: &str, format: &OutputFormat) -> Result<()> {
    let card = app.find_card(card_id)?;
    app.cards.delete_card(&card.id).context("Failed to delete card")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "deleted": card.id })),
        OutputFormat::Plain => println!("Deleted card \"{}\"", card.question),
    }

    Ok(())
}

fn print_cards(cards: &[ReviewCard], format: &OutputFormat, empty_message: &str) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(cards)?),
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("{}", empty_message);
                return Ok(());
            }

            let question_width = 50;
            println!(
                "{:<8} {:<qw$} {:<8} {:<8} Next",
                "ID",
                "Question",
                "Priority",
                "Interval",
                qw = question_width
            );
            println!(
                "{} {} {} {} {}",
                "\u{2500}".repeat(8),
                "\u{2500}".repeat(question_width),
                "\u{2500}".repeat(8),
                "\u{2500}".repeat(8),
                "\u{2500}".repeat(10)
            );

            for card in cards {
                println!(
                    "{:<8} {:<qw$} {:<8} {:<8} {}",
                    short_id(&card.id),
                    truncate(&card.question, question_width),
                    card.priority.as_str(),
                    format_interval(card.interval),
                    card.next_review_date.format("%Y-%m-%d"),
                    qw = question_width
                );
            }

            println!("\n{} cards total", cards.len());
        }
    }

    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
