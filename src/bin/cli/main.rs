mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "scholar-cli",
    about = "Concept graph, review cards and study recommendations",
    version
)]
struct Cli {
    /// Data directory (default: platform local data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: <data-dir>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Consolidate a tutor response (JSON) into the stored graph
    Ingest {
        /// File with {"updatedConcepts": [...], "updatedLinks": [...]}
        file: PathBuf,
    },

    /// Check the stored graph for dangling links and cycles
    Validate,

    /// Show roots, leaves, depths, learning paths and clusters
    Analyze,

    /// Show one concept with its neighbors
    Show {
        /// Concept id
        id: String,
    },

    /// Review card management
    #[command(subcommand)]
    Card(CardCommand),

    /// Learning session history
    #[command(subcommand)]
    Session(SessionCommand),

    /// Suggest what to study next
    Recommend {
        /// Active session id, used for fatigue detection
        #[arg(long)]
        session: Option<String>,
    },
}

#[derive(Subcommand)]
enum CardCommand {
    /// Create a card
    Add {
        question: String,
        answer: String,
        /// Session the card came from
        #[arg(long, default_value = "manual")]
        session: String,
        /// Concept the card tests
        #[arg(long)]
        concept: Option<String>,
        /// high, medium or low
        #[arg(long)]
        priority: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// List all cards
    List,

    /// List due cards in review order
    Due {
        /// Maximum cards to show (default: review.due_batch_size)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Rate one card
    Review {
        card_id: String,
        /// SM-2 quality 1-5, or 1-4 with --ui
        rating: u8,
        /// Interpret the rating as Again/Hard/Good/Easy (1-4)
        #[arg(long)]
        ui: bool,
        /// Milliseconds spent answering
        #[arg(long, default_value = "0")]
        time_ms: u64,
    },

    /// Apply a JSON array of {"cardId", "quality", "timeTaken"} ratings
    ReviewBatch { file: PathBuf },

    /// Show review statistics
    Stats,

    /// Create cards for described concepts that have none yet
    Extract {
        #[arg(long, default_value = "manual")]
        session: String,
    },

    /// Merge cards from a JSON file, replacing cards with the same id
    Import { file: PathBuf },

    /// Write all cards to a JSON file
    Export { file: PathBuf },

    /// Delete a card
    Delete { card_id: String },
}

#[derive(Subcommand)]
enum SessionCommand {
    /// List sessions, most recent first
    List,

    /// Store a session from a JSON file
    Import { file: PathBuf },

    /// Delete a session
    Delete { id: String },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let app = app::App::new(cli.data_dir.as_deref(), cli.config.as_deref())?;
    let format = &cli.format;

    match cli.command {
        Command::Ingest { file } => commands::graph::run_ingest(&app, &file, format)?,
        Command::Validate => commands::graph::run_validate(&app, format)?,
        Command::Analyze => commands::graph::run_analyze(&app, format)?,
        Command::Show { id } => commands::graph::run_show(&app, &id, format)?,
        Command::Card(subcmd) => match subcmd {
            CardCommand::Add {
                question,
                answer,
                session,
                concept,
                priority,
                tags,
            } => {
                commands::cards::run_add(
                    &app,
                    question,
                    answer,
                    session,
                    concept,
                    priority.as_deref(),
                    tags.as_deref(),
                    format,
                )?;
            }
            CardCommand::List => commands::cards::run_list(&app, format)?,
            CardCommand::Due { limit } => commands::cards::run_due(&app, limit, format)?,
            CardCommand::Review {
                card_id,
                rating,
                ui,
                time_ms,
            } => {
                commands::cards::run_review(&app, &card_id, rating, ui, time_ms, format)?;
            }
            CardCommand::ReviewBatch { file } => {
                commands::cards::run_review_batch(&app, &file, format)?
            }
            CardCommand::Stats => commands::cards::run_stats(&app, format)?,
            CardCommand::Extract { session } => {
                commands::cards::run_extract(&app, &session, format)?
            }
            CardCommand::Import { file } => commands::cards::run_import(&app, &file, format)?,
            CardCommand::Export { file } => commands::cards::run_export(&app, &file, format)?,
            CardCommand::Delete { card_id } => commands::cards::run_delete(&app, &card_id, format)?,
        },
        Command::Session(subcmd) => match subcmd {
            SessionCommand::List => commands::sessions::run_list(&app, format)?,
            SessionCommand::Import { file } => commands::sessions::run_import(&app, &file, format)?,
            SessionCommand::Delete { id } => commands::sessions::run_delete(&app, &id, format)?,
        },
        Command::Recommend { session } => {
            commands::recommend::run(&app, session.as_deref(), format)?;
        }
    }

    Ok(())
}
