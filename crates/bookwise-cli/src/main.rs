use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookwise_core::{ai::Assistant, storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "bookwise")]
#[command(author, version, about = "AI chapter summaries and book recommendations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// AI provider: deepseek, glm or gemini (defaults to the configured provider)
    #[arg(short = 'p', long, global = true)]
    provider: Option<String>,

    /// API key (defaults to $BOOKWISE_API_KEY, then the configured key)
    #[arg(short = 'k', long, global = true)]
    api_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a chapter, reusing the cached summary if there is one
    Summarize(ChapterArgs),
    /// Summarize a chapter again and replace the cached summary
    Regenerate(ChapterArgs),
    /// Inspect or purge cached summaries
    Summary {
        #[command(subcommand)]
        action: SummaryAction,
    },
    /// Ask for book recommendations (the exchange is kept in the chat history)
    Recommend {
        /// What you would like to read
        query: String,
    },
    /// Inspect or reset the recommendation chat
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },
}

#[derive(Args)]
pub struct ChapterArgs {
    #[arg(long)]
    pub book_id: String,
    #[arg(long)]
    pub chapter_id: String,
    /// Book title used in the prompt
    #[arg(long)]
    pub book_name: String,
    /// Chapter title used in the prompt
    #[arg(long)]
    pub chapter_title: String,
    /// Plain-text file with the chapter content
    #[arg(short = 'f', long)]
    pub file: PathBuf,
}

#[derive(Subcommand)]
enum SummaryAction {
    /// Show one chapter's summary, or every summary of a book
    Show {
        #[arg(long)]
        book_id: String,
        #[arg(long)]
        chapter_id: Option<String>,
    },
    /// Delete one chapter's summary, or every summary of a book
    Purge {
        #[arg(long)]
        book_id: String,
        #[arg(long)]
        chapter_id: Option<String>,
    },
    /// Count cached summaries of a book
    Count {
        #[arg(long)]
        book_id: String,
    },
}

#[derive(Subcommand)]
enum ChatAction {
    /// Print the saved conversation
    History,
    /// Delete the saved conversation
    Clear,
}

/// Provider and API key after applying flags, environment and config
pub struct Credentials {
    pub provider: String,
    pub api_key: String,
}

impl Credentials {
    fn resolve(cli_provider: Option<String>, cli_api_key: Option<String>, config: &AppConfig) -> Self {
        let provider = cli_provider.unwrap_or_else(|| config.ai.provider.clone());
        let (api_key, source) = match cli_api_key {
            Some(key) => (key, "command line"),
            None => match std::env::var("BOOKWISE_API_KEY") {
                Ok(key) => (key, "BOOKWISE_API_KEY"),
                Err(_) => match config.ai.api_key.clone() {
                    Some(key) => (key, "config file"),
                    None => (String::new(), "none"),
                },
            },
        };

        if api_key.trim().is_empty() {
            warn!("No API key configured; only cached summaries are available");
        } else {
            debug!("Using {} API key from {}", provider, source);
        }

        Self { provider, api_key }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Initialize database
    let db = Database::new(&config).await?;

    info!("Using database at {}", config.database_path().display());

    let credentials = Credentials::resolve(cli.provider, cli.api_key, &config);

    match cli.command {
        Commands::Summarize(args) => {
            let assistant = Assistant::new(db, &config.ai)?;
            commands::summarize::run(&assistant, &credentials, &args, false).await
        }
        Commands::Regenerate(args) => {
            let assistant = Assistant::new(db, &config.ai)?;
            commands::summarize::run(&assistant, &credentials, &args, true).await
        }
        Commands::Summary { action } => match action {
            SummaryAction::Show { book_id, chapter_id } => {
                commands::summary::show(&db, &book_id, chapter_id.as_deref()).await
            }
            SummaryAction::Purge { book_id, chapter_id } => {
                commands::summary::purge(&db, &book_id, chapter_id.as_deref()).await
            }
            SummaryAction::Count { book_id } => commands::summary::count(&db, &book_id).await,
        },
        Commands::Recommend { query } => {
            let assistant = Assistant::new(db, &config.ai)?;
            commands::recommend::run(&assistant, &credentials, &query).await
        }
        Commands::Chat { action } => match action {
            ChatAction::History => commands::chat::history(db).await,
            ChatAction::Clear => commands::chat::clear(db).await,
        },
    }
}
