use std::sync::Arc;

use clap::{
    Parser,
    Subcommand,
};
use fiszki::{
    core::GenerateRequest,
    generation::{
        MockSuggestionSource,
        SuggestionGenerator,
    },
    llm::{
        ChatCompletion,
        OpenRouterClient,
    },
    review::ReviewSession,
    store::{
        ActionLog,
        JsonActionLog,
    },
    FiszkiError,
    FlashcardStore,
    HttpFlashcardStore,
    LocalFlashcardStore,
    Settings,
};
use serde_json::json;
use tracing::{
    error,
    info,
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "fiszki")]
#[command(version, about = "Vocabulary flashcard suggestions from free text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate suggestions and print them as JSON
    Generate {
        /// Source text; without it the offline topic pool is used
        #[arg(long)]
        text: Option<String>,
    },
    /// Generate suggestions, accept the given indices and reject the rest
    Review {
        #[arg(long)]
        text: String,
        /// Zero-based indices of suggestions to accept
        #[arg(long, num_args = 1..)]
        accept: Vec<usize>,
    },
    /// List flashcards in the local collection
    List,
    /// Delete a flashcard from the local collection
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "Command failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), FiszkiError> {
    let settings = Settings::load();

    match cli.command {
        Commands::Generate { text } => {
            let generator = build_generator(&settings)?;
            let suggestions = generator.generate(text.as_deref()).await;
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        }
        Commands::Review { text, accept } => {
            let action_log = open_action_log(&settings)?;
            let generator = Arc::new(build_generator(&settings)?);
            let session = ReviewSession::new(generator, build_store(&settings, &action_log)?)
                .with_action_log(action_log);
            let response = session.generate(&GenerateRequest { text }).await?;
            check_indices(&accept, response.suggestions.len())?;

            let accepted: Vec<_> = response
                .suggestions
                .iter()
                .enumerate()
                .filter(|(index, _)| accept.contains(index))
                .map(|(_, suggestion)| session.accept(suggestion.client_id))
                .collect();
            for result in futures::future::join_all(accepted).await {
                result?;
            }

            for suggestion in &response.suggestions {
                session.reject(suggestion.client_id);
            }

            let records: Vec<_> = session
                .tracker()
                .records()
                .iter()
                .map(|record| {
                    json!({
                        "targetWord": record.suggestion.suggestion.target_word,
                        "sourceWord": record.suggestion.suggestion.source_word,
                        "status": record.status,
                        "errorMessage": record.error_message,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::List => {
            let store = LocalFlashcardStore::open(settings.user_id, settings.store_path())?;
            println!("{}", serde_json::to_string_pretty(&store.list())?);
        }
        Commands::Delete { id } => {
            let store = open_local_store(&settings, &open_action_log(&settings)?)?;
            store.delete(id).await?;
            info!(%id, "Flashcard deleted");
        }
    }

    Ok(())
}

fn build_generator(settings: &Settings) -> Result<SuggestionGenerator, FiszkiError> {
    let client = match settings.api_key() {
        Some(api_key) => {
            let client = OpenRouterClient::with_api_url(api_key, &settings.api_url)?;
            Some(Arc::new(client) as Arc<dyn ChatCompletion>)
        }
        None => {
            info!("No API key configured, suggestions come from the offline topic pool");
            None
        }
    };

    let generator = SuggestionGenerator::with_parts(client, MockSuggestionSource::default())
        .with_model(&settings.model);
    info!(model = generator.model(), "Suggestion generator ready");
    Ok(generator)
}

/// A remote store keeps its own action log; only the local one writes ADD entries here.
fn build_store(
    settings: &Settings,
    action_log: &Arc<dyn ActionLog>,
) -> Result<Arc<dyn FlashcardStore>, FiszkiError> {
    match &settings.flashcards_api_url {
        Some(base_url) => Ok(Arc::new(HttpFlashcardStore::new(base_url)?)),
        None => Ok(Arc::new(open_local_store(settings, action_log)?)),
    }
}

fn open_local_store(
    settings: &Settings,
    action_log: &Arc<dyn ActionLog>,
) -> Result<LocalFlashcardStore, FiszkiError> {
    Ok(LocalFlashcardStore::open(settings.user_id, settings.store_path())?
        .with_action_log(action_log.clone()))
}

fn open_action_log(settings: &Settings) -> Result<Arc<dyn ActionLog>, FiszkiError> {
    Ok(Arc::new(JsonActionLog::open(settings.user_id, settings.action_log_path())?))
}

fn check_indices(indices: &[usize], batch_len: usize) -> Result<(), FiszkiError> {
    match indices.iter().find(|index| **index >= batch_len) {
        Some(index) => Err(FiszkiError::InvalidRequest(format!(
            "Suggestion index {index} is out of range, the batch has {batch_len} suggestions"
        ))),
        None => Ok(()),
    }
}
