use std::{
    path::PathBuf,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    error,
    info,
    warn,
};
use uuid::Uuid;

use super::{
    action_log::{
        record_action,
        Action,
        ActionLog,
    },
    FlashcardStore,
    ALREADY_EXISTS_MESSAGE,
};
use crate::{
    core::{
        CreateFlashcardCommand,
        FiszkiError,
        PersistedFlashcard,
        StoreError,
    },
    persistence::{
        load_json,
        save_json_async,
    },
};

pub const MAX_WORD_CHARS: usize = 100;
pub const MAX_EXAMPLE_CHARS: usize = 300;

/// Normalises user-facing flashcard text before it is stored.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    whitespace: Regex,
    control_chars: Regex,
}

impl Sanitizer {
    pub fn new() -> Result<Self, FiszkiError> {
        Ok(Self {
            whitespace: Regex::new(r"\s+")?,
            control_chars: Regex::new(r"[\x00-\x1F\x7F-\x9F]")?,
        })
    }

    /// Trims, blanks out control characters, collapses whitespace and capitalises both words.
    pub fn sanitize(&self, command: &CreateFlashcardCommand) -> CreateFlashcardCommand {
        CreateFlashcardCommand {
            source_word: capitalize_first(&self.clean(&command.source_word)),
            target_word: capitalize_first(&self.clean(&command.target_word)),
            example_sentence: self.clean(&command.example_sentence),
        }
    }

    fn clean(&self, text: &str) -> String {
        let text = self.control_chars.replace_all(text, " ");
        self.whitespace.replace_all(text.trim(), " ").trim().to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocalStoreData {
    flashcards: Vec<PersistedFlashcard>,
}

/// In-process flashcard collection for one user, optionally mirrored to a JSON file.
///
/// File writes run on the blocking pool; the collection lock is never held across them.
pub struct LocalFlashcardStore {
    user_id: Uuid,
    sanitizer: Sanitizer,
    data: Mutex<LocalStoreData>,
    file_path: Option<PathBuf>,
    write_gate: tokio::sync::Mutex<()>,
    action_log: Option<Arc<dyn ActionLog>>,
}

impl LocalFlashcardStore {
    pub fn in_memory(user_id: Uuid) -> Result<Self, FiszkiError> {
        Self::with_data(user_id, LocalStoreData::default(), None)
    }

    pub fn open(user_id: Uuid, file_path: PathBuf) -> Result<Self, FiszkiError> {
        let data: LocalStoreData = load_json(&file_path)?;
        info!(
            path = %file_path.display(),
            count = data.flashcards.len(),
            "Opened flashcard store"
        );
        Self::with_data(user_id, data, Some(file_path))
    }

    fn with_data(
        user_id: Uuid,
        data: LocalStoreData,
        file_path: Option<PathBuf>,
    ) -> Result<Self, FiszkiError> {
        Ok(Self {
            user_id,
            sanitizer: Sanitizer::new()?,
            data: Mutex::new(data),
            file_path,
            write_gate: tokio::sync::Mutex::new(()),
            action_log: None,
        })
    }

    /// Records ADD and DELETE entries; log failures never fail the store operation.
    pub fn with_action_log(mut self, action_log: Arc<dyn ActionLog>) -> Self {
        self.action_log = Some(action_log);
        self
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// The user's flashcards, newest first.
    pub fn list(&self) -> Vec<PersistedFlashcard> {
        let mut flashcards: Vec<PersistedFlashcard> = self
            .lock()
            .flashcards
            .iter()
            .filter(|f| f.user_id == Some(self.user_id))
            .cloned()
            .collect();
        flashcards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        flashcards
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let removed = {
            let mut data = self.lock();
            let position = data
                .flashcards
                .iter()
                .position(|f| f.id == id && f.user_id == Some(self.user_id))
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            data.flashcards.remove(position)
        };

        if let Err(e) = self.persist().await {
            self.lock().flashcards.push(removed);
            return Err(e);
        }

        self.record(Action::Delete { flashcard_id: id }).await;
        Ok(())
    }

    async fn insert(
        &self,
        command: &CreateFlashcardCommand,
    ) -> Result<PersistedFlashcard, StoreError> {
        let command = self.sanitizer.sanitize(command);
        validate(&command)?;

        let flashcard = {
            let mut data = self.lock();
            let duplicate = data.flashcards.iter().any(|f| {
                f.user_id == Some(self.user_id)
                    && f.source_word == command.source_word
                    && f.target_word == command.target_word
            });
            if duplicate {
                warn!(
                    source_word = %command.source_word,
                    target_word = %command.target_word,
                    "Duplicate flashcard rejected"
                );
                return Err(StoreError::Conflict { message: ALREADY_EXISTS_MESSAGE.to_string() });
            }

            let flashcard = PersistedFlashcard {
                id: Uuid::new_v4(),
                user_id: Some(self.user_id),
                source_word: command.source_word,
                target_word: command.target_word,
                example_sentence: command.example_sentence,
                created_at: Utc::now(),
            };
            data.flashcards.push(flashcard.clone());
            flashcard
        };

        if let Err(e) = self.persist().await {
            self.lock().flashcards.retain(|f| f.id != flashcard.id);
            return Err(e);
        }

        self.record(Action::Add { flashcard_id: flashcard.id }).await;
        Ok(flashcard)
    }

    /// Writes the current collection. The snapshot is taken under the write gate,
    /// so the last write always carries the newest state.
    async fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        let _gate = self.write_gate.lock().await;
        let snapshot = self.lock().clone();
        save_json_async(&snapshot, path).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to write flashcard store");
            StoreError::Persistence { status: Some(500), message: Some(e.to_string()) }
        })
    }

    async fn record(&self, action: Action) {
        if let Some(action_log) = &self.action_log {
            record_action(action_log.as_ref(), action).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, LocalStoreData> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl FlashcardStore for LocalFlashcardStore {
    async fn create_flashcard(
        &self,
        command: &CreateFlashcardCommand,
    ) -> Result<Option<PersistedFlashcard>, StoreError> {
        self.insert(command).await.map(Some)
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn validate(command: &CreateFlashcardCommand) -> Result<(), StoreError> {
    let checks = [
        ("Source word", &command.source_word, MAX_WORD_CHARS),
        ("Target word", &command.target_word, MAX_WORD_CHARS),
        ("Example sentence", &command.example_sentence, MAX_EXAMPLE_CHARS),
    ];

    for (label, value, max) in checks {
        let len = value.chars().count();
        let message = if len == 0 {
            format!("{label} is required")
        } else if len > max {
            format!("{label} must not exceed {max} characters")
        } else {
            continue;
        };
        return Err(StoreError::Persistence { status: Some(400), message: Some(message) });
    }
    Ok(())
}
