use async_trait::async_trait;
use reqwest::{
    Client,
    StatusCode,
};
use tracing::{
    debug,
    error,
    warn,
};

use super::{
    FlashcardStore,
    ALREADY_EXISTS_MESSAGE,
};
use crate::core::{
    http::{
        error_message_from_body,
        http_client,
    },
    CreateFlashcardCommand,
    FiszkiError,
    PersistedFlashcard,
    StoreError,
};

/// Storage collaborator reached over HTTP at `{base_url}/api/flashcards`.
pub struct HttpFlashcardStore {
    http: Client,
    endpoint: String,
}

impl HttpFlashcardStore {
    pub fn new(base_url: &str) -> Result<Self, FiszkiError> {
        let endpoint = format!("{}/api/flashcards", base_url.trim_end_matches('/'));
        Ok(Self { http: http_client()?, endpoint })
    }
}

#[async_trait]
impl FlashcardStore for HttpFlashcardStore {
    async fn create_flashcard(
        &self,
        command: &CreateFlashcardCommand,
    ) -> Result<Option<PersistedFlashcard>, StoreError> {
        let response = self.http.post(&self.endpoint).json(command).send().await?;
        let status = response.status();

        match status {
            // The status alone decides creation; the body is informational.
            StatusCode::CREATED => {
                let body = response.text().await.unwrap_or_default();
                match serde_json::from_str::<PersistedFlashcard>(&body) {
                    Ok(flashcard) => Ok(Some(flashcard)),
                    Err(e) => {
                        warn!(error = %e, "Flashcard created, returned record is unreadable");
                        Ok(None)
                    }
                }
            }
            StatusCode::CONFLICT => {
                let body = response.text().await?;
                debug!(target_word = %command.target_word, "Flashcard already exists");
                Err(StoreError::Conflict {
                    message: error_message_from_body(&body)
                        .unwrap_or_else(|| ALREADY_EXISTS_MESSAGE.to_string()),
                })
            }
            _ => {
                let body = response.text().await?;
                let message = error_message_from_body(&body);
                error!(status = status.as_u16(), ?message, "Error adding flashcard");
                Err(StoreError::Persistence { status: Some(status.as_u16()), message })
            }
        }
    }
}
