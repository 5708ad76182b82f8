use std::sync::Arc;

use tracing::info;

use super::tracker::{
    ReviewTracker,
    SuggestionStatus,
};
use crate::{
    core::{
        ClientId,
        FiszkiError,
        GenerateRequest,
        GenerateResponse,
    },
    generation::{
        SuggestionGenerator,
        SuggestionSource,
    },
    store::{
        action_log::record_action,
        Action,
        ActionLog,
        FlashcardStore,
    },
};

pub const MAX_TEXT_CHARS: usize = 10_000;

/// One review page: a generated batch and the decisions taken on it.
pub struct ReviewSession {
    generator: Arc<SuggestionGenerator>,
    tracker: ReviewTracker,
    action_log: Option<Arc<dyn ActionLog>>,
}

impl ReviewSession {
    pub fn new(generator: Arc<SuggestionGenerator>, store: Arc<dyn FlashcardStore>) -> Self {
        Self { generator, tracker: ReviewTracker::new(store), action_log: None }
    }

    /// Records a GENERATE entry per successful request.
    pub fn with_action_log(mut self, action_log: Arc<dyn ActionLog>) -> Self {
        self.action_log = Some(action_log);
        self
    }

    pub fn tracker(&self) -> &ReviewTracker {
        &self.tracker
    }

    /// Drops the previous batch before generating, so late accept results are not observed.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, FiszkiError> {
        let text_length = validate_text(&request.text)?;
        info!(text_length, "Generating suggestions");

        self.tracker.reset();
        let (suggestions, source) = self.generator.generate_with_source(Some(&request.text)).await;
        let suggestions = self.tracker.load(suggestions);

        info!(
            count = suggestions.len(),
            source = match source {
                SuggestionSource::Llm => "llm",
                SuggestionSource::Mock => "mock",
            },
            "Suggestions ready for review"
        );

        if let Some(action_log) = &self.action_log {
            let action =
                Action::Generate { input_text_length: text_length, cards_count: suggestions.len() };
            record_action(action_log.as_ref(), action).await;
        }

        Ok(GenerateResponse { suggestions })
    }

    pub async fn accept(&self, client_id: ClientId) -> Result<SuggestionStatus, FiszkiError> {
        Ok(self.tracker.accept(client_id).await?)
    }

    pub fn reject(&self, client_id: ClientId) -> Option<SuggestionStatus> {
        self.tracker.reject(client_id)
    }

    pub fn reset(&self) {
        self.tracker.reset();
    }
}

fn validate_text(text: &str) -> Result<usize, FiszkiError> {
    let length = text.chars().count();
    if length == 0 {
        return Err(FiszkiError::InvalidRequest("Text is required".to_string()));
    }
    if length > MAX_TEXT_CHARS {
        return Err(FiszkiError::InvalidRequest(format!(
            "Text must not exceed {MAX_TEXT_CHARS} characters"
        )));
    }
    Ok(length)
}
