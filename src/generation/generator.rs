use std::sync::Arc;

use serde::Deserialize;
use tracing::{
    error,
    info,
    warn,
};

use super::{
    mock::MockSuggestionSource,
    prompt::{
        response_schema,
        system_prompt,
        user_prompt,
        MAX_SUGGESTIONS,
        MIN_SUGGESTIONS,
        RESPONSE_SCHEMA_NAME,
    },
};
use crate::{
    core::{
        FlashcardSuggestion,
        LlmError,
    },
    llm::{
        ChatCompletion,
        ChatCompletionRequest,
        Message,
        ModelParams,
        OpenRouterClient,
        ResponseFormat,
    },
};

pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";
pub const TEMPERATURE: f64 = 0.7;
pub const MAX_OUTPUT_TOKENS: u32 = 2000;

#[derive(Debug, Deserialize)]
struct FlashcardsResponse {
    flashcards: Vec<LlmFlashcard>,
}

#[derive(Debug, Deserialize)]
struct LlmFlashcard {
    word: String,
    translation: String,
    example: String,
    example_translation: String,
}

impl LlmFlashcard {
    fn is_complete(&self) -> bool {
        [&self.word, &self.translation, &self.example, &self.example_translation]
            .iter()
            .all(|field| !field.trim().is_empty())
    }

    fn into_suggestion(self) -> FlashcardSuggestion {
        FlashcardSuggestion {
            source_word: self.translation.trim().to_string(),
            target_word: self.word.trim().to_string(),
            example_sentence: format!(
                "{} ({})",
                self.example.trim(),
                self.example_translation.trim()
            ),
        }
    }
}

/// Why the live path did not produce suggestions. Always absorbed by
/// [`SuggestionGenerator::generate`].
#[derive(Debug)]
pub enum GenerationOutcome {
    NoCredentials,
    EmptyContent,
    Failed(LlmError),
}

impl From<LlmError> for GenerationOutcome {
    fn from(error: LlmError) -> Self {
        GenerationOutcome::Failed(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionSource {
    Llm,
    Mock,
}

pub struct SuggestionGenerator {
    client: Option<Arc<dyn ChatCompletion>>,
    mock: MockSuggestionSource,
    model: String,
}

impl SuggestionGenerator {
    /// Without a usable key every call is served from the mock pool.
    pub fn new(api_key: Option<&str>) -> Self {
        let client = api_key.filter(|key| !key.trim().is_empty()).and_then(|key| {
            match OpenRouterClient::new(key) {
                Ok(client) => Some(Arc::new(client) as Arc<dyn ChatCompletion>),
                Err(e) => {
                    error!(error = %e, "Failed to initialise chat completion client");
                    None
                }
            }
        });

        Self::with_parts(client, MockSuggestionSource::default())
    }

    pub fn with_parts(client: Option<Arc<dyn ChatCompletion>>, mock: MockSuggestionSource) -> Self {
        Self { client, mock, model: DEFAULT_MODEL.to_string() }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_credentials(&self) -> bool {
        self.client.is_some()
    }

    /// Never fails: any problem on the live path is logged and answered from the mock pool.
    pub async fn generate(&self, text: Option<&str>) -> Vec<FlashcardSuggestion> {
        self.generate_with_source(text).await.0
    }

    pub async fn generate_with_source(
        &self,
        text: Option<&str>,
    ) -> (Vec<FlashcardSuggestion>, SuggestionSource) {
        let Some(text) = text else {
            return (self.generate_mock(), SuggestionSource::Mock);
        };

        match self.generate_from_text(text).await {
            Ok(suggestions) => {
                info!(
                    text_length = text.chars().count(),
                    count = suggestions.len(),
                    "Generated suggestions from model"
                );
                (suggestions, SuggestionSource::Llm)
            }
            Err(GenerationOutcome::NoCredentials) => (self.generate_mock(), SuggestionSource::Mock),
            Err(outcome) => {
                warn!(
                    text_length = text.chars().count(),
                    outcome = ?outcome,
                    "Falling back to mock suggestions"
                );
                (self.generate_mock(), SuggestionSource::Mock)
            }
        }
    }

    pub fn generate_mock(&self) -> Vec<FlashcardSuggestion> {
        self.mock.generate()
    }

    pub async fn generate_from_text(
        &self,
        text: &str,
    ) -> Result<Vec<FlashcardSuggestion>, GenerationOutcome> {
        let client = self.client.as_ref().ok_or(GenerationOutcome::NoCredentials)?;

        let response = client.complete(&self.build_request(text)).await?;

        let content = response
            .first_content()
            .filter(|c| !c.trim().is_empty())
            .ok_or(GenerationOutcome::EmptyContent)?;

        Ok(parse_flashcards(content)?)
    }

    fn build_request(&self, text: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::system(system_prompt()), Message::user(user_prompt(text))],
            response_format: Some(ResponseFormat::json_schema(
                RESPONSE_SCHEMA_NAME,
                true,
                response_schema(),
            )),
            params: ModelParams {
                temperature: Some(TEMPERATURE),
                max_tokens: Some(MAX_OUTPUT_TOKENS),
                ..ModelParams::default()
            },
        }
    }
}

/// Parses and validates the model's structured output.
fn parse_flashcards(content: &str) -> Result<Vec<FlashcardSuggestion>, LlmError> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| LlmError::MalformedResponse(format!("Content is not JSON: {e}")))?;

    let response: FlashcardsResponse = serde_json::from_value(value)
        .map_err(|e| LlmError::SchemaValidationFailed(e.to_string()))?;

    if response.flashcards.len() < MIN_SUGGESTIONS {
        return Err(LlmError::SchemaValidationFailed(format!(
            "expected at least {MIN_SUGGESTIONS} flashcards, got {}",
            response.flashcards.len()
        )));
    }
    if let Some(index) = response.flashcards.iter().position(|f| !f.is_complete()) {
        return Err(LlmError::SchemaValidationFailed(format!(
            "flashcard {index} has an empty field"
        )));
    }

    Ok(response
        .flashcards
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(LlmFlashcard::into_suggestion)
        .collect())
}
