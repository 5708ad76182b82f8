use std::fmt;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use uuid::Uuid;

/// A candidate vocabulary item produced by generation, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSuggestion {
    pub source_word: String,
    pub target_word: String,
    /// Target-language sentence followed by its translation in parentheses.
    pub example_sentence: String,
}

impl FlashcardSuggestion {
    pub fn new(source_word: &str, target_word: &str, example_sentence: &str) -> Self {
        Self {
            source_word: source_word.to_string(),
            target_word: target_word.to_string(),
            example_sentence: example_sentence.to_string(),
        }
    }

    pub fn to_command(&self) -> CreateFlashcardCommand {
        CreateFlashcardCommand {
            source_word: self.source_word.clone(),
            target_word: self.target_word.clone(),
            example_sentence: self.example_sentence.clone(),
        }
    }
}

/// Ephemeral identifier correlating UI actions with a suggestion. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifiedSuggestion {
    pub client_id: ClientId,
    #[serde(flatten)]
    pub suggestion: FlashcardSuggestion,
}

impl IdentifiedSuggestion {
    pub fn assign(suggestion: FlashcardSuggestion) -> Self {
        Self { client_id: ClientId::new(), suggestion }
    }
}

/// Fields sent to the storage collaborator when a suggestion is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlashcardCommand {
    pub source_word: String,
    pub target_word: String,
    pub example_sentence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedFlashcard {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub source_word: String,
    pub target_word: String,
    pub example_sentence: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub suggestions: Vec<IdentifiedSuggestion>,
}
