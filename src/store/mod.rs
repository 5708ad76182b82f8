use async_trait::async_trait;

use crate::core::{
    CreateFlashcardCommand,
    PersistedFlashcard,
    StoreError,
};

pub mod action_log;
pub mod http;
pub mod local;

pub use action_log::{
    Action,
    ActionLog,
    ActionLogEntry,
    ActionType,
    JsonActionLog,
};
pub use http::HttpFlashcardStore;
pub use local::LocalFlashcardStore;

pub const ALREADY_EXISTS_MESSAGE: &str = "This flashcard already exists in your collection";

/// Storage collaborator for accepted suggestions.
///
/// `Ok` means the flashcard was created. The stored record comes back when the
/// store can describe it, `None` when creation was confirmed without a readable record.
/// Duplicates (same user, source word and target word) surface as [`StoreError::Conflict`].
#[async_trait]
pub trait FlashcardStore: Send + Sync {
    async fn create_flashcard(
        &self,
        command: &CreateFlashcardCommand,
    ) -> Result<Option<PersistedFlashcard>, StoreError>;
}
