use std::{
    fmt,
    sync::{
        Arc,
        Mutex,
    },
};

use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    error,
    info,
};

use crate::{
    core::{
        ClientId,
        CreateFlashcardCommand,
        FlashcardSuggestion,
        IdentifiedSuggestion,
        ReviewError,
        StoreError,
    },
    store::{
        FlashcardStore,
        ALREADY_EXISTS_MESSAGE,
    },
};

pub const GENERIC_ADD_ERROR: &str = "Failed to add flashcard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Pending,
    Adding,
    Added,
    Rejected,
    Error,
    AlreadyExists,
}

impl SuggestionStatus {
    /// No action moves a record out of these states.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Added | Self::Rejected | Self::AlreadyExists)
    }

    /// `Error` is accepted again as a manual retry.
    pub fn can_accept(self) -> bool {
        matches!(self, Self::Pending | Self::Error)
    }

    pub fn can_reject(self) -> bool {
        matches!(self, Self::Pending | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Adding => "adding",
            Self::Added => "added",
            Self::Rejected => "rejected",
            Self::Error => "error",
            Self::AlreadyExists => "already_exists",
        }
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRecord {
    pub suggestion: IdentifiedSuggestion,
    pub status: SuggestionStatus,
    pub error_message: Option<String>,
}

impl SuggestionRecord {
    fn pending(suggestion: IdentifiedSuggestion) -> Self {
        Self { suggestion, status: SuggestionStatus::Pending, error_message: None }
    }

    pub fn client_id(&self) -> ClientId {
        self.suggestion.client_id
    }

    fn with_status(&self, status: SuggestionStatus, error_message: Option<String>) -> Self {
        Self { suggestion: self.suggestion.clone(), status, error_message }
    }
}

/// Tracks one batch of suggestions through accept/reject.
///
/// The batch is held as an immutable snapshot and every change swaps in a new
/// one, so concurrently resolving accepts only ever touch their own record.
pub struct ReviewTracker {
    store: Arc<dyn FlashcardStore>,
    records: Mutex<Arc<Vec<SuggestionRecord>>>,
}

impl ReviewTracker {
    pub fn new(store: Arc<dyn FlashcardStore>) -> Self {
        Self { store, records: Mutex::new(Arc::new(Vec::new())) }
    }

    /// Replaces the batch, assigning each suggestion a fresh client id.
    pub fn load(&self, suggestions: Vec<FlashcardSuggestion>) -> Vec<IdentifiedSuggestion> {
        let identified: Vec<IdentifiedSuggestion> =
            suggestions.into_iter().map(IdentifiedSuggestion::assign).collect();
        let records = identified.iter().cloned().map(SuggestionRecord::pending).collect();
        *self.lock() = Arc::new(records);
        identified
    }

    pub fn reset(&self) {
        *self.lock() = Arc::new(Vec::new());
    }

    pub fn records(&self) -> Arc<Vec<SuggestionRecord>> {
        self.lock().clone()
    }

    pub fn get(&self, client_id: ClientId) -> Option<SuggestionRecord> {
        self.records().iter().find(|r| r.client_id() == client_id).cloned()
    }

    pub fn status(&self, client_id: ClientId) -> Option<SuggestionStatus> {
        self.get(client_id).map(|r| r.status)
    }

    pub fn count(&self, status: SuggestionStatus) -> usize {
        self.records().iter().filter(|r| r.status == status).count()
    }

    /// Moves the record to `Adding`, makes exactly one create call and records the outcome.
    ///
    /// Refused without a network call unless the record is `Pending` or `Error`.
    pub async fn accept(&self, client_id: ClientId) -> Result<SuggestionStatus, ReviewError> {
        let command = self.begin_accept(client_id)?;

        let (status, error_message) = match self.store.create_flashcard(&command).await {
            Ok(created) => {
                let flashcard_id = created.map(|f| f.id);
                debug!(%client_id, ?flashcard_id, "Flashcard created");
                (SuggestionStatus::Added, None)
            }
            Err(StoreError::Conflict { .. }) => {
                (SuggestionStatus::AlreadyExists, Some(ALREADY_EXISTS_MESSAGE.to_string()))
            }
            Err(e) => {
                error!(%client_id, error = %e, "Error adding flashcard");
                (SuggestionStatus::Error, Some(accept_error_message(e)))
            }
        };

        let updated = self.update(client_id, |record| {
            (record.status == SuggestionStatus::Adding)
                .then(|| record.with_status(status, error_message.clone()))
        });
        if updated.is_none() {
            debug!(%client_id, %status, "Accept resolved for a suggestion no longer tracked");
        }

        info!(%client_id, %status, "Suggestion accept resolved");
        Ok(status)
    }

    /// Local only. Returns the record's status afterwards, `None` for unknown ids.
    pub fn reject(&self, client_id: ClientId) -> Option<SuggestionStatus> {
        self.update(client_id, |record| {
            record
                .status
                .can_reject()
                .then(|| record.with_status(SuggestionStatus::Rejected, None))
        });
        self.status(client_id)
    }

    fn begin_accept(&self, client_id: ClientId) -> Result<CreateFlashcardCommand, ReviewError> {
        let mut records = self.lock();
        let record = records
            .iter()
            .find(|r| r.client_id() == client_id)
            .ok_or_else(|| ReviewError::UnknownSuggestion(client_id.to_string()))?;

        if !record.status.can_accept() {
            return Err(ReviewError::InvalidTransition {
                from: record.status.to_string(),
                action: "accept",
            });
        }

        let command = record.suggestion.suggestion.to_command();
        *records = Arc::new(replace(&records, client_id, |r| {
            Some(r.with_status(SuggestionStatus::Adding, None))
        }));
        Ok(command)
    }

    fn update(
        &self,
        client_id: ClientId,
        change: impl Fn(&SuggestionRecord) -> Option<SuggestionRecord>,
    ) -> Option<SuggestionRecord> {
        let mut records = self.lock();
        let changed = records.iter().find(|r| r.client_id() == client_id).and_then(&change)?;
        *records = Arc::new(replace(&records, client_id, change));
        Some(changed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Arc<Vec<SuggestionRecord>>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn replace(
    records: &[SuggestionRecord],
    client_id: ClientId,
    change: impl Fn(&SuggestionRecord) -> Option<SuggestionRecord>,
) -> Vec<SuggestionRecord> {
    records
        .iter()
        .map(|r| {
            if r.client_id() == client_id {
                change(r).unwrap_or_else(|| r.clone())
            } else {
                r.clone()
            }
        })
        .collect()
}

fn accept_error_message(error: StoreError) -> String {
    match error {
        StoreError::Persistence { message: Some(message), .. } => message,
        StoreError::Persistence { status: Some(status), message: None } => {
            format!("{GENERIC_ADD_ERROR} ({status}).")
        }
        StoreError::Transport(message) => message,
        _ => format!("{GENERIC_ADD_ERROR}."),
    }
}
